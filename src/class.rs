use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::object::{Callable, Object};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Represents a class value in the language.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<RefCell<Class>>>,
    pub methods: HashMap<String, Function>,
    pub class_methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<RefCell<Class>>>,
        methods: HashMap<String, Function>,
        class_methods: HashMap<String, Function>,
    ) -> Self {
        Class { name, superclass, methods, class_methods }
    }

    /// Looks up a method on this class or anywhere up its superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass.as_ref()
            .and_then(|superclass| superclass.borrow().find_method(name))
    }

    /// Looks up a method that belongs to the class itself.
    pub fn find_class_method(&self, name: &str) -> Option<Function> {
        self.class_methods.get(name).cloned()
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Calling a class constructs an instance and runs its initializer.
/// The impl lives on the shared pointer because the new instance has to
/// reference the class it was built from.
impl Callable for Rc<RefCell<Class>> {
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let instance = Object::from(Instance::from(self));

        if let Some(initializer) = self.borrow().find_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }

    fn arity(&self) -> usize {
        match self.borrow().find_method("init") {
            Some(initializer) => initializer.arity(),
            None => 0,
        }
    }
}

/// Represents an instance of a class.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<RefCell<Class>>,
    pub fields: HashMap<String, Object>,
}

impl Instance {
    /// Reads a property off the instance.
    /// Fields shadow methods; a method comes back already bound to the
    /// instance it was accessed through.
    pub fn get(&self, name: &Token, instance: &Object) -> Result<Object, RuntimeError> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            Ok(field.clone())
        } else if let Some(method) = self.class.borrow().find_method(&name.lexeme) {
            Ok(Object::from(method.bind(instance.clone())))
        } else {
            Err(RuntimeError {
                token: name.clone(),
                message: format!("Undefined property '{}'.", name.lexeme),
            })
        }
    }

    /// Writes a field on the instance. Fields spring into existence on
    /// first assignment.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl From<&Rc<RefCell<Class>>> for Instance {
    fn from(value: &Rc<RefCell<Class>>) -> Self {
        Instance { class: Rc::clone(value), fields: HashMap::new() }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow().name)
    }
}
