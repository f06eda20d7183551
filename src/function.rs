use std::fmt::Debug;
use std::cell::RefCell;
use std::fmt::Display;
use std::io;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::interpreter::{Flow, Interpreter};
use crate::object::{Object, Callable};
use crate::error::RuntimeError;
use crate::stmt::{FunctionData, Stmt};
use crate::token::Token;
use crate::literal::Literal;

/// Represents a function value in the language.
/// The declaration parts are shared behind Rc so a function value stays
/// cheap to clone; two values are equal only when they came from the same
/// evaluation of the same declaration.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    pub params: Rc<Vec<Token>>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    /// Creates a function value out of its declaration, capturing the frame
    /// that is active right now as the closure.
    pub fn new(declaration: &FunctionData, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function {
            name: declaration.name.clone(),
            params: Rc::new(declaration.params.clone()),
            body: Rc::new(declaration.body.clone()),
            closure,
            is_initializer,
        }
    }

    /// Returns a copy of this function whose closure binds `this` to the
    /// given object. This is how methods see the instance they were
    /// accessed through.
    pub fn bind(&self, instance: Object) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", instance);

        Function {
            closure: Rc::new(RefCell::new(environment)),
            ..self.clone()
        }
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, argument) in self.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.body, Rc::new(RefCell::new(environment)))?;

        // An initializer always hands back the instance it was bound to,
        // even through a bare `return;`.
        if self.is_initializer {
            return self.closure.borrow().get_at(0, &Token::from("this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Object::from(Literal::Nil)),
            Flow::Break | Flow::Continue => unreachable!("loop control flow escaped a function body"),
        }
    }

    fn arity(&self) -> usize {
        self.params.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

/// Represents a function implemented by the host instead of the language.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Token,
    pub arity: usize,
    pub function: fn(&mut Interpreter<'_>, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl NativeFunction {
    /// Returns the native functions defined on the global frame at startup.
    pub fn get_globals() -> Vec<NativeFunction> {
        vec![
            NativeFunction {
                name: Token::from("clock"),
                arity: 0,
                function: |_, _| {
                    let now = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .expect("system clock to be past the epoch")
                        .as_millis();
                    Ok(Object::from(now as f64 / 1000.0))
                },
            },
            NativeFunction {
                name: Token::from("input"),
                arity: 0,
                function: |_, _| {
                    let mut input = String::new();
                    io::stdin().read_line(&mut input).map_err(|error| RuntimeError {
                        token: Token::from("input"),
                        message: error.to_string(),
                    })?;
                    input.pop();  // Remove newline
                    Ok(Object::from(input))
                },
            },
        ]
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name.lexeme)
    }
}
