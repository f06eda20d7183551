use std::mem;
use std::collections::HashMap;

use crate::error::{Error, ResolveError};
use crate::expr::{Expr, ExprId};
use crate::stmt::{ClassData, FunctionData, Stmt};
use crate::interpreter::Interpreter;
use crate::token::Token;

enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

enum ClassType {
    None,
    Class,
    Subclass
}

/// Statically resolves every variable reference to the scope that declares
/// it. The computed distances are written into the interpreter's side-table
/// keyed by expression id; the interpreter trusts them without re-checking.
pub struct Resolver<'i, 'a> {
    interpreter: &'i mut Interpreter<'a>,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'a> Resolver<'i, 'a> {
    pub fn new(interpreter: &'i mut Interpreter<'a>) -> Self {
        Resolver {
            interpreter,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement)
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Marks a name as declared but not yet usable in the innermost scope.
    /// Globals are not tracked and may redeclare freely.
    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        let scope = self.scopes.last_mut().expect("stack to be not empty");
        if scope.contains_key(&name.lexeme) {
            ResolveError {
                token: name.clone(),
                message: "Already a variable with this name in this scope.".to_string(),
            }.report(&self.interpreter.reporter);
        }
        scope.insert(name.lexeme.to_owned(), false);
    }

    /// Marks a declared name as usable.
    fn define(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        self.scopes
            .last_mut()
            .expect("stack to be not empty")
            .insert(name.lexeme.to_owned(), true);
    }

    /// Walks the scope stack from the innermost scope outwards and records
    /// the distance of the first hit. No hit means the name lives in
    /// globals and gets no side-table entry.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, i);
                return;
            }
        }
    }

    fn resolve_function(&mut self, function: &FunctionData, r#type: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, r#type);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.begin_scope();
                self.resolve(&block.statements);
                self.end_scope();
            },
            Stmt::Var(var) => {
                self.declare(&var.name);
                if let Some(initializer) = &var.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&var.name);
            },
            Stmt::Function(function) => {
                self.declare(&function.name);
                self.define(&function.name);

                self.resolve_function(function, FunctionType::Function);
            },
            Stmt::Expression(expression) => self.resolve_expr(&expression.expr),
            Stmt::Print(print) => self.resolve_expr(&print.expr),
            Stmt::If(if_stmt) => {
                self.resolve_expr(&if_stmt.condition);
                self.resolve_stmt(&if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.resolve_stmt(else_branch);
                }
            },
            Stmt::Return(return_stmt) => {
                if let FunctionType::None = self.current_function {
                    ResolveError {
                        token: return_stmt.keyword.clone(),
                        message: "Cannot return from top-level code.".to_string(),
                    }.report(&self.interpreter.reporter);
                }

                if let Some(value) = &return_stmt.value {
                    if let FunctionType::Initializer = self.current_function {
                        ResolveError {
                            token: return_stmt.keyword.clone(),
                            message: "Cannot return a value from an initializer.".to_string(),
                        }.report(&self.interpreter.reporter);
                        return;
                    }

                    self.resolve_expr(value);
                }
            },
            Stmt::While(while_stmt) => {
                self.resolve_expr(&while_stmt.condition);
                self.resolve_stmt(&while_stmt.body);
            },
            // Placement is validated by the parser, nothing to resolve.
            Stmt::Break(_) | Stmt::Continue(_) => (),
            Stmt::Class(class_stmt) => self.resolve_class(class_stmt),
        }
    }

    fn resolve_class(&mut self, class_stmt: &ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&class_stmt.name);
        self.define(&class_stmt.name);

        if let Some(superclass) = &class_stmt.superclass {
            if let Expr::Variable(variable) = superclass {
                if class_stmt.name.lexeme == variable.name.lexeme {
                    ResolveError {
                        token: variable.name.clone(),
                        message: "A class cannot inherit from itself.".to_string(),
                    }.report(&self.interpreter.reporter);
                }
            } else {
                unreachable!();
            }

            self.current_class = ClassType::Subclass;

            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("stack to be not empty")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("stack to be not empty")
            .insert("this".to_string(), true);

        for method in &class_stmt.methods {
            let Stmt::Function(function) = method else { unreachable!() };

            let decleration = if function.name.lexeme.eq("init") {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(function, decleration);
        }

        // Class methods bind `this` to the class value itself.
        for method in &class_stmt.class_methods {
            let Stmt::Function(function) = method else { unreachable!() };
            self.resolve_function(function, FunctionType::Method);
        }

        self.end_scope();

        if class_stmt.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(variable) => {
                if let Some(scope) = self.scopes.last() {
                    if let Some(defined) = scope.get(&variable.name.lexeme) {
                        if !defined {
                            ResolveError {
                                token: variable.name.to_owned(),
                                message: "Cannot read local variable in its own initializer.".to_string(),
                            }.report(&self.interpreter.reporter);
                        }
                    }
                }

                self.resolve_local(variable.id, &variable.name);
            },
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.value);
                self.resolve_local(assign.id, &assign.name);
            },
            Expr::Literal(_) => (),
            Expr::Logical(logical) => {
                self.resolve_expr(&logical.left);
                self.resolve_expr(&logical.right);
            },
            Expr::Binary(binary) => {
                self.resolve_expr(&binary.left);
                self.resolve_expr(&binary.right);
            },
            Expr::Ternary(ternary) => {
                self.resolve_expr(&ternary.condition);
                self.resolve_expr(&ternary.then_branch);
                self.resolve_expr(&ternary.else_branch);
            },
            Expr::Unary(unary) => self.resolve_expr(&unary.expr),
            Expr::Grouping(grouping) => self.resolve_expr(&grouping.expr),
            Expr::Call(call) => {
                self.resolve_expr(&call.callee);

                for argument in &call.arguments {
                    self.resolve_expr(argument);
                }
            },
            Expr::Get(get) => self.resolve_expr(&get.object),
            Expr::Set(set) => {
                self.resolve_expr(&set.value);
                self.resolve_expr(&set.object);
            },
            Expr::This(this) => {
                if let ClassType::None = self.current_class {
                    ResolveError {
                        token: this.keyword.clone(),
                        message: "Cannot use 'this' outside of a class.".to_string(),
                    }.report(&self.interpreter.reporter);

                    return;
                }

                self.resolve_local(this.id, &this.keyword);
            },
            Expr::Super(super_expr) => {
                match self.current_class {
                    ClassType::Subclass => (),
                    ClassType::None => ResolveError {
                        token: super_expr.keyword.clone(),
                        message: "Cannot use 'super' outside of a class.".to_string()
                    }.report(&self.interpreter.reporter),
                    ClassType::Class => ResolveError {
                        token: super_expr.keyword.clone(),
                        message: "Cannot use 'super' in a class with no superclass.".to_string(),
                    }.report(&self.interpreter.reporter),
                }

                self.resolve_local(super_expr.id, &super_expr.keyword);
            },
        }
    }
}
