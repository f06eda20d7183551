use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use crate::class::Class;
use crate::environment::Environment;
use crate::error::{Error, ErrorReporter, RuntimeError};
use crate::expr::{BinaryData, Expr, ExprId};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{ClassData, Stmt};
use crate::token::{Token, Type};

/// The result of executing a statement.
/// Return, break and continue are not errors; they travel up the execution
/// stack as values until the construct that owns them swallows them.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Object),
}

type EvalResult = Result<Object, RuntimeError>;
type ExecResult = Result<Flow, RuntimeError>;

/// Walks the resolved AST and executes it.
/// Print output goes to the injected sink so the driver decides where it
/// ends up (stdout for the binary, a buffer in tests).
pub struct Interpreter<'a> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: &'a mut dyn Write,
    pub(crate) reporter: Rc<ErrorReporter>,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn Write, reporter: Rc<ErrorReporter>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));

        for native in NativeFunction::get_globals() {
            let name = native.name.lexeme.clone();
            globals.borrow_mut().define(&name, Object::from(native));
        }

        Interpreter {
            globals: Rc::clone(&globals),
            environment: globals,
            locals: HashMap::new(),
            output,
            reporter,
        }
    }

    /// Executes the statements in order.
    /// A runtime error aborts the rest of the list; control flow reaching
    /// this level means the parser or the resolver let something through.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => (),
                Ok(_) => unreachable!("control flow escaped to the top level"),
                Err(error) => {
                    error.report(&self.reporter);
                    return;
                },
            }
        }
    }

    /// Records the scope distance of a variable-referencing expression.
    /// Called by the resolver; the side-table is keyed by expression id.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Executes the statements against the given frame, restoring the
    /// previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = mem::replace(&mut self.environment, environment);

        let mut result = Ok(Flow::Normal);
        for statement in statements {
            result = self.execute(statement);
            match &result {
                Ok(Flow::Normal) => (),
                _ => break,
            }
        }

        self.environment = previous;
        result
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(data) => {
                self.evaluate(&data.expr)?;
                Ok(Flow::Normal)
            },
            Stmt::Print(data) => {
                let value = self.evaluate(&data.expr)?;
                writeln!(self.output, "{value}").expect("output sink to be writable");
                Ok(Flow::Normal)
            },
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Object::from(Literal::Nil),
                };

                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(Flow::Normal)
            },
            Stmt::Block(data) => {
                let environment = Environment::new(Some(Rc::clone(&self.environment)));
                self.execute_block(&data.statements, Rc::new(RefCell::new(environment)))
            },
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            },
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    match self.execute(&data.body)? {
                        Flow::Normal | Flow::Continue => (),
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            },
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Function(data) => {
                let function = Function::new(data, Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));
                Ok(Flow::Normal)
            },
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(value) => self.evaluate(value)?,
                    None => Object::from(Literal::Nil),
                };

                Ok(Flow::Return(value))
            },
            Stmt::Class(data) => self.execute_class(data),
        }
    }

    fn execute_class(&mut self, data: &ClassData) -> ExecResult {
        let superclass = match &data.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Object::Class(class) => Some(class),
                _ => {
                    let Expr::Variable(variable) = expr else { unreachable!() };
                    return Err(RuntimeError {
                        token: variable.name.clone(),
                        message: "Superclass must be a class.".to_string(),
                    });
                },
            },
            None => None,
        };

        // Define the name first so methods can refer to the class itself.
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(Literal::Nil));

        // Methods of a subclass close over a frame that binds `super`.
        if let Some(superclass) = &superclass {
            let mut environment = Environment::new(Some(Rc::clone(&self.environment)));
            environment.define("super", Object::from(Rc::clone(superclass)));
            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut methods = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(function) = method else { unreachable!() };

            let is_initializer = function.name.lexeme.eq("init");
            methods.insert(
                function.name.lexeme.clone(),
                Function::new(function, Rc::clone(&self.environment), is_initializer),
            );
        }

        let mut class_methods = HashMap::new();
        for method in &data.class_methods {
            let Stmt::Function(function) = method else { unreachable!() };

            class_methods.insert(
                function.name.lexeme.clone(),
                Function::new(function, Rc::clone(&self.environment), false),
            );
        }

        if superclass.is_some() {
            let enclosing = self.environment.borrow().enclosing.clone()
                .expect("super frame to have an enclosing frame");
            self.environment = enclosing;
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods, class_methods);
        self.environment.borrow_mut().assign(&data.name, Object::from(Rc::new(RefCell::new(class))))?;

        Ok(Flow::Normal)
    }

    /// Reads a variable through the side-table when the resolver computed a
    /// distance for it, or out of globals when it did not.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> EvalResult {
        match self.locals.get(&id) {
            Some(distance) => self.environment.borrow().get_at(*distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(literal) => Ok(Object::from(literal.clone())),
            Expr::Grouping(data) => self.evaluate(&data.expr),
            Expr::Unary(data) => {
                let right = self.evaluate(&data.expr)?;

                match data.operator.r#type {
                    Type::Bang => Ok(Object::from(!right.is_truthy())),
                    Type::Minus => match right {
                        Object::Literal(Literal::Number(number)) => Ok(Object::from(-number)),
                        _ => Err(RuntimeError {
                            token: data.operator.clone(),
                            message: "Operand must be a number.".to_string(),
                        }),
                    },
                    _ => unreachable!(),
                }
            },
            Expr::Binary(data) => self.evaluate_binary(data),
            Expr::Logical(data) => {
                let left = self.evaluate(&data.left)?;

                if data.operator.r#type == Type::Or {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }

                self.evaluate(&data.right)
            },
            Expr::Ternary(data) => {
                // Only the selected branch runs, and its value comes back
                // untouched whatever its type.
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.evaluate(&data.then_branch)
                } else {
                    self.evaluate(&data.else_branch)
                }
            },
            Expr::Variable(data) => self.look_up_variable(&data.name, data.id),
            Expr::This(data) => self.look_up_variable(&data.keyword, data.id),
            Expr::Assign(data) => {
                let value = self.evaluate(&data.value)?;

                match self.locals.get(&data.id) {
                    Some(distance) => {
                        self.environment.borrow_mut().assign_at(*distance, &data.name, value.clone());
                    },
                    None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
                }

                Ok(value)
            },
            Expr::Call(data) => {
                let callee = self.evaluate(&data.callee)?;

                let mut arguments = Vec::new();
                for argument in &data.arguments {
                    arguments.push(self.evaluate(argument)?);
                }

                let callable: &dyn Callable = match &callee {
                    Object::Function(function) => function,
                    Object::NativeFunction(function) => function,
                    Object::Class(class) => class,
                    _ => return Err(RuntimeError {
                        token: data.paren.clone(),
                        message: "Can only call functions and classes.".to_string(),
                    }),
                };

                if arguments.len() != callable.arity() {
                    return Err(RuntimeError {
                        token: data.paren.clone(),
                        message: format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            arguments.len(),
                        ),
                    });
                }

                callable.call(self, arguments)
            },
            Expr::Get(data) => {
                let object = self.evaluate(&data.object)?;

                match &object {
                    Object::Instance(instance) => instance.borrow().get(&data.name, &object),
                    // Property access on a class itself reaches its class
                    // methods, bound with the class as `this`.
                    Object::Class(class) => {
                        let method = class.borrow().find_class_method(&data.name.lexeme);
                        match method {
                            Some(method) => Ok(Object::from(method.bind(object.clone()))),
                            None => Err(RuntimeError {
                                token: data.name.clone(),
                                message: format!("Undefined property '{}'.", data.name.lexeme),
                            }),
                        }
                    },
                    _ => Err(RuntimeError {
                        token: data.name.clone(),
                        message: "Only instances have properties.".to_string(),
                    }),
                }
            },
            Expr::Set(data) => {
                let object = self.evaluate(&data.object)?;

                let Object::Instance(instance) = object else {
                    return Err(RuntimeError {
                        token: data.name.clone(),
                        message: "Only instances have fields.".to_string(),
                    });
                };

                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());

                Ok(value)
            },
            Expr::Super(data) => {
                let distance = *self.locals.get(&data.id)
                    .expect("'super' to have been resolved");

                let superclass = self.environment.borrow().get_at(distance, &Token::from("super"))?;
                let Object::Class(superclass) = superclass else { unreachable!() };

                // The instance is always bound one frame below `super`.
                let object = self.environment.borrow().get_at(distance - 1, &Token::from("this"))?;

                let method = superclass.borrow().find_method(&data.method.lexeme);
                match method {
                    Some(method) => Ok(Object::from(method.bind(object))),
                    None => Err(RuntimeError {
                        token: data.method.clone(),
                        message: format!("Undefined property '{}'.", data.method.lexeme),
                    }),
                }
            },
        }
    }

    fn evaluate_binary(&mut self, data: &BinaryData) -> EvalResult {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;

        match data.operator.r#type {
            // The comma operator evaluates both sides and keeps the right.
            Type::Comma => Ok(right),

            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),

            Type::Greater => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l > r))
            },
            Type::GreaterEqual => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l >= r))
            },
            Type::Less => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l < r))
            },
            Type::LessEqual => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l <= r))
            },

            Type::Minus => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l - r))
            },
            Type::Star => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;
                Ok(Object::from(l * r))
            },
            Type::Slash => {
                let (l, r) = check_number_operands(&data.operator, &left, &right)?;

                if r == 0.0 {
                    return Err(RuntimeError {
                        token: data.operator.clone(),
                        message: "Division by zero.".to_string(),
                    });
                }

                Ok(Object::from(l / r))
            },

            Type::Plus => match (&left, &right) {
                (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => {
                    Ok(Object::from(l + r))
                },
                // One string operand turns + into concatenation and
                // stringifies the other side.
                (l, r) if is_string(l) || is_string(r) => Ok(Object::from(format!("{l}{r}"))),
                _ => Err(RuntimeError {
                    token: data.operator.clone(),
                    message: "Operands must be two numbers or two strings.".to_string(),
                }),
            },

            _ => unreachable!(),
        }
    }
}

fn is_string(object: &Object) -> bool {
    matches!(object, Object::Literal(Literal::String(_)))
}

/// Extracts both operands as numbers or fails with the operator's token.
fn check_number_operands(operator: &Token, left: &Object, right: &Object) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => Ok((*l, *r)),
        _ => Err(RuntimeError {
            token: operator.clone(),
            message: "Operands must be numbers.".to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::{TernaryData, UnaryData};

    macro_rules! with_interpreter {
        ($interpreter:ident => $body:block) => {
            let mut output: Vec<u8> = Vec::new();
            let reporter = Rc::new(ErrorReporter::new());
            let mut $interpreter = Interpreter::new(&mut output, reporter);
            $body
        };
    }

    fn number(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(Literal::String(s.to_string()))
    }

    fn binary(left: Expr, operator: Type, lexeme: &str, right: Expr) -> Expr {
        Expr::Binary(BinaryData {
            left: Box::new(left),
            operator: Token::new(operator, lexeme.to_string(), None, 1),
            right: Box::new(right),
        })
    }

    #[test]
    fn evaluate_literal() {
        with_interpreter!(interpreter => {
            let expr = number(12.0);
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(12.0));
        });
    }

    #[test]
    fn evaluate_unary_minus() {
        with_interpreter!(interpreter => {
            let expr = Expr::Unary(UnaryData {
                operator: Token::new(Type::Minus, String::from("-"), None, 1),
                expr: Box::new(number(12.0)),
            });
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(-12.0));
        });
    }

    #[test]
    fn evaluate_unary_minus_requires_number() {
        with_interpreter!(interpreter => {
            let expr = Expr::Unary(UnaryData {
                operator: Token::new(Type::Minus, String::from("-"), None, 1),
                expr: Box::new(string("nan")),
            });

            let error = interpreter.evaluate(&expr).unwrap_err();
            assert_eq!(error.message, "Operand must be a number.");
        });
    }

    #[test]
    fn evaluate_bang_negates_truthiness() {
        with_interpreter!(interpreter => {
            let expr = Expr::Unary(UnaryData {
                operator: Token::new(Type::Bang, String::from("!"), None, 1),
                expr: Box::new(number(0.0)),
            });

            // Zero is truthy, so its negation is false.
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(false));
        });
    }

    #[test]
    fn evaluate_arithmetic() {
        with_interpreter!(interpreter => {
            let expr = binary(
                number(6.0),
                Type::Minus, "-",
                binary(number(12.0), Type::Minus, "-", number(24.0)),
            );
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(18.0));
        });
    }

    #[test]
    fn evaluate_string_concatenation() {
        with_interpreter!(interpreter => {
            let expr = binary(string("Hello"), Type::Plus, "+", string("World"));
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from("HelloWorld"));
        });
    }

    #[test]
    fn evaluate_string_and_number_concatenation() {
        with_interpreter!(interpreter => {
            let expr = binary(string("n="), Type::Plus, "+", number(4.0));
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from("n=4"));
        });
    }

    #[test]
    fn evaluate_add_mismatched_types() {
        with_interpreter!(interpreter => {
            let expr = binary(Expr::Literal(Literal::Bool(true)), Type::Plus, "+", number(1.0));

            let error = interpreter.evaluate(&expr).unwrap_err();
            assert_eq!(error.message, "Operands must be two numbers or two strings.");
        });
    }

    #[test]
    fn evaluate_subtract_requires_numbers() {
        with_interpreter!(interpreter => {
            let expr = binary(string("a"), Type::Minus, "-", number(1.0));

            let error = interpreter.evaluate(&expr).unwrap_err();
            assert_eq!(error.message, "Operands must be numbers.");
        });
    }

    #[test]
    fn evaluate_division_by_zero() {
        with_interpreter!(interpreter => {
            let expr = binary(number(1.0), Type::Slash, "/", number(0.0));

            let error = interpreter.evaluate(&expr).unwrap_err();
            assert_eq!(error.message, "Division by zero.");
        });
    }

    #[test]
    fn evaluate_comparison() {
        with_interpreter!(interpreter => {
            let expr = binary(number(12.0), Type::GreaterEqual, ">=", number(12.0));
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(true));
        });
    }

    #[test]
    fn evaluate_equality_across_types() {
        with_interpreter!(interpreter => {
            let expr = binary(number(12.0), Type::EqualEqual, "==", string("12"));
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(false));

            let expr = binary(
                Expr::Literal(Literal::Nil),
                Type::EqualEqual, "==",
                Expr::Literal(Literal::Nil),
            );
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(true));
        });
    }

    #[test]
    fn evaluate_comma_keeps_the_right_operand() {
        with_interpreter!(interpreter => {
            let expr = binary(number(1.0), Type::Comma, ",", number(2.0));
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(2.0));
        });
    }

    #[test]
    fn evaluate_ternary_returns_branch_value() {
        with_interpreter!(interpreter => {
            // A nil condition picks the else branch, and a boolean result
            // comes back as-is.
            let expr = Expr::Ternary(TernaryData {
                condition: Box::new(Expr::Literal(Literal::Nil)),
                then_branch: Box::new(number(1.0)),
                else_branch: Box::new(Expr::Literal(Literal::Bool(false))),
            });
            assert_eq!(interpreter.evaluate(&expr).unwrap(), Object::from(false));
        });
    }

    #[test]
    fn execute_while_catches_break() {
        use crate::stmt::{BlockData, BreakData, WhileData};

        with_interpreter!(interpreter => {
            let body = Stmt::Block(BlockData {
                statements: vec![Stmt::Break(BreakData { keyword: Token::from("break") })],
            });
            let stmt = Stmt::While(WhileData {
                condition: Expr::Literal(Literal::Bool(true)),
                body: Box::new(body),
            });

            assert!(matches!(interpreter.execute(&stmt), Ok(Flow::Normal)));
        });
    }

    #[test]
    fn calling_a_number_fails() {
        use crate::expr::CallData;

        with_interpreter!(interpreter => {
            let expr = Expr::Call(CallData {
                callee: Box::new(number(1.0)),
                paren: Token::new(Type::RightParen, ")".to_string(), None, 1),
                arguments: vec![],
            });

            let error = interpreter.evaluate(&expr).unwrap_err();
            assert_eq!(error.message, "Can only call functions and classes.");
        });
    }

    #[test]
    fn clock_is_defined_on_globals() {
        with_interpreter!(interpreter => {
            let clock = interpreter.globals.borrow().get(&Token::from("clock")).unwrap();
            assert!(matches!(clock, Object::NativeFunction(_)));
        });
    }
}
