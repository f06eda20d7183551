use crate::expr::Expr;
use crate::stmt::Stmt;

/// Returns a string representation of the expression in parenthesize.
macro_rules! parenthesize {
    ( $self:ident, $name:expr, $( $x:expr ),+ ) => {
        {
            let mut string = String::new();
            string += "(";
            string += $name;
            $(
                string += " ";
                string += &$self.print_expr($x);
            )*
            string += ")";

            string
        }
    };
}

/// Prints the AST in a compact prefix form.
/// This is a debugging aid; the output is not meant to parse back.
pub struct AstPrinter;

impl AstPrinter {
    /// Prints a whole program, one statement after the other.
    pub fn print(&self, statements: &[Stmt]) -> String {
        statements.iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<String>>()
            .join(" ")
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => literal.to_string(),
            Expr::Logical(data) => parenthesize!(self, &data.operator.lexeme, &data.left, &data.right),
            Expr::Binary(data) => parenthesize!(self, &data.operator.lexeme, &data.left, &data.right),
            Expr::Unary(data) => parenthesize!(self, &data.operator.lexeme, &data.expr),
            Expr::Grouping(data) => parenthesize!(self, "group", &data.expr),
            Expr::Ternary(data) => {
                parenthesize!(self, "?:", &data.condition, &data.then_branch, &data.else_branch)
            },
            Expr::Variable(data) => data.name.lexeme.clone(),
            Expr::Assign(data) => {
                parenthesize!(self, format!("= {}", &data.name.lexeme).as_str(), &data.value)
            },
            Expr::Get(data) => {
                parenthesize!(self, format!(". {}", &data.name.lexeme).as_str(), &data.object)
            },
            Expr::Set(data) => {
                parenthesize!(self, format!(".= {}", &data.name.lexeme).as_str(), &data.object, &data.value)
            },
            Expr::This(_) => "this".to_string(),
            Expr::Super(data) => format!("(super {})", data.method.lexeme),
            Expr::Call(data) => {
                let mut string = String::new();
                string += &self.print_expr(&data.callee);
                string += "(";
                for argument in &data.arguments {
                    string += &self.print_expr(argument);
                    string += " ";
                }
                string = string.trim_end().to_string();
                string += ")";
                string
            },
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(data) => parenthesize!(self, "expr", &data.expr),
            Stmt::Print(data) => parenthesize!(self, "print", &data.expr),
            Stmt::Var(data) => {
                let mut string = String::new();
                string += "(var ";
                string += &data.name.lexeme;
                if let Some(initializer) = &data.initializer {
                    string += " = ";
                    string += &self.print_expr(initializer);
                }
                string += ")";

                string
            },
            Stmt::Block(data) => {
                let mut string = String::new();
                string += "{";
                for stmt in &data.statements {
                    string += " ";
                    string += &self.print_stmt(stmt);
                }
                string += " }";

                string
            },
            Stmt::If(data) => {
                let mut string = String::new();
                string += "(if ";
                string += &self.print_expr(&data.condition);
                string += " ";
                string += &self.print_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    string += " else ";
                    string += &self.print_stmt(else_branch);
                }
                string += ")";

                string
            },
            Stmt::While(data) => {
                format!(
                    "(while {} {})",
                    self.print_expr(&data.condition),
                    self.print_stmt(&data.body),
                )
            },
            Stmt::Break(_) => "(break)".to_string(),
            Stmt::Continue(_) => "(continue)".to_string(),
            Stmt::Return(data) => match &data.value {
                Some(value) => parenthesize!(self, "return", value),
                None => "(return)".to_string(),
            },
            Stmt::Function(data) => self.print_function("fun ", data),
            Stmt::Class(data) => {
                let mut string = String::new();
                string += "(class ";
                string += &data.name.lexeme;
                if let Some(superclass) = &data.superclass {
                    string += " < ";
                    string += &self.print_expr(superclass);
                }
                string += " {";
                for method in &data.class_methods {
                    let Stmt::Function(method) = method else { unreachable!() };
                    string += " ";
                    string += &self.print_function("class ", method);
                }
                for method in &data.methods {
                    let Stmt::Function(method) = method else { unreachable!() };
                    string += " ";
                    string += &self.print_function("", method);
                }
                string += " })";

                string
            },
        }
    }

    fn print_function(&self, prefix: &str, data: &crate::stmt::FunctionData) -> String {
        let mut string = String::new();
        string += "(";
        string += prefix;
        string += &data.name.lexeme;
        string += "(";
        for param in &data.params {
            string += &param.lexeme;
            string += " ";
        }
        string = string.trim_end().to_string();
        string += ") { ";
        string += &data.body.iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<String>>()
            .join(" ");
        string += " })";

        string
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;
    use crate::error::ErrorReporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let reporter = Rc::new(ErrorReporter::new());
        let tokens = Scanner::new(source, Rc::clone(&reporter)).scan_tokens();
        let statements = Parser::new(tokens, Rc::clone(&reporter)).parse();

        assert!(!reporter.had_error(), "test source should parse cleanly");
        statements
    }

    #[test]
    fn print_respects_precedence() {
        let statements = parse("print 1 + 2 * 3;");

        assert_eq!(AstPrinter.print(&statements), "(print (+ 1 (* 2 3)))");
    }

    #[test]
    fn print_unary_binds_tighter_than_factor() {
        let statements = parse("print -1 * 2;");

        assert_eq!(AstPrinter.print(&statements), "(print (* (- 1) 2))");
    }

    #[test]
    fn print_ternary_nests_to_the_right() {
        let statements = parse("1 ? 2 : 3 ? 4 : 5;");

        assert_eq!(AstPrinter.print(&statements), "(expr (?: 1 2 (?: 3 4 5)))");
    }

    #[test]
    fn print_comma_is_left_associative() {
        let statements = parse("1, 2, 3;");

        assert_eq!(AstPrinter.print(&statements), "(expr (, (, 1 2) 3))");
    }

    #[test]
    fn print_for_shows_the_desugared_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(
            AstPrinter.print(&statements),
            "{ (var i = 0) (while (< i 3) { (print i) (expr (= i (+ i 1))) }) }",
        );
    }

    #[test]
    fn print_is_deterministic_across_parses() {
        let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);";

        let first = AstPrinter.print(&parse(source));
        let second = AstPrinter.print(&parse(source));

        assert_eq!(first, second);
    }
}
