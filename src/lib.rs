#![allow(clippy::needless_return)]

//! Rlox is a programming language written in Rust. It is a dynamically typed
//! language with lexical scoping, first-class functions and single
//! inheritance classes. Rlox is a tree-walk interpreter with a hand-written
//! recursive descent parser.
//!
//! ## Scanning
//! The first step in the interpreter is scanning. Scanning is the process of
//! converting a string of characters into a list of tokens. A token is a
//! single unit of the language. For example, the string `1 + 2` would be
//! converted into the following tokens:
//! ```text
//! [Number(1), Plus, Number(2)]
//! ```
//! The scanner is implemented in the [`scanner`](scanner) module as an
//! iterator over the characters in the source code. Syntax errors like an
//! unterminated string or an unexpected character are reported as a
//! [`ScanError`](error::ScanError) as soon as they are encountered, and the
//! scanner keeps going so the user can fix multiple errors at once.
//!
//! ## Parsing
//! The second step in the interpreter is parsing. The parser is implemented
//! in the [`parser`](parser) module as a recursive descent parser over the
//! token list. It produces [`expressions`](expr::Expr), pieces of code that
//! evaluate to an [`Object`](object::Object), and [`statements`](stmt::Stmt),
//! pieces of code that perform an action instead of producing a value.
//!
//! For example, the string `print 1 + 2;` would be converted into the
//! following AST:
//! ```text
//! Print {
//!     Binary {
//!         left: Number(1),
//!         operator: Plus,
//!         right: Number(2),
//!     }
//! }
//! ```
//! The parser reports syntax errors that span multiple tokens as a
//! [`ParseError`](error::ParseError) and then resynchronizes at the next
//! statement boundary, so a single mistake does not drown the rest of the
//! file in noise.
//!
//! ## Resolving
//! The third step in the interpreter is resolving. The resolver, implemented
//! in the [`resolver`](resolver) module, statically walks the AST and
//! records for every variable reference how many scopes away its
//! declaration lives. Semantically invalid but syntactically fine programs
//! are caught here and reported as a [`ResolveError`](error::ResolveError).
//! For example, the following code is valid syntax but defines `a` twice in
//! the same scope:
//! ```text
//! {
//!    var a = 1;
//!    var a = 2;
//! }
//! ```
//!
//! ## Interpreting
//! The final step is interpreting. The interpreter, implemented in the
//! [`interpreter`](interpreter) module, walks the resolved AST and executes
//! it. Errors that can only be caught at runtime, like adding a string to a
//! boolean, are reported as a [`RuntimeError`](error::RuntimeError) and
//! abort the current run. The interpreter also manages the
//! [`environment`](environment) chain: one scope frame per block, linked to
//! its parent, which is what gives closures their memory.

use std::{fs, process};
use std::io::Write;
use std::rc::Rc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

pub mod error;
pub mod token;
pub mod scanner;
pub mod expr;
pub mod stmt;
pub mod environment;
pub mod parser;
pub mod ast;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod function;
pub mod resolver;
pub mod class;

use error::ErrorReporter;
use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use resolver::Resolver;

#[allow(non_camel_case_types)]
pub struct rlox<'a> {
    interpreter: Interpreter<'a>,
    reporter: Rc<ErrorReporter>,
}

impl<'a> rlox<'a> {
    /// Creates a new interpreter that writes print output to the given sink.
    pub fn new(output: &'a mut dyn Write) -> Self {
        let reporter = Rc::new(ErrorReporter::new());

        rlox {
            interpreter: Interpreter::new(output, Rc::clone(&reporter)),
            reporter,
        }
    }

    /// Runs a script from a file and exits the process on failure:
    /// 65 for errors caught before execution, 70 for runtime errors.
    pub fn run_file(&mut self, path: String) {
        let contents = fs::read_to_string(path)
            .expect("Should have been able to read the file");

        self.run(&contents);

        if self.reporter.had_error() {
            process::exit(65);
        }
        if self.reporter.had_runtime_error() {
            process::exit(70);
        }
    }

    /// Runs the interactive prompt until end of input.
    /// Error flags reset after every line, so a bad line does not poison
    /// the ones that follow it.
    pub fn run_prompt(&mut self) {
        let mut editor = DefaultEditor::new().expect("to initialize the line editor");

        let history = home::home_dir().map(|dir| dir.join(".rlox_history"));
        if let Some(path) = &history {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("lox> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());

                    self.run(&line);
                    self.reporter.reset();
                },
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(error) => {
                    eprintln!("{error}");
                    break;
                },
            }
        }

        if let Some(path) = &history {
            let _ = editor.save_history(path);
        }
    }

    /// Runs the pipeline over one source string.
    /// Each stage only runs when the previous stages reported no error.
    fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source, Rc::clone(&self.reporter));
        let tokens = scanner.scan_tokens();

        if self.reporter.had_error() {
            return;
        }

        let mut parser = Parser::new(tokens, Rc::clone(&self.reporter));
        let statements = parser.parse();

        if self.reporter.had_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);

        if self.reporter.had_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}
