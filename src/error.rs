use std::cell::Cell;

use crate::token::{Token, Type};

/// Collects the error state of a single run.
/// One reporter is shared by every stage of the pipeline so the driver can
/// check between stages whether evaluation should be suppressed.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter {
            had_error: Cell::new(false),
            had_runtime_error: Cell::new(false),
        }
    }

    /// Returns if a scan, parse or resolve error was reported.
    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    /// Returns if a runtime error was reported.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    /// Resets the error flags.
    /// This is used between prompt lines so an error does not poison the
    /// lines that follow it.
    pub fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }

    fn syntax_error(&self, line: usize, location: &str, message: &str) {
        eprintln!("\n[line {line}] Error{location}: {message}");
        self.had_error.set(true);
    }

    fn runtime_error(&self, line: usize, message: &str) {
        eprintln!("\n{message}\n [Line {line}]");
        self.had_runtime_error.set(true);
    }
}

/// Every error type must implement this trait.
pub trait Error {
    /// Prints the error message and sets the matching reporter flag.
    fn report(&self, reporter: &ErrorReporter);
}

/// Represents an error that occurs during scanning.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Error for ScanError {
    fn report(&self, reporter: &ErrorReporter) {
        reporter.syntax_error(self.line, "", &self.message);
    }
}

/// Represents an error that occurs during parsing.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Error for ParseError {
    fn report(&self, reporter: &ErrorReporter) {
        if self.token.r#type == Type::EOF {
            reporter.syntax_error(self.token.line, " at end", &self.message);
        } else {
            reporter.syntax_error(
                self.token.line,
                &format!(" at '{}'", self.token.lexeme),
                &self.message,
            );
        }
    }
}

/// Represents an error that occurs during resolution.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Error for ResolveError {
    fn report(&self, reporter: &ErrorReporter) {
        reporter.syntax_error(
            self.token.line,
            &format!(" at '{}'", self.token.lexeme),
            &self.message,
        );
    }
}

/// Represents an error that occurs during runtime.
/// Runtime errors are propagated up the evaluator with `?` and reported once
/// at the outermost entry point.
#[derive(Debug)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Error for RuntimeError {
    fn report(&self, reporter: &ErrorReporter) {
        reporter.runtime_error(self.token.line, &self.message);
    }
}
