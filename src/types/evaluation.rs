use std::fmt;

use super::token::BinaryOp;

/// Recoverable conditions recorded while a postfix program runs.
///
/// Only [`ErrorCode::StackUnderflow`] stops evaluation early; every other
/// code is paired with a substitute value and execution continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DivisionByZero,
    UnknownVariable,
    UnknownFunction,
    StackUnderflow,
    InvalidResult,
}

impl ErrorCode {
    /// Stable snake-case code, as reported to callers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DivisionByZero => "division_by_zero",
            ErrorCode::UnknownVariable => "unknown_variable",
            ErrorCode::UnknownFunction => "unknown_function",
            ErrorCode::StackUnderflow => "stack_underflow",
            ErrorCode::InvalidResult => "invalid_result",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a recoverable error happened. Passed to the `on_error` observer.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorContext {
    Variable { identifier: String },
    Operator { op: BinaryOp },
    Division { dividend: f64 },
    Function { name: String },
    Result,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Variable { identifier } => write!(f, "variable '{identifier}'"),
            ErrorContext::Operator { op } => write!(f, "operator '{op}'"),
            ErrorContext::Division { dividend } => write!(f, "{dividend} / 0"),
            ErrorContext::Function { name } => write!(f, "function '{name}'"),
            ErrorContext::Result => write!(f, "final result"),
        }
    }
}

/// Outcome of running a postfix program: a number plus every recoverable
/// error encountered, in the order they occurred.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Evaluation {
    value: f64,
    errors: Vec<ErrorCode>,
}

impl Evaluation {
    pub(crate) fn new(value: f64, errors: Vec<ErrorCode>) -> Self {
        Self { value, errors }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorCode] {
        &self.errors
    }

    /// True when no recoverable error was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.contains(&code)
    }

    /// Error codes as their snake-case strings.
    #[must_use]
    pub fn error_strings(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.as_str()).collect()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value: {}", self.value)?;
        if !self.errors.is_empty() {
            write!(f, ", errors: [{}]", self.error_strings().join(", "))?;
        }
        Ok(())
    }
}
