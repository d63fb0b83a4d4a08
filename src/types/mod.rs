mod engine;
mod error;
mod evaluation;
mod options;
pub mod resolver;
mod token;

pub use engine::FormulaEngine;
pub use error::CompileError;
pub use evaluation::{ErrorCode, ErrorContext, Evaluation};
pub use options::{ErrorObserver, EvaluationOptions, DEFAULT_MAX_EXPRESSION_LENGTH};
pub use resolver::VariableResolver;
pub use token::{BinaryOp, CompareOp, Paren, Token};
