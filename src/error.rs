use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Fatal failure of the one-step helpers on [`FormulaEngine`](crate::FormulaEngine).
///
/// Recoverable evaluation problems are never reported here; they are listed
/// in [`Evaluation::errors`](crate::Evaluation::errors).
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
