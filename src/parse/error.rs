use thiserror::Error;

use crate::CompareOp;

/// Fatal errors produced while lexing an expression. Offsets are byte offsets
/// into the original expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,

    #[error("expression too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },

    #[error("illegal character {ch:?} at offset {offset}")]
    IllegalCharacter { ch: char, offset: usize },

    #[error("unknown variable reference '{{{{{role}}}}}'")]
    UnknownRole { role: String },

    #[error("unterminated placeholder at offset {offset}")]
    UnterminatedPlaceholder { offset: usize },

    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParentheses { offset: usize },

    #[error("unexpected identifier '{ident}' at offset {offset}; only function calls are supported")]
    BareIdentifier { ident: String, offset: usize },

    #[error("malformed number '{text}' at offset {offset}")]
    MalformedNumber { text: String, offset: usize },

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("comparison '{op}' at offset {offset} needs an operand on both sides")]
    MalformedComparison { op: CompareOp, offset: usize },

    #[error("chained comparison at offset {offset}; group it with parentheses")]
    ChainedComparison { offset: usize },
}
