use thiserror::Error;

/// Fatal errors raised while turning an infix token stream into a postfix program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("argument separator outside of a function call")]
    MisplacedComma,

    #[error("function '{name}' is not followed by an argument list")]
    DanglingFunction { name: String },
}
