mod cache;
mod compile;
mod error;
mod evaluate;
mod functions;
mod metrics;
mod numeric;
mod parse;
mod types;

pub use cache::{fingerprint, CacheStats, RpnCache};
pub use compile::compile;
pub use error::FormulaError;
pub use functions::Builtin;
pub use metrics::{Metrics, MetricsSnapshot};
pub use parse::{parse, ParseError, RoleMap};
pub use types::{
    resolver, BinaryOp, CompareOp, CompileError, ErrorCode, ErrorContext, ErrorObserver,
    Evaluation, EvaluationOptions, FormulaEngine, Paren, Token, VariableResolver,
    DEFAULT_MAX_EXPRESSION_LENGTH,
};
