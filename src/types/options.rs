use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::evaluation::{ErrorCode, ErrorContext};

pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 500;

/// Observer invoked once per recoverable error.
pub type ErrorObserver = Arc<dyn Fn(ErrorCode, &ErrorContext) + Send + Sync>;

/// Settings shared by parsing, compilation and evaluation.
///
/// Built with consuming setters on top of [`Default`]:
///
/// ```
/// use tallyrpn::EvaluationOptions;
///
/// let options = EvaluationOptions::new()
///     .strict_variables(true)
///     .division_by_zero_value(-1.0)
///     .precision_scale(10_000);
/// assert!(options.is_strict());
/// ```
#[derive(Clone)]
pub struct EvaluationOptions {
    pub(crate) on_error: Option<ErrorObserver>,
    pub(crate) division_by_zero_value: f64,
    pub(crate) strict_variables: bool,
    pub(crate) enable_cache: bool,
    pub(crate) max_expression_length: usize,
    pub(crate) allowed_chars: Option<Regex>,
    pub(crate) precision_scale: Option<u32>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            on_error: None,
            division_by_zero_value: 0.0,
            strict_variables: false,
            enable_cache: true,
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
            allowed_chars: None,
            precision_scale: None,
        }
    }
}

impl EvaluationOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_error(mut self, observer: impl Fn(ErrorCode, &ErrorContext) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(observer));
        self
    }

    /// Result substituted for `a / 0`.
    #[must_use]
    pub fn division_by_zero_value(mut self, value: f64) -> Self {
        self.division_by_zero_value = value;
        self
    }

    /// Record `unknown_variable` when the resolver has no value.
    #[must_use]
    pub fn strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    #[must_use]
    pub fn enable_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    #[must_use]
    pub fn max_expression_length(mut self, max: usize) -> Self {
        self.max_expression_length = max;
        self
    }

    /// Replace the character whitelist. Every character of an expression
    /// must match `pattern` on its own.
    #[must_use]
    pub fn allowed_chars(mut self, pattern: Regex) -> Self {
        self.allowed_chars = Some(pattern);
        self
    }

    /// Run `+ - * /` and `round` on integers scaled by `scale`.
    /// Values below 2 leave scaling off.
    #[must_use]
    pub fn precision_scale(mut self, scale: u32) -> Self {
        self.precision_scale = (scale >= 2).then_some(scale);
        self
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict_variables
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.enable_cache
    }

    #[must_use]
    pub fn scale(&self) -> Option<u32> {
        self.precision_scale
    }

    pub(crate) fn is_allowed(&self, c: char) -> bool {
        match &self.allowed_chars {
            Some(re) => {
                let mut buf = [0u8; 4];
                re.is_match(c.encode_utf8(&mut buf))
            }
            None => is_default_allowed(c),
        }
    }
}

/// Alphanumerics, `_`, whitespace, arithmetic, grouping, placeholder braces
/// and the comparison characters.
fn is_default_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(
            c,
            '_' | '+' | '-' | '*' | '/' | '^' | '(' | ')' | ',' | '.' | '{' | '}' | ':' | '<'
                | '>' | '=' | '!'
        )
}

impl fmt::Debug for EvaluationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationOptions")
            .field("on_error", &self.on_error.as_ref().map(|_| "<observer>"))
            .field("division_by_zero_value", &self.division_by_zero_value)
            .field("strict_variables", &self.strict_variables)
            .field("enable_cache", &self.enable_cache)
            .field("max_expression_length", &self.max_expression_length)
            .field("allowed_chars", &self.allowed_chars.as_ref().map(Regex::as_str))
            .field("precision_scale", &self.precision_scale)
            .finish()
    }
}
