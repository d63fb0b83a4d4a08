use std::sync::Arc;

use crate::cache::{CacheStats, RpnCache};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::parse::{ParseError, RoleMap};
use crate::{CompileError, FormulaError};

use super::evaluation::Evaluation;
use super::options::EvaluationOptions;
use super::resolver::VariableResolver;
use super::token::Token;

/// The formula pipeline with its shared state: one [`RpnCache`] and one
/// [`Metrics`] recorder.
///
/// Thread-safe and designed to live behind `Arc`; any number of evaluations
/// may run against one engine at the same time.
///
/// # Example
///
/// ```
/// use tallyrpn::{EvaluationOptions, FormulaEngine, RoleMap};
/// use std::collections::HashMap;
///
/// let engine = FormulaEngine::new();
/// let roles = RoleMap::from([("qty".to_owned(), "line-7".to_owned())]);
/// let values = HashMap::from([("line-7".to_owned(), 3.0)]);
///
/// let result = futures::executor::block_on(engine.evaluate_expression(
///     "{{qty}} * 2 + 1",
///     &roles,
///     &values,
///     &EvaluationOptions::default(),
/// ))
/// .unwrap();
/// assert_eq!(result.value(), 7.0);
/// ```
#[derive(Debug, Default)]
pub struct FormulaEngine {
    cache: RpnCache,
    metrics: Metrics,
}

impl FormulaEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex an expression into infix tokens. Failures are counted as parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on any lexical or placeholder problem.
    pub fn parse(
        &self,
        expression: &str,
        roles: &RoleMap,
        options: &EvaluationOptions,
    ) -> Result<Vec<Token>, ParseError> {
        crate::parse::parse(expression, roles, options).map_err(|e| {
            log::debug!("parse failed: {e}");
            self.metrics.record_parse_error();
            e
        })
    }

    /// Compile infix tokens through the cache. Failures are counted as parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the token stream is not well formed.
    pub fn compile(
        &self,
        tokens: &[Token],
        options: &EvaluationOptions,
    ) -> Result<Arc<[Token]>, CompileError> {
        self.cache
            .get_or_compile(tokens, options.cache_enabled())
            .map_err(|e| {
                log::debug!("compile failed: {e}");
                self.metrics.record_parse_error();
                e
            })
    }

    /// Run an already-compiled postfix program.
    pub async fn evaluate_rpn(
        &self,
        program: &[Token],
        resolver: &dyn VariableResolver,
        options: &EvaluationOptions,
    ) -> Evaluation {
        crate::evaluate::evaluate(program, resolver, options, &self.metrics).await
    }

    /// Compile infix tokens (through the cache) and run them.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Compile`] if the tokens do not compile.
    pub async fn evaluate_tokens(
        &self,
        tokens: &[Token],
        resolver: &dyn VariableResolver,
        options: &EvaluationOptions,
    ) -> Result<Evaluation, FormulaError> {
        let program = self.compile(tokens, options)?;
        Ok(self.evaluate_rpn(&program, resolver, options).await)
    }

    /// Parse, compile and evaluate in one step.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError`] on a fatal parse or compile failure. Nothing is
    /// evaluated in that case.
    pub async fn evaluate_expression(
        &self,
        expression: &str,
        roles: &RoleMap,
        resolver: &dyn VariableResolver,
        options: &EvaluationOptions,
    ) -> Result<Evaluation, FormulaError> {
        let tokens = self.parse(expression, roles, options)?;
        self.evaluate_tokens(&tokens, resolver, options).await
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn cache(&self) -> &RpnCache {
        &self.cache
    }
}
