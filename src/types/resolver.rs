//! Variable resolution, the single suspension point of an evaluation.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;

/// Maps an external field identifier to its current numeric value.
///
/// `None` means the value is absent; the evaluator substitutes 0 and, under
/// strict variables, records `unknown_variable`. Non-finite values are
/// treated the same way.
#[async_trait]
pub trait VariableResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Option<f64>;
}

#[async_trait]
impl VariableResolver for HashMap<String, f64> {
    async fn resolve(&self, identifier: &str) -> Option<f64> {
        self.get(identifier).copied()
    }
}

/// Resolver backed by a synchronous closure. Created by [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnResolver<F>(F);

/// Resolver backed by a closure returning a future. Created by [`from_async_fn`].
#[derive(Debug, Clone)]
pub struct AsyncFnResolver<F>(F);

/// Wrap a synchronous lookup.
///
/// ```
/// let resolver = tallyrpn::resolver::from_fn(|id| (id == "qty").then_some(3.0));
/// # let _ = resolver;
/// ```
pub fn from_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&str) -> Option<f64> + Send + Sync,
{
    FnResolver(f)
}

/// Wrap an asynchronous lookup. The identifier is passed owned so the
/// returned future can outlive the borrow.
pub fn from_async_fn<F, Fut>(f: F) -> AsyncFnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Option<f64>> + Send + 'static,
{
    AsyncFnResolver(f)
}

#[async_trait]
impl<F> VariableResolver for FnResolver<F>
where
    F: Fn(&str) -> Option<f64> + Send + Sync,
{
    async fn resolve(&self, identifier: &str) -> Option<f64> {
        (self.0)(identifier)
    }
}

#[async_trait]
impl<F, Fut> VariableResolver for AsyncFnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Option<f64>> + Send + 'static,
{
    async fn resolve(&self, identifier: &str) -> Option<f64> {
        (self.0)(identifier.to_owned()).await
    }
}
