use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::{CompileError, Paren, Token};

/// Memoizes compiled postfix programs, keyed by the fingerprint of the infix
/// token stream they were compiled from.
///
/// Entries are immutable once inserted and never invalidated: compilation is
/// a pure function of the token stream. Safe to share between threads.
#[derive(Debug, Default)]
pub struct RpnCache {
    entries: DashMap<String, Arc<[Token]>>,
    compile_count: AtomicU64,
}

/// Point-in-time view of an [`RpnCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub compile_count: u64,
}

impl RpnCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached program for `tokens`, compiling and storing it on a miss.
    ///
    /// With `enabled == false` the map is neither read nor written, but the
    /// compile counter still advances.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if `tokens` does not compile. Failures are not cached.
    pub fn get_or_compile(
        &self,
        tokens: &[Token],
        enabled: bool,
    ) -> Result<Arc<[Token]>, CompileError> {
        if !enabled {
            return self.compile_counted(tokens);
        }

        let key = fingerprint(tokens);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let key_len = key.len();
        match self.entries.entry(key) {
            Entry::Occupied(hit) => Ok(Arc::clone(hit.get())),
            Entry::Vacant(slot) => {
                let program = self.compile_counted(tokens)?;
                log::debug!(
                    "rpn cache miss: fingerprint of {key_len} bytes, {} postfix tokens",
                    program.len()
                );
                slot.insert(Arc::clone(&program));
                Ok(program)
            }
        }
    }

    fn compile_counted(&self, tokens: &[Token]) -> Result<Arc<[Token]>, CompileError> {
        let program = crate::compile::compile(tokens)?;
        self.compile_count.fetch_add(1, Ordering::Relaxed);
        Ok(program.into())
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            compile_count: self.compile_count.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. The compile counter is kept.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Order-preserving, type-tagged encoding of a token stream.
///
/// ```
/// use tallyrpn::{fingerprint, BinaryOp, Token};
///
/// let tokens = [Token::Number(2.0), Token::Operator(BinaryOp::Add), Token::variable("n1")];
/// assert_eq!(fingerprint(&tokens), "n:2.0|o:+|v:2:n1");
/// ```
#[must_use]
pub fn fingerprint(tokens: &[Token]) -> String {
    let mut key = String::with_capacity(tokens.len() * 4);
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            key.push('|');
        }
        // Writing into a String cannot fail.
        let _ = match token {
            Token::Number(v) => write!(key, "n:{v:?}"),
            Token::Variable(id) => write!(key, "v:{}", id.len()).and_then(|()| write!(key, ":{id}")),
            Token::Operator(op) => write!(key, "o:{op}"),
            Token::Paren(Paren::Open) => write!(key, "p:("),
            Token::Paren(Paren::Close) => write!(key, "p:)"),
            Token::Comma => write!(key, "c"),
            Token::Function { name, arity } => match arity {
                Some(n) => write!(key, "f:{name}:{n}"),
                None => write!(key, "f:{name}:?"),
            },
        };
    }
    key
}
