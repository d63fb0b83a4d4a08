use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

use crate::ErrorCode;

/// Process-wide evaluation counters, updated lock-free from any thread.
///
/// Owned by a [`FormulaEngine`](crate::FormulaEngine); read it with
/// [`snapshot`](Metrics::snapshot).
#[derive(Debug, Default)]
pub struct Metrics {
    evaluations: AtomicU64,
    total_nanos: AtomicU64,
    division_by_zero: AtomicU64,
    unknown_variables: AtomicU64,
    parse_errors: AtomicU64,
    invalid_results: AtomicU64,
    function_calls: DashMap<String, u64>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_evaluation(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Count a recoverable error. Codes without a dedicated counter are ignored.
    pub(crate) fn record_error(&self, code: ErrorCode) {
        let counter = match code {
            ErrorCode::DivisionByZero => &self.division_by_zero,
            ErrorCode::UnknownVariable => &self.unknown_variables,
            ErrorCode::InvalidResult => &self.invalid_results,
            ErrorCode::UnknownFunction | ErrorCode::StackUnderflow => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_call(&self, name: &str) {
        if let Some(mut count) = self.function_calls.get_mut(name) {
            *count += 1;
            return;
        }
        *self.function_calls.entry(name.to_owned()).or_insert(0) += 1;
    }

    pub(crate) fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            evaluations: self.evaluations.load(Ordering::Relaxed),
            total_time: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            function_calls: self
                .function_calls
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            division_by_zero_count: self.division_by_zero.load(Ordering::Relaxed),
            unknown_variable_count: self.unknown_variables.load(Ordering::Relaxed),
            parse_error_count: self.parse_errors.load(Ordering::Relaxed),
            invalid_result_count: self.invalid_results.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter and forget all function names.
    pub fn reset(&self) {
        for counter in [
            &self.evaluations,
            &self.total_nanos,
            &self.division_by_zero,
            &self.unknown_variables,
            &self.parse_errors,
            &self.invalid_results,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.function_calls.clear();
    }
}

/// Copy of the counters at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    evaluations: u64,
    total_time: Duration,
    function_calls: BTreeMap<String, u64>,
    division_by_zero_count: u64,
    unknown_variable_count: u64,
    parse_error_count: u64,
    invalid_result_count: u64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Mean wall-clock time per evaluation, zero before the first one.
    #[must_use]
    pub fn avg_time(&self) -> Duration {
        if self.evaluations == 0 {
            return Duration::ZERO;
        }
        let avg = self.total_time.as_nanos() / u128::from(self.evaluations);
        Duration::from_nanos(u64::try_from(avg).unwrap_or(u64::MAX))
    }

    #[must_use]
    pub fn total_time_ms(&self) -> f64 {
        self.total_time.as_secs_f64() * 1_000.0
    }

    #[must_use]
    pub fn avg_time_ms(&self) -> f64 {
        self.avg_time().as_secs_f64() * 1_000.0
    }

    /// Invocation count per built-in name, as written in the formula.
    #[must_use]
    pub fn function_calls(&self) -> &BTreeMap<String, u64> {
        &self.function_calls
    }

    #[must_use]
    pub fn function_call_count(&self, name: &str) -> u64 {
        self.function_calls.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn division_by_zero_count(&self) -> u64 {
        self.division_by_zero_count
    }

    #[must_use]
    pub fn unknown_variable_count(&self) -> u64 {
        self.unknown_variable_count
    }

    #[must_use]
    pub fn parse_error_count(&self) -> u64 {
        self.parse_error_count
    }

    #[must_use]
    pub fn invalid_result_count(&self) -> u64 {
        self.invalid_result_count
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "evaluations: {} (total {:.3}ms, avg {:.3}ms)",
            self.evaluations,
            self.total_time_ms(),
            self.avg_time_ms()
        )?;
        writeln!(
            f,
            "errors: division_by_zero={} unknown_variable={} parse={} invalid_result={}",
            self.division_by_zero_count,
            self.unknown_variable_count,
            self.parse_error_count,
            self.invalid_result_count
        )?;
        if !self.function_calls.is_empty() {
            write!(f, "calls:")?;
            for (name, count) in &self.function_calls {
                write!(f, " {name}={count}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
