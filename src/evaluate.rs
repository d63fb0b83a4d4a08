use std::time::Instant;

use crate::functions::Builtin;
use crate::metrics::Metrics;
use crate::numeric::Arithmetic;
use crate::{
    BinaryOp, ErrorCode, ErrorContext, Evaluation, EvaluationOptions, Token, VariableResolver,
};

/// Error list of one run. Every push is mirrored to the observer and metrics.
struct Recorder<'a> {
    errors: Vec<ErrorCode>,
    options: &'a EvaluationOptions,
    metrics: &'a Metrics,
}

impl Recorder<'_> {
    fn push(&mut self, code: ErrorCode, context: ErrorContext) {
        log::trace!("recoverable error {code} at {context}");
        if let Some(observer) = &self.options.on_error {
            observer(code, &context);
        }
        self.metrics.record_error(code);
        self.errors.push(code);
    }

    /// Pass finite values through, otherwise record `invalid_result` and yield 0.
    fn finite(&mut self, value: f64, context: impl FnOnce() -> ErrorContext) -> f64 {
        if value.is_finite() {
            value
        } else {
            self.push(ErrorCode::InvalidResult, context());
            0.0
        }
    }
}

/// Run a postfix program on an operand stack.
///
/// Variables are resolved one at a time, in program order. Stack underflow
/// aborts with value 0; every other problem substitutes a value and continues.
pub(crate) async fn evaluate(
    program: &[Token],
    resolver: &dyn VariableResolver,
    options: &EvaluationOptions,
    metrics: &Metrics,
) -> Evaluation {
    let started = Instant::now();
    let mut recorder = Recorder {
        errors: Vec::new(),
        options,
        metrics,
    };
    let value = run(program, resolver, options, &mut recorder).await;
    metrics.record_evaluation(started.elapsed());
    Evaluation::new(value, recorder.errors)
}

/// Operand plus whether any recoverable error fed into it.
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    value: f64,
    had_error: bool,
}

impl Entry {
    fn clean(value: f64) -> Self {
        Self {
            value,
            had_error: false,
        }
    }
}

async fn run(
    program: &[Token],
    resolver: &dyn VariableResolver,
    options: &EvaluationOptions,
    recorder: &mut Recorder<'_>,
) -> f64 {
    let arith = Arithmetic::new(options.scale());
    let mut stack: Vec<Entry> = Vec::with_capacity(program.len());

    for token in program {
        let before = recorder.errors.len();
        match token {
            Token::Number(v) => stack.push(Entry::clean(*v)),
            Token::Variable(identifier) => {
                let value = match resolver.resolve(identifier).await {
                    Some(v) if v.is_finite() => v,
                    _ => {
                        if options.is_strict() {
                            recorder.push(
                                ErrorCode::UnknownVariable,
                                ErrorContext::Variable {
                                    identifier: identifier.clone(),
                                },
                            );
                        }
                        0.0
                    }
                };
                stack.push(Entry {
                    value,
                    had_error: recorder.errors.len() > before,
                });
            }
            Token::Operator(op) => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    recorder.push(ErrorCode::StackUnderflow, ErrorContext::Operator { op: *op });
                    return 0.0;
                };
                let result = apply_operator(*op, a.value, b.value, arith, options, recorder);
                let value = recorder.finite(result, || ErrorContext::Operator { op: *op });
                stack.push(Entry {
                    value,
                    had_error: a.had_error || b.had_error || recorder.errors.len() > before,
                });
            }
            Token::Function { name, arity } => {
                let arity = arity.unwrap_or(0);
                if stack.len() < arity {
                    recorder.push(
                        ErrorCode::StackUnderflow,
                        ErrorContext::Function { name: name.clone() },
                    );
                    return 0.0;
                }
                let args = stack.split_off(stack.len() - arity);
                recorder.metrics.record_call(name);
                let (result, inherited) = match Builtin::from_name(name) {
                    Some(Builtin::IfError) => {
                        let source = error_fallback(&args);
                        (source.value, source.had_error)
                    }
                    Some(builtin) => {
                        let values: Vec<f64> = args.iter().map(|e| e.value).collect();
                        (
                            builtin.apply(&values, arith),
                            args.iter().any(|e| e.had_error),
                        )
                    }
                    None => {
                        recorder.push(
                            ErrorCode::UnknownFunction,
                            ErrorContext::Function { name: name.clone() },
                        );
                        (0.0, false)
                    }
                };
                let value = recorder.finite(result, || ErrorContext::Function { name: name.clone() });
                stack.push(Entry {
                    value,
                    had_error: inherited || recorder.errors.len() > before,
                });
            }
            // Never produced by the compiler.
            Token::Paren(_) | Token::Comma => {}
        }
    }

    match stack.as_slice() {
        [entry] => recorder.finite(entry.value, || ErrorContext::Result),
        _ => {
            recorder.push(ErrorCode::InvalidResult, ErrorContext::Result);
            0.0
        }
    }
}

/// `iferror(primary, fallback)`: the fallback replaces a primary that carried
/// a recoverable error. A missing fallback reads as a clean 0.
fn error_fallback(args: &[Entry]) -> Entry {
    match args {
        [primary, ..] if !primary.had_error && primary.value.is_finite() => *primary,
        [_, fallback, ..] => *fallback,
        _ => Entry::default(),
    }
}

fn apply_operator(
    op: BinaryOp,
    a: f64,
    b: f64,
    arith: Arithmetic,
    options: &EvaluationOptions,
    recorder: &mut Recorder<'_>,
) -> f64 {
    match op {
        BinaryOp::Add => arith.add(a, b),
        BinaryOp::Sub => arith.sub(a, b),
        BinaryOp::Mul => arith.mul(a, b),
        BinaryOp::Div if b == 0.0 => {
            recorder.push(ErrorCode::DivisionByZero, ErrorContext::Division { dividend: a });
            options.division_by_zero_value
        }
        BinaryOp::Div => arith.div(a, b),
        BinaryOp::Pow => a.powf(b),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{compile, parse, resolver, RoleMap};

    fn program(expr: &str) -> Vec<Token> {
        let tokens = parse(expr, &RoleMap::new(), &EvaluationOptions::default()).unwrap();
        compile(&tokens).unwrap()
    }

    async fn eval_with(program: &[Token], options: &EvaluationOptions) -> (Evaluation, Metrics) {
        let metrics = Metrics::new();
        let vars: HashMap<String, f64> = HashMap::from([("a".into(), 4.0), ("b".into(), 2.0)]);
        let result = evaluate(program, &vars, options, &metrics).await;
        (result, metrics)
    }

    async fn eval(expr: &str) -> Evaluation {
        eval_with(&program(expr), &EvaluationOptions::default()).await.0
    }

    #[tokio::test]
    async fn arithmetic() {
        assert_eq!(eval("2+3*4").await.value(), 14.0);
        assert_eq!(eval("(2+3)*4").await.value(), 20.0);
        assert_eq!(eval("2^3^2").await.value(), 512.0);
        assert_eq!(eval("8-3-2").await.value(), 3.0);
    }

    #[tokio::test]
    async fn division_by_zero_uses_fallback() {
        let result = eval("10/0").await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::DivisionByZero]);

        let options = EvaluationOptions::new().division_by_zero_value(-1.0);
        let (result, metrics) = eval_with(&program("10/0 + 1"), &options).await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(metrics.snapshot().division_by_zero_count(), 1);
    }

    #[tokio::test]
    async fn missing_variable_is_zero() {
        let tokens = vec![
            Token::variable("a"),
            Token::variable("missing"),
            Token::Operator(BinaryOp::Add),
        ];
        let (lenient, _) = eval_with(&tokens, &EvaluationOptions::default()).await;
        assert_eq!(lenient.value(), 4.0);
        assert!(lenient.is_clean());

        let strict = EvaluationOptions::new().strict_variables(true);
        let (result, metrics) = eval_with(&tokens, &strict).await;
        assert_eq!(result.value(), 4.0);
        assert_eq!(result.errors(), &[ErrorCode::UnknownVariable]);
        assert_eq!(metrics.snapshot().unknown_variable_count(), 1);
    }

    #[tokio::test]
    async fn non_finite_variable_is_zero() {
        let metrics = Metrics::new();
        let nan = resolver::from_fn(|_| Some(f64::NAN));
        let strict = EvaluationOptions::new().strict_variables(true);
        let result = evaluate(&[Token::variable("x")], &nan, &strict, &metrics).await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::UnknownVariable]);
    }

    #[tokio::test]
    async fn unknown_function() {
        let result = eval("foo(1, 2)").await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::UnknownFunction]);
    }

    #[tokio::test]
    async fn underflow_aborts() {
        let result = eval("-5").await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::StackUnderflow]);

        let short = vec![Token::Number(1.0), Token::call("max", 2)];
        let (result, _) = eval_with(&short, &EvaluationOptions::default()).await;
        assert_eq!(result.errors(), &[ErrorCode::StackUnderflow]);
    }

    #[tokio::test]
    async fn leftover_operands_are_invalid() {
        let tokens = vec![Token::Number(1.0), Token::Number(2.0)];
        let (result, metrics) = eval_with(&tokens, &EvaluationOptions::default()).await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
        assert_eq!(metrics.snapshot().invalid_result_count(), 1);

        let (empty, _) = eval_with(&[], &EvaluationOptions::default()).await;
        assert_eq!(empty.errors(), &[ErrorCode::InvalidResult]);
    }

    #[tokio::test]
    async fn overflow_is_invalid() {
        let result = eval("10^400").await;
        assert_eq!(result.value(), 0.0);
        assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
    }

    #[tokio::test]
    async fn domain_error_in_function_is_invalid() {
        let result = eval("sqrt(0-4) + 1").await;
        assert_eq!(result.value(), 1.0);
        assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
    }

    #[tokio::test]
    async fn iferror_replaces_a_failed_primary() {
        let result = eval("iferror(1/0, 5)").await;
        assert_eq!(result.value(), 5.0);
        assert_eq!(result.errors(), &[ErrorCode::DivisionByZero]);

        assert_eq!(eval("sierreur(1/0 + 2, 9)").await.value(), 9.0);
        assert_eq!(eval("iferror(sqrt(0-4), 2)").await.value(), 2.0);
        assert_eq!(eval("iferror(foo(), 3)").await.value(), 3.0);
    }

    #[tokio::test]
    async fn iferror_keeps_a_clean_primary() {
        let result = eval("iferror(7, 5)").await;
        assert_eq!(result.value(), 7.0);
        assert!(result.is_clean());

        // The inner fallback failed but was not used, so the outer primary is clean.
        let result = eval("iferror(iferror(1, 1/0), 6)").await;
        assert_eq!(result.value(), 1.0);
        assert_eq!(result.errors(), &[ErrorCode::DivisionByZero]);
    }

    #[tokio::test]
    async fn iferror_propagates_a_failed_fallback() {
        assert_eq!(eval("iferror(iferror(1/0, 1/0), 6)").await.value(), 6.0);
        assert_eq!(eval("iferror(1/0)").await.value(), 0.0);
    }

    #[tokio::test]
    async fn iferror_catches_strict_unknown_variables() {
        let tokens = vec![
            Token::variable("missing"),
            Token::Number(4.0),
            Token::call("iferror", 2),
        ];
        let strict = EvaluationOptions::new().strict_variables(true);
        let (result, _) = eval_with(&tokens, &strict).await;
        assert_eq!(result.value(), 4.0);
        assert_eq!(result.errors(), &[ErrorCode::UnknownVariable]);

        let (lenient, _) = eval_with(&tokens, &EvaluationOptions::default()).await;
        assert_eq!(lenient.value(), 0.0);
        assert!(lenient.is_clean());
    }

    #[tokio::test]
    async fn fixed_point_sum() {
        let plain = eval("0.1 + 0.2").await;
        assert_ne!(plain.value(), 0.3);

        let options = EvaluationOptions::new().precision_scale(10_000);
        let (fixed, _) = eval_with(&program("0.1 + 0.2"), &options).await;
        assert_eq!(fixed.value(), 0.3);
    }

    #[tokio::test]
    async fn observer_sees_each_error() {
        let seen: Arc<Mutex<Vec<(ErrorCode, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let options = EvaluationOptions::new()
            .on_error(move |code, context| sink.lock().unwrap().push((code, context.to_string())));
        let (result, _) = eval_with(&program("1/0 + foo()"), &options).await;
        assert_eq!(
            result.errors(),
            &[ErrorCode::DivisionByZero, ErrorCode::UnknownFunction]
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (ErrorCode::DivisionByZero, "1 / 0".to_string()));
        assert_eq!(seen[1], (ErrorCode::UnknownFunction, "function 'foo'".to_string()));
    }

    #[tokio::test]
    async fn metrics_count_evaluations_and_calls() {
        let (_, metrics) = eval_with(
            &program("max(1, 2) + max(1, min(2, 3))"),
            &EvaluationOptions::default(),
        )
        .await;
        let snap = metrics.snapshot();
        assert_eq!(snap.evaluations(), 1);
        assert_eq!(snap.function_call_count("max"), 2);
        assert_eq!(snap.function_call_count("min"), 1);
    }

    #[tokio::test]
    async fn async_resolver_is_awaited_in_order() {
        let order: Arc<Mutex<Vec<String>>> = Arc::default();
        let log = Arc::clone(&order);
        let lookup = resolver::from_async_fn(move |id: String| {
            let log = Arc::clone(&log);
            async move {
                tokio::task::yield_now().await;
                log.lock().unwrap().push(id);
                Some(1.0)
            }
        });
        let tokens = vec![
            Token::variable("first"),
            Token::variable("second"),
            Token::Operator(BinaryOp::Add),
            Token::variable("third"),
            Token::Operator(BinaryOp::Mul),
        ];
        let metrics = Metrics::new();
        let result = evaluate(&tokens, &lookup, &EvaluationOptions::default(), &metrics).await;
        assert_eq!(result.value(), 2.0);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
