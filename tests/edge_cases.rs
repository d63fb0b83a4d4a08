use std::collections::HashMap;

use regex::Regex;
use tallyrpn::{
    compile, parse, BinaryOp, CompileError, ErrorCode, EvaluationOptions, FormulaEngine,
    FormulaError, ParseError, RoleMap, Token,
};

fn no_vars() -> HashMap<String, f64> {
    HashMap::new()
}

async fn run(expr: &str) -> tallyrpn::Evaluation {
    FormulaEngine::new()
        .evaluate_expression(expr, &RoleMap::new(), &no_vars(), &EvaluationOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_expression_is_fatal() {
    let engine = FormulaEngine::new();
    let err = engine
        .evaluate_expression("", &RoleMap::new(), &no_vars(), &EvaluationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FormulaError::Parse(ParseError::Empty)));
    assert_eq!(engine.metrics().parse_error_count(), 1);
}

#[tokio::test]
async fn blank_expression_is_invalid_result() {
    let result = run("   ").await;
    assert_eq!(result.value(), 0.0);
    assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
}

#[tokio::test]
async fn leading_minus_underflows() {
    let result = run("-5").await;
    assert_eq!(result.value(), 0.0);
    assert_eq!(result.errors(), &[ErrorCode::StackUnderflow]);

    assert_eq!(run("0-5").await.value(), -5.0);
}

#[tokio::test]
async fn zero_argument_calls() {
    assert_eq!(run("pi()").await.value(), std::f64::consts::PI);
    assert_eq!(run("count()").await.value(), 0.0);

    let result = run("max()").await;
    assert_eq!(result.value(), 0.0);
    assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
}

#[tokio::test]
async fn if_needs_two_arguments() {
    let result = run("if(1)").await;
    assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
    assert_eq!(run("if(0, 1)").await.value(), 0.0);
}

#[tokio::test]
async fn overflow_becomes_invalid_result() {
    let result = run("10^400").await;
    assert_eq!(result.value(), 0.0);
    assert_eq!(result.errors(), &[ErrorCode::InvalidResult]);
}

#[tokio::test]
async fn errors_accumulate_in_order() {
    let result = run("1/0 + foo(2) + 3/0").await;
    assert_eq!(
        result.error_strings(),
        vec!["division_by_zero", "unknown_function", "division_by_zero"]
    );
    assert_eq!(result.value(), 0.0);
}

#[tokio::test]
async fn round_clamps_decimals() {
    assert_eq!(run("round(1.26, 0 - 3)").await.value(), 1.0);
    assert_eq!(run("round(1.5, 40)").await.value(), 1.5);
}

#[tokio::test]
async fn deeply_nested_groups() {
    let expr = format!("{}1{}", "(".repeat(60), ")".repeat(60));
    assert_eq!(run(&expr).await.value(), 1.0);
}

#[tokio::test]
async fn deeply_nested_comparisons_without_length_limit() {
    // 1 > (1 > ... (1 > 0)): the innermost is 1 and each level flips it.
    let levels = 5_000;
    let expr = format!("{}1 > 0{}", "1 > (".repeat(levels), ")".repeat(levels));
    let options = EvaluationOptions::new().max_expression_length(usize::MAX);
    let result = FormulaEngine::new()
        .evaluate_expression(&expr, &RoleMap::new(), &no_vars(), &options)
        .await
        .unwrap();
    assert!(result.is_clean());
    assert_eq!(result.value(), if levels % 2 == 0 { 1.0 } else { 0.0 });
}

#[tokio::test]
async fn multi_character_identifiers_in_roles() {
    let roles = RoleMap::from([("unit price".to_owned(), "sku/42:price".to_owned())]);
    let values = HashMap::from([("sku/42:price".to_owned(), 8.0)]);
    let result = FormulaEngine::new()
        .evaluate_expression(
            "{{unit price}} / 2",
            &roles,
            &values,
            &EvaluationOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.value(), 4.0);
}

#[test]
fn unterminated_placeholder() {
    let err = parse("{{qty + 1", &RoleMap::new(), &EvaluationOptions::default()).unwrap_err();
    assert_eq!(err, ParseError::UnterminatedPlaceholder { offset: 0 });
}

#[test]
fn malformed_number() {
    let err = parse("1.2.3 + 1", &RoleMap::new(), &EvaluationOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedNumber { offset: 0, .. }));
}

#[test]
fn lone_equals_is_unexpected() {
    let err = parse("1 = 1", &RoleMap::new(), &EvaluationOptions::default()).unwrap_err();
    assert_eq!(err, ParseError::UnexpectedCharacter { ch: '=', offset: 2 });
}

#[test]
fn close_before_open() {
    let err = parse(")1(", &RoleMap::new(), &EvaluationOptions::default()).unwrap_err();
    assert_eq!(err, ParseError::UnbalancedParentheses { offset: 0 });
}

#[test]
fn custom_character_whitelist() {
    let options = EvaluationOptions::new().allowed_chars(Regex::new(r"[0-9+ ]").unwrap());
    assert!(parse("1 + 2", &RoleMap::new(), &options).is_ok());
    let err = parse("1 * 2", &RoleMap::new(), &options).unwrap_err();
    assert_eq!(err, ParseError::IllegalCharacter { ch: '*', offset: 2 });
}

#[test]
fn length_is_counted_in_characters() {
    let options = EvaluationOptions::new()
        .max_expression_length(3)
        .allowed_chars(Regex::new(r".").unwrap());
    let err = parse("éé+é", &RoleMap::new(), &options).unwrap_err();
    assert_eq!(err, ParseError::TooLong { length: 4, max: 3 });
}

#[test]
fn hand_built_tokens_compile() {
    let tokens = vec![
        Token::function("max"),
        Token::Paren(tallyrpn::Paren::Open),
        Token::Number(1.0),
        Token::Comma,
        Token::variable("x"),
        Token::Paren(tallyrpn::Paren::Close),
        Token::Operator(BinaryOp::Mul),
        Token::Number(2.0),
    ];
    let program = compile(&tokens).unwrap();
    assert_eq!(
        program,
        vec![
            Token::Number(1.0),
            Token::variable("x"),
            Token::call("max", 2),
            Token::Number(2.0),
            Token::Operator(BinaryOp::Mul),
        ]
    );
}

#[tokio::test]
async fn compile_errors_surface_from_tokens() {
    let engine = FormulaEngine::new();
    let tokens = vec![Token::function("abs"), Token::Number(1.0)];
    let err = engine
        .evaluate_tokens(&tokens, &no_vars(), &EvaluationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FormulaError::Compile(CompileError::DanglingFunction { .. })
    ));
}
