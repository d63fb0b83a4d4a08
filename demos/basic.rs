use std::collections::HashMap;

use futures::executor::block_on;
use tallyrpn::{compile, parse, EvaluationOptions, FormulaEngine, RoleMap};

fn main() {
    // Roles name the inputs; the resolver only ever sees the identifiers.
    let roles = RoleMap::from([
        ("qty".to_owned(), "line-1.qty".to_owned()),
        ("price".to_owned(), "line-1.price".to_owned()),
    ]);
    let values = HashMap::from([
        ("line-1.qty".to_owned(), 12.0),
        ("line-1.price".to_owned(), 4.75),
    ]);
    let options = EvaluationOptions::default();

    let formula = "round({{qty}} * {{price}} * if({{qty}} >= 10, 0.9, 1), 2)";

    // The pipeline, step by step.
    let tokens = parse(formula, &roles, &options).expect("failed to parse formula");
    let program = compile(&tokens).expect("failed to compile formula");
    let rendered: Vec<String> = program.iter().map(ToString::to_string).collect();
    println!("RPN: {}", rendered.join(" "));

    // Or in one call through an engine, which caches the compiled program.
    let engine = FormulaEngine::new();
    let result = block_on(engine.evaluate_expression(formula, &roles, &values, &options))
        .expect("failed to evaluate formula");
    println!("{formula} => {result}");

    let result = block_on(engine.evaluate_expression("10 / 0", &roles, &values, &options))
        .expect("failed to evaluate formula");
    println!("10 / 0 => {result}");
}
