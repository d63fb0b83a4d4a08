use std::collections::HashMap;

use futures::executor::block_on;
use tallyrpn::{EvaluationOptions, FormulaEngine, RoleMap};

fn main() {
    let engine = FormulaEngine::new();
    let roles = RoleMap::from([("x".to_owned(), "x".to_owned())]);
    let values = HashMap::from([("x".to_owned(), 8.0)]);
    let options = EvaluationOptions::new().strict_variables(true);

    let formulas = [
        "max({{x}}, 10) / 2",
        "max({{x}}, 10) / 2",
        "{{x}} / 0",
        "sqrt(0 - {{x}})",
        "foo({{x}})",
        "{{y}} + 1",
        "(1 + 2",
    ];

    for formula in formulas {
        match block_on(engine.evaluate_expression(formula, &roles, &values, &options)) {
            Ok(result) => println!("{formula:<20} => {result}"),
            Err(err) => println!("{formula:<20} => fatal: {err}"),
        }
    }

    println!();
    print!("{}", engine.metrics());
    println!("cache: {:?}", engine.cache_stats());

    engine.reset_metrics();
    println!("after reset: {} evaluations", engine.metrics().evaluations());
}
