use std::collections::HashMap;

use futures::executor::block_on;
use tallyrpn::{resolver, EvaluationOptions, FormulaEngine, RoleMap};

/// A quote line as a host application might store it.
struct Line {
    id: &'static str,
    qty: f64,
    unit_price: f64,
}

fn main() {
    let lines = [
        Line { id: "A-100", qty: 3.0, unit_price: 19.99 },
        Line { id: "B-220", qty: 12.0, unit_price: 4.10 },
        Line { id: "C-005", qty: 0.0, unit_price: 250.0 },
    ];

    let mut store: HashMap<String, f64> = HashMap::new();
    for line in &lines {
        store.insert(format!("{}:qty", line.id), line.qty);
        store.insert(format!("{}:price", line.id), line.unit_price);
    }
    let lookup = resolver::from_fn(move |id| store.get(id).copied());

    let engine = FormulaEngine::new();
    // Money formulas run on a cent grid so sums do not drift.
    let options = EvaluationOptions::new()
        .strict_variables(true)
        .precision_scale(100)
        .on_error(|code, context| eprintln!("warning: {code} at {context}"));

    let formula = "round(if({{qty}} >= 10, {{qty}} * {{price}} * 0.95, {{qty}} * {{price}}), 2)";
    let mut total = 0.0;

    for line in &lines {
        let roles = RoleMap::from([
            ("qty".to_owned(), format!("{}:qty", line.id)),
            ("price".to_owned(), format!("{}:price", line.id)),
        ]);
        let result = block_on(engine.evaluate_expression(formula, &roles, &lookup, &options))
            .expect("failed to evaluate line formula");
        println!("{:>6}: {:>9.2}", line.id, result.value());
        total += result.value();
    }

    println!(" total: {total:>9.2}");
    println!(
        "compiled {} time(s) for {} lines",
        engine.cache_stats().compile_count,
        lines.len()
    );
}
