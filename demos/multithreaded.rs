use std::collections::HashMap;
use std::sync::Arc;

use tallyrpn::{resolver, EvaluationOptions, FormulaEngine, RoleMap};

#[tokio::main]
async fn main() {
    let engine = Arc::new(FormulaEngine::new());
    let roles = Arc::new(RoleMap::from([(
        "score".to_owned(),
        "user.score".to_owned(),
    )]));

    let handles: Vec<_> = (0..4_u32)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let roles = Arc::clone(&roles);
            tokio::spawn(async move {
                // Stands in for a remote lookup.
                let lookup = resolver::from_async_fn(move |id: String| async move {
                    tokio::task::yield_now().await;
                    let scores = HashMap::from([("user.score".to_owned(), 40.0 + f64::from(i) * 15.0)]);
                    scores.get(&id).copied()
                });
                let result = engine
                    .evaluate_expression(
                        "if({{score}} > 60, 1, 0)",
                        &roles,
                        &lookup,
                        &EvaluationOptions::default(),
                    )
                    .await
                    .expect("failed to evaluate formula");
                println!("Task {i}: {result}");
            })
        })
        .collect();

    for h in handles {
        h.await.unwrap();
    }

    println!("{}", engine.metrics());
}
