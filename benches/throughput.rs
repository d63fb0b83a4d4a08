use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use tallyrpn::{EvaluationOptions, FormulaEngine, RoleMap};

const FORMULA: &str = "round(if({{qty}} >= 10, {{qty}} * {{price}} * 0.9, {{qty}} * {{price}}), 2)";

fn build_shared_engine() -> (Arc<FormulaEngine>, RoleMap, HashMap<String, f64>) {
    let roles = RoleMap::from([
        ("qty".to_owned(), "line.qty".to_owned()),
        ("price".to_owned(), "line.price".to_owned()),
    ]);
    let values = HashMap::from([
        ("line.qty".to_owned(), 12.0),
        ("line.price".to_owned(), 19.99),
    ]);
    (Arc::new(FormulaEngine::new()), roles, values)
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let (engine, roles, values) = build_shared_engine();

        group.bench_function(&format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let engine = Arc::clone(&engine);
                        let roles = roles.clone();
                        let values = values.clone();
                        thread::spawn(move || {
                            let options = EvaluationOptions::default();
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = block_on(engine.evaluate_expression(
                                    FORMULA, &roles, &values, &options,
                                ));
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
