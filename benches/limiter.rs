use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tollbooth::Limiter;

fn execute_uncontended(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("build runtime");
    // Capacity far past anything the bench can consume, so no call waits.
    let limiter = Limiter::with_rate("bench", 1_000_000_000, Duration::from_secs(1))
        .expect("valid bench config");

    c.bench_function("execute_uncontended", |b| {
        b.to_async(&rt).iter(|| {
            let limiter = limiter.clone();
            async move {
                limiter
                    .execute(|| async { Ok::<_, std::io::Error>(1u64) })
                    .await
                    .expect("bench op never fails")
            }
        })
    });
}

fn status_snapshot(c: &mut Criterion) {
    let limiter = Limiter::with_rate("bench", 100, Duration::from_secs(1))
        .expect("valid bench config");

    c.bench_function("status_snapshot", |b| b.iter(|| limiter.status()));
}

criterion_group!(benches, execute_uncontended, status_snapshot);
criterion_main!(benches);
