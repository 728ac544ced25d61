//! Burst ten calls through a 5-per-second limiter and watch the pacing.

use std::time::Duration;
use tollbooth::Limiter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let limiter = Limiter::with_rate("demo-api", 5, Duration::from_secs(1))?;
    let started = tokio::time::Instant::now();

    let calls: Vec<_> = (0..10)
        .map(|i| limiter.submit(move || async move { Ok::<_, std::io::Error>(i) }))
        .collect();

    for pending in calls {
        let i = pending.await?;
        let status = limiter.status();
        println!(
            "call {i:2} finished at {:>8.0?} ({} tokens left, {} queued)",
            started.elapsed(),
            status.tokens,
            status.queue_len,
        );
    }
    Ok(())
}
