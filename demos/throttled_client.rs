//! One limiter per upstream service, wired through a registry and the
//! bound-function adapter.

use std::time::Duration;
use tollbooth::{InMemoryLimiterRegistry, Limiter, LimiterRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let registry = InMemoryLimiterRegistry::default();
    registry.register(Limiter::with_rate("geocoder", 25, Duration::from_secs(1))?);
    registry.register(Limiter::with_rate("mailer", 100, Duration::from_secs(60))?);

    let geocoder = registry.get("geocoder").expect("registered above");
    let lookup = geocoder.wrap(|address: &'static str| async move {
        Ok::<_, std::io::Error>(format!("coords for {address}"))
    });

    println!("{}", lookup.call("221B Baker Street").await?);
    println!("{}", lookup.call("4 Privet Drive").await?);

    for status in registry.snapshot() {
        println!("{:>10}: {:>3} tokens, {} queued", status.name, status.tokens, status.queue_len);
    }
    Ok(())
}
