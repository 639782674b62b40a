use anyhow::Result;
use tracing_subscriber::EnvFilter;

use macroflow::indicators::registry::Registry;
use macroflow::pipeline::cache::ResultCache;
use macroflow::{Orchestrator, PipelineConfig};

/// One acquisition run over the default spec set, printed as the table the
/// dashboard cards read: latest value, delta vs the previous point, points
/// in the tail window.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from_env();
    let cache = ResultCache::new(config.cache_ttl, 4);
    let specs = Registry::default_specs();

    let run = match cache.get(specs) {
        Some(hit) => hit,
        None => {
            let orchestrator = Orchestrator::new(config);
            let series = orchestrator.run(specs).await;
            cache.put(specs, series)
        }
    };

    println!("fetched at {}", run.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "{:<18} | {:<12} | {:>16} | {:>8} | {:>6}",
        "Series", "Latest", "Value", "Chg %", "Points"
    );
    println!("{}", "-".repeat(72));

    for (key, series) in run.series.iter() {
        match series.latest() {
            Some(last) => {
                let delta = series
                    .delta_pct()
                    .map(|d| format!("{:+.2}", d))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<18} | {:<12} | {:>16.4} | {:>8} | {:>6}",
                    key,
                    last.timestamp.format("%Y-%m-%d"),
                    last.value,
                    delta,
                    series.tail(90).len()
                );
            }
            None => println!("{:<18} | {:<12} | {:>16} | {:>8} | {:>6}", key, "-", "NO DATA", "-", 0),
        }
    }

    Ok(())
}
