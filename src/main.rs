// frontier-sim: drives a URL frontier with simulated producers and one fetch worker.
//
// Usage: frontier-sim [config.json]
// Logging is controlled through RUST_LOG (default: info).

use anyhow::{Context, Result};
use crawl_frontier::{FrontierConfig, Hyperlink, MemoryUrlLoader, Priority13, UrlFrontier};
use log::info;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PRODUCERS: usize = 4;
const URLS_PER_PRODUCER: usize = 500;

fn load_config() -> Result<FrontierConfig> {
    match std::env::args().nth(1) {
        Some(path) => FrontierConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from {path}")),
        None => FrontierConfig::builder()
            .job_id("frontier-sim")
            .cache_capacity(250)
            .load_delay(Duration::from_secs(1))
            .low_water_mark(50)
            .build(),
    }
}

/// Submit URLs at random priorities; a few go through the real-time cache
fn produce(frontier: &UrlFrontier, producer: usize) -> Result<usize> {
    let mut rng = rand::rng();
    let mut accepted = 0;
    for i in 0..URLS_PER_PRODUCER {
        let level = Priority13::ALL[rng.random_range(0..Priority13::ALL.len())];
        let url = Hyperlink::parse(&format!("https://site{producer}.example.com/page/{i}"))?
            .with_priority(level);
        let ok = if rng.random_ratio(1, 50) {
            frontier.add_realtime(url)
        } else {
            frontier.add(url)
        };
        accepted += usize::from(ok);
    }
    Ok(accepted)
}

/// Drain the frontier, retrying a small share of URLs after a short delay
fn consume(frontier: &UrlFrontier) -> BTreeMap<i32, usize> {
    let mut rng = rand::rng();
    let mut served: BTreeMap<i32, usize> = BTreeMap::new();
    let mut retried = 0usize;

    loop {
        while frontier.has_next() {
            let Ok(url) = frontier.next_url() else {
                break;
            };
            *served.entry(Priority13::lower_priority(url.priority()).value()).or_default() += 1;
            if retried < 20 && rng.random_ratio(1, 100) {
                retried += 1;
                frontier.add_delayed(url, Duration::from_millis(rng.random_range(10..200)));
            }
        }
        // Pending retries and partitions cooling down still count
        if frontier.estimated_size() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    served
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let loader = Arc::new(MemoryUrlLoader::new(config.load_delay()));
    let frontier = Arc::new(UrlFrontier::loading(loader.clone(), config));
    let started = Instant::now();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let frontier = Arc::clone(&frontier);
            tokio::task::spawn_blocking(move || produce(&frontier, producer))
        })
        .collect();

    let mut submitted = 0;
    for handle in producers {
        submitted += handle.await.context("Producer task panicked")??;
    }
    info!(
        "Submitted {submitted} URLs, {} held locally, {} saved externally",
        frontier.size(),
        loader.total_stored()
    );
    info!(
        "Estimated order for a NORMAL submission: {}",
        frontier.estimated_order(Priority13::NORMAL.value())
    );
    info!("Collectors:\n{}", frontier.report());

    let consumer = {
        let frontier = Arc::clone(&frontier);
        tokio::task::spawn_blocking(move || consume(&frontier))
    };
    let served = consumer.await.context("Consumer task panicked")?;

    for (priority, count) in served.iter().rev() {
        info!("{:>8}: {count} URLs served", Priority13::lower_priority(*priority).name());
    }
    info!(
        "Served {} URLs in {:?}, {} loads from external storage",
        served.values().sum::<usize>(),
        started.elapsed(),
        loader.load_count()
    );

    Ok(())
}
