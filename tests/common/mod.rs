//! Test utilities and helper functions for the frontier test suite

use crawl_frontier::queues::{
    ExternalUrlLoader, LoadCooldown, LoaderError, LoaderResult, PartitionKey,
};
use crawl_frontier::{FrontierConfig, Hyperlink, Priority13, UrlFrontier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Installs a test logger once; safe to call from every test
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses `https://<host>/<path>` at the given priority
#[allow(dead_code)]
pub fn link(host: &str, path: &str, priority: Priority13) -> Hyperlink {
    Hyperlink::parse(&format!("https://{host}/{path}"))
        .unwrap()
        .with_priority(priority)
}

/// Validated config with a fixed shuffle seed
#[allow(dead_code)]
pub fn test_config(job_id: &str) -> FrontierConfig {
    FrontierConfig::builder()
        .job_id(job_id)
        .shuffle_seed(2024)
        .build()
        .unwrap()
}

/// In-memory frontier with a fixed shuffle seed
#[allow(dead_code)]
pub fn test_frontier() -> UrlFrontier {
    init_logging();
    UrlFrontier::concurrent(test_config("test"))
}

/// Drain the frontier and return the specs in serving order
#[allow(dead_code)]
pub fn drain_specs(frontier: &UrlFrontier) -> Vec<String> {
    frontier.iter().map(|u| u.spec().to_string()).collect()
}

/// A loader whose storage is always unreachable
#[allow(dead_code)]
pub struct FailingLoader {
    cooldown: LoadCooldown,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FailingLoader {
    pub fn new() -> Self {
        Self {
            cooldown: LoadCooldown::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    fn fail<T>(&self) -> LoaderResult<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(LoaderError::Unavailable("connection refused".to_string()))
    }
}

impl ExternalUrlLoader for FailingLoader {
    fn cooldown(&self) -> &LoadCooldown {
        &self.cooldown
    }

    fn save(&self, _url: &Hyperlink, _key: &PartitionKey) -> LoaderResult<()> {
        self.fail()
    }

    fn count_remaining(&self, _key: &PartitionKey) -> LoaderResult<usize> {
        self.fail()
    }

    fn load_to(
        &self,
        _sink: &mut Vec<Hyperlink>,
        _size: usize,
        _key: &PartitionKey,
    ) -> LoaderResult<usize> {
        self.fail()
    }
}
