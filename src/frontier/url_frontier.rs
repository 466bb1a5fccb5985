//! The frontier facade
//!
//! `UrlFrontier` owns the pool, the fair collector and the loading iterable.
//! Producers submit through `add*`; fetch workers drain through `iterable()`.
//! Every ordered cache of the pool is registered as a collector on creation;
//! more collectors can be registered and removed at runtime.

use log::{info, warn};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{FrontierError, FrontierResult};
use super::loading_iterable::{Iter, LoadingIterable};
use crate::collect::{
    CacheCollector, CollectorsFormatter, DelayCacheCollector, FairMultiSourceCollector,
    UrlCollector,
};
use crate::config::FrontierConfig;
use crate::pool::UrlPool;
use crate::queues::ExternalUrlLoader;
use crate::urls::{DelayUrl, Hyperlink};
use crate::utils::ESTIMATED_ORDER_FAILURE;

pub struct UrlFrontier {
    config: FrontierConfig,
    pool: Arc<UrlPool>,
    realtime_collector: Arc<CacheCollector>,
    delay_collector: Arc<DelayCacheCollector>,
    fair: Arc<FairMultiSourceCollector>,
    iterable: LoadingIterable,
}

impl UrlFrontier {
    /// Frontier over in-memory caches
    #[must_use]
    pub fn concurrent(config: FrontierConfig) -> Self {
        Self::with_pool(UrlPool::concurrent(config.clone()), config)
    }

    /// Frontier whose caches overflow to, and page in from, `loader`
    #[must_use]
    pub fn loading(loader: Arc<dyn ExternalUrlLoader>, config: FrontierConfig) -> Self {
        Self::with_pool(UrlPool::loading(loader, config.clone()), config)
    }

    /// Build on an existing pool
    #[must_use]
    pub fn with_pool(pool: UrlPool, config: FrontierConfig) -> Self {
        pool.initialize();
        let pool = Arc::new(pool);

        let fair = Arc::new(FairMultiSourceCollector::new(
            config.highest_priority_threshold(),
            config.shuffle_seed(),
        ));
        fair.add_all(
            pool.ordered_caches()
                .into_iter()
                .map(|cache| Arc::new(CacheCollector::new(cache)) as Arc<dyn UrlCollector>),
        );

        let realtime_collector = Arc::new(CacheCollector::new(Arc::clone(pool.real_time_cache())));
        let delay_collector = Arc::new(DelayCacheCollector::new(
            Arc::clone(pool.delay_cache()),
            config.delay_collector_priority(),
        ));
        let iterable = LoadingIterable::new(
            Arc::clone(&realtime_collector) as Arc<dyn UrlCollector>,
            Arc::clone(&delay_collector) as Arc<dyn UrlCollector>,
            Arc::clone(&fair),
            config.low_water_mark(),
        );

        info!(
            "URL frontier {} ready for job {} with {} collectors",
            pool.id(),
            config.job_id(),
            fair.len()
        );

        Self {
            config,
            pool,
            realtime_collector,
            delay_collector,
            fair,
            iterable,
        }
    }

    pub fn config(&self) -> &FrontierConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<UrlPool> {
        &self.pool
    }

    pub fn fair_collector(&self) -> &Arc<FairMultiSourceCollector> {
        &self.fair
    }

    pub fn realtime_collector(&self) -> &Arc<CacheCollector> {
        &self.realtime_collector
    }

    pub fn delay_collector(&self) -> &Arc<DelayCacheCollector> {
        &self.delay_collector
    }

    // ---- submission ----

    /// Route `url` into the pool by its priority
    pub fn add(&self, url: Hyperlink) -> bool {
        self.pool.add(url)
    }

    pub fn add_all<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = Hyperlink>,
    {
        self.pool.add_all(urls)
    }

    /// Submit into the real-time cache, served ahead of every ordered cache
    pub fn add_realtime(&self, url: Hyperlink) -> bool {
        self.pool.real_time_cache().reentrant_queue().offer(url)
    }

    /// Schedule a retry of `url` once `delay` has elapsed
    pub fn add_delayed(&self, url: Hyperlink, delay: Duration) {
        self.pool.delay_cache().offer(DelayUrl::new(url, delay));
    }

    /// Inject straight into the buffer, ahead of everything
    pub fn add_first(&self, url: Hyperlink) -> bool {
        self.iterable.add_first(url)
    }

    /// Inject straight into the buffer, behind everything
    pub fn add_last(&self, url: Hyperlink) -> bool {
        self.iterable.add_last(url)
    }

    // ---- consumption ----

    pub fn iterable(&self) -> &LoadingIterable {
        &self.iterable
    }

    pub fn iter(&self) -> Iter<'_> {
        self.iterable.iter()
    }

    pub fn has_next(&self) -> bool {
        self.iterable.has_next()
    }

    pub fn next_url(&self) -> FrontierResult<Hyperlink> {
        self.iterable.next_url()
    }

    // ---- collectors ----

    /// Registered collectors, the real-time and delay collectors excluded
    pub fn collectors(&self) -> Vec<Arc<dyn UrlCollector>> {
        self.fair.collectors()
    }

    pub fn find_collector(&self, name: &str) -> Option<Arc<dyn UrlCollector>> {
        self.fair.find(name)
    }

    pub fn add_collector(&self, collector: Arc<dyn UrlCollector>) {
        info!(
            "Collector added: {} | priority: {} size: {} estimated: {}",
            collector.name(),
            collector.priority(),
            collector.size(),
            collector.estimated_size()
        );
        self.fair.add(collector);
    }

    /// Create an unordered cache of the pool's kind and register a collector over it
    pub fn add_cache_collector(&self, name: &str, priority: i32) -> Arc<CacheCollector> {
        let cache = Arc::new(self.pool.new_cache(name, priority));
        self.pool.add_unordered_cache(Arc::clone(&cache));
        let collector = Arc::new(CacheCollector::new(cache));
        self.add_collector(Arc::clone(&collector) as Arc<dyn UrlCollector>);
        collector
    }

    /// Unregister by identity
    pub fn remove_collector(&self, collector: &Arc<dyn UrlCollector>) -> bool {
        !self
            .remove_collectors_where(|c| Arc::ptr_eq(c, collector))
            .is_empty()
    }

    pub fn remove_collectors_by_name(&self, name: &str) -> Vec<Arc<dyn UrlCollector>> {
        self.remove_collectors_where(|c| c.name() == name)
    }

    pub fn remove_collectors_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Vec<Arc<dyn UrlCollector>> {
        self.remove_collectors_where(|c| {
            let name = c.name();
            names.iter().any(|n| n.as_ref() == name)
        })
    }

    /// Unregister every collector whose name matches `pattern`
    pub fn remove_collectors_by_regex(
        &self,
        pattern: &str,
    ) -> FrontierResult<Vec<Arc<dyn UrlCollector>>> {
        let regex = Regex::new(pattern)?;
        Ok(self.remove_collectors_where(|c| regex.is_match(&c.name())))
    }

    pub fn remove_collectors_containing(&self, needle: &str) -> Vec<Arc<dyn UrlCollector>> {
        self.remove_collectors_where(|c| c.name().contains(needle))
    }

    fn remove_collectors_where<F>(&self, predicate: F) -> Vec<Arc<dyn UrlCollector>>
    where
        F: FnMut(&Arc<dyn UrlCollector>) -> bool,
    {
        let removed = self.fair.remove_if(predicate);
        for collector in &removed {
            if let Some(cache) = collector.backing_cache() {
                self.pool.remove_unordered_cache(cache);
            }
            info!(
                "Collector removed: {} | size: {} estimated: {}",
                collector.name(),
                collector.size(),
                collector.estimated_size()
            );
        }
        removed
    }

    // ---- introspection ----

    /// URLs held by the collectors, the real-time cache and the delay cache
    pub fn size(&self) -> usize {
        self.fair.size() + self.realtime_collector.size() + self.delay_collector.size()
    }

    pub fn estimated_size(&self) -> usize {
        self.fair.estimated_size()
            + self.realtime_collector.estimated_size()
            + self.delay_collector.size()
    }

    /// How many URLs are expected to be served before a new submission at `priority`
    ///
    /// Best effort: returns `ESTIMATED_ORDER_FAILURE` (-2) and logs a warning
    /// when the estimate cannot be computed.
    pub fn estimated_order(&self, priority: i32) -> i64 {
        self.try_estimated_order(priority).unwrap_or_else(|e| {
            warn!("Failed to estimate order for priority {priority}: {e}");
            ESTIMATED_ORDER_FAILURE
        })
    }

    fn try_estimated_order(&self, priority: i32) -> FrontierResult<i64> {
        let overflow = || FrontierError::Estimation("count overflow".to_string());
        let collectors = self.fair.collectors();

        let mut ahead = self
            .iterable
            .len()
            .checked_add(self.realtime_collector.estimated_size())
            .ok_or_else(overflow)?;
        let mut peers = 0usize;
        let mut peer_size = 0usize;
        for collector in &collectors {
            let size = collector.estimated_size();
            if collector.priority() > priority {
                ahead = ahead.checked_add(size).ok_or_else(overflow)?;
            } else if collector.priority() == priority {
                peers += 1;
                peer_size = peer_size.checked_add(size).ok_or_else(overflow)?;
            }
        }

        let window = Duration::try_from_secs_f64(ahead as f64 / self.config.average_fetch_rate())
            .map_err(|e| FrontierError::Estimation(e.to_string()))?;
        let retries = self.pool.delay_cache().count_ready_within(window);
        let share = peer_size.checked_div(peers).unwrap_or(0);

        let order = ahead
            .checked_add(retries)
            .and_then(|n| n.checked_add(share))
            .ok_or_else(overflow)?;
        i64::try_from(order).map_err(|e| FrontierError::Estimation(e.to_string()))
    }

    /// Textual abstract of every collector for dashboards
    pub fn report(&self) -> String {
        let mut collectors: Vec<Arc<dyn UrlCollector>> = vec![
            Arc::clone(&self.realtime_collector) as Arc<dyn UrlCollector>,
            Arc::clone(&self.delay_collector) as Arc<dyn UrlCollector>,
        ];
        collectors.extend(self.fair.collectors());
        CollectorsFormatter::new(&collectors).to_string()
    }

    // ---- maintenance ----

    /// Purge URLs past their deadline everywhere in the pool
    pub fn remove_deceased(&self) -> usize {
        self.pool.remove_deceased()
    }

    /// Reset all in-memory scheduling state; external storage is untouched
    pub fn clear(&self) {
        self.iterable.clear();
        self.realtime_collector.clear();
        self.delay_collector.clear();
        self.fair.clear();
        info!("URL frontier {} cleared", self.pool.id());
    }
}

impl<'a> IntoIterator for &'a UrlFrontier {
    type Item = Hyperlink;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
