//! Textual abstract of collector state for operational reports

use std::fmt;
use std::sync::Arc;

use super::collector::UrlCollector;

/// Renders one line per collector: name, priority, sizes and collected count
pub struct CollectorsFormatter<'a> {
    collectors: &'a [Arc<dyn UrlCollector>],
}

impl<'a> CollectorsFormatter<'a> {
    #[must_use]
    pub fn new(collectors: &'a [Arc<dyn UrlCollector>]) -> Self {
        Self { collectors }
    }

    /// One-line summary, e.g. `3 collectors, 120 urls (4500 estimated)`
    #[must_use]
    pub fn abstract_line(&self) -> String {
        let size: usize = self.collectors.iter().map(|c| c.size()).sum();
        let estimated: usize = self.collectors.iter().map(|c| c.estimated_size()).sum();
        format!(
            "{} collectors, {size} urls ({estimated} estimated)",
            self.collectors.len()
        )
    }
}

impl fmt::Display for CollectorsFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.abstract_line())?;
        writeln!(
            f,
            "{:<24} {:>8} {:>10} {:>12} {:>10}",
            "name", "priority", "size", "estimated", "collected"
        )?;
        for collector in self.collectors {
            writeln!(
                f,
                "{:<24} {:>8} {:>10} {:>12} {:>10}",
                collector.name(),
                collector.priority(),
                collector.size(),
                collector.estimated_size(),
                collector.counters().collected()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::CacheCollector;
    use crate::pool::PriorityCache;
    use crate::urls::Hyperlink;

    #[test]
    fn test_report_lists_collectors() {
        let cache = Arc::new(PriorityCache::concurrent("normal", 0, 3));
        cache
            .reentrant_queue()
            .offer(Hyperlink::parse("https://example.com/").unwrap());
        let collectors: Vec<Arc<dyn UrlCollector>> = vec![Arc::new(CacheCollector::new(cache))];

        let report = CollectorsFormatter::new(&collectors).to_string();
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], "1 collectors, 1 urls (1 estimated)");
        assert!(lines[1].starts_with("name"));
        assert!(lines[2].starts_with("normal"));
        assert_eq!(lines.len(), 3);
    }
}
