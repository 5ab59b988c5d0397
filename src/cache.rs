use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::ReportTable;
use crate::sheet::{ReportSource, SheetError};

#[derive(Debug)]
struct Snapshot {
    table: ReportTable,
    fetched_at: Instant,
}

/// Reused until `ttl` old, then replaced wholesale.
#[derive(Debug)]
pub struct ReportCache {
    ttl: Duration,
    snapshot: Option<Snapshot>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: None,
        }
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snap| now.saturating_duration_since(snap.fetched_at) < self.ttl)
    }

    /// A failed fetch leaves the cache empty.
    pub async fn refresh<S>(&mut self, source: &S, now: Instant) -> Result<&ReportTable, SheetError>
    where
        S: ReportSource + ?Sized,
    {
        let fresh = self.is_fresh(now);
        let snap = match self.snapshot.take() {
            Some(snap) if fresh => snap,
            _ => {
                let table = source.fetch().await?;
                debug!(source = %source.describe(), rows = table.len(), "report snapshot replaced");
                Snapshot {
                    table,
                    fetched_at: now,
                }
            }
        };

        Ok(&self.snapshot.insert(snap).table)
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ReportSource for CountingSource {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn fetch(&self) -> Result<ReportTable, SheetError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ReportTable::new(vec![format!("fetch-{n}")], Vec::new()))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ReportSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn fetch(&self) -> Result<ReportTable, SheetError> {
            Err(SheetError::MissingTimestampColumn)
        }
    }

    #[tokio::test]
    async fn reuses_snapshot_within_ttl() {
        let source = CountingSource {
            fetches: AtomicUsize::new(0),
        };
        let mut cache = ReportCache::new(Duration::from_secs(300));
        let start = Instant::now();

        cache.refresh(&source, start).await.unwrap();
        let table = cache
            .refresh(&source, start + Duration::from_secs(299))
            .await
            .unwrap();

        assert_eq!(table.columns, vec!["fetch-1"]);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replaces_snapshot_after_expiry() {
        let source = CountingSource {
            fetches: AtomicUsize::new(0),
        };
        let mut cache = ReportCache::new(Duration::from_secs(300));
        let start = Instant::now();

        cache.refresh(&source, start).await.unwrap();
        let table = cache
            .refresh(&source, start + Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(table.columns, vec!["fetch-2"]);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let source = CountingSource {
            fetches: AtomicUsize::new(0),
        };
        let mut cache = ReportCache::new(Duration::from_secs(300));
        let start = Instant::now();

        cache.refresh(&source, start).await.unwrap();
        cache.invalidate();
        assert!(!cache.is_fresh(start));
        cache.refresh(&source, start).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_empty() {
        let mut cache = ReportCache::new(Duration::from_secs(300));
        assert!(cache.refresh(&FailingSource, Instant::now()).await.is_err());
        assert!(!cache.is_fresh(Instant::now()));
    }
}
