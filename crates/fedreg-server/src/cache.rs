//! Snapshot cache for aggregated agency statistics.
//!
//! One slot holds the current [`Snapshot`]. Reads are lock-free through
//! `ArcSwapOption`; populating and refreshing take a mutex so concurrent
//! misses run a single aggregation whose result every waiter shares.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use fedreg_core::AgencyStats;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::aggregator::{AggregateError, Aggregator};

/// Aggregated statistics for every CFR agency with recent documents.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Keyed by agency slug.
    pub agencies: BTreeMap<String, AgencyStats>,
    pub last_updated: OffsetDateTime,
    refreshed_at: Instant,
}

impl Snapshot {
    pub fn new(agencies: BTreeMap<String, AgencyStats>, last_updated: OffsetDateTime) -> Self {
        Self {
            agencies,
            last_updated,
            refreshed_at: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.agencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agencies.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.refreshed_at.elapsed()
    }

    pub fn agency_by_slug(&self, slug: &str) -> Option<&AgencyStats> {
        self.agencies.get(slug)
    }

    /// Agencies keyed by display name.
    ///
    /// When two agencies share a display name the one with the smallest
    /// slug wins.
    pub fn by_display_name(&self) -> BTreeMap<&str, &AgencyStats> {
        let mut out = BTreeMap::new();
        // slug order, so the first insert for a name is the smallest slug
        for stats in self.agencies.values() {
            out.entry(stats.display_name.as_str()).or_insert(stats);
        }
        out
    }

    /// Agencies sorted case-insensitively by display name, ties broken by slug.
    pub fn sorted_by_display_name(&self) -> Vec<&AgencyStats> {
        let mut sorted: Vec<&AgencyStats> = self.agencies.values().collect();
        sorted.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.slug.cmp(&b.slug))
        });
        sorted
    }

    /// First agency, in display-name order, whose display or full name
    /// contains `needle` case-insensitively.
    pub fn search_by_name(&self, needle: &str) -> Option<&AgencyStats> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.sorted_by_display_name().into_iter().find(|stats| {
            stats.display_name.to_lowercase().contains(&needle)
                || stats.full_name.to_lowercase().contains(&needle)
        })
    }

    pub fn total_documents(&self) -> u64 {
        self.agencies.values().map(|s| s.document_count).sum()
    }

    pub fn total_new_documents(&self) -> usize {
        self.agencies.values().map(|s| s.new_documents_count).sum()
    }

    pub fn total_size_mb(&self) -> f64 {
        self.agencies.values().map(|s| s.size_mb).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Empty,
    Populated,
    Stale,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Populated => write!(f, "populated"),
            Self::Stale => write!(f, "stale"),
        }
    }
}

pub struct SnapshotCache {
    slot: ArcSwapOption<Snapshot>,
    populate: Mutex<()>,
    ttl: Option<Duration>,
    aggregator: Aggregator,
}

impl SnapshotCache {
    /// `ttl = None` keeps a snapshot until it is explicitly refreshed.
    pub fn new(aggregator: Aggregator, ttl: Option<Duration>) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            populate: Mutex::new(()),
            ttl,
            aggregator,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Current snapshot, if any, without populating. May be stale.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot.load_full()
    }

    pub fn status(&self) -> CacheStatus {
        match self.current() {
            None => CacheStatus::Empty,
            Some(snapshot) if self.is_stale(&snapshot) => CacheStatus::Stale,
            Some(_) => CacheStatus::Populated,
        }
    }

    /// Return the cached snapshot, aggregating first when the cache is
    /// empty or expired.
    pub async fn get_or_populate(&self) -> Result<Arc<Snapshot>, AggregateError> {
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let _guard = self.populate.lock().await;
        // Another caller may have populated while we waited
        if let Some(snapshot) = self.fresh() {
            tracing::debug!("Snapshot populated by concurrent caller");
            return Ok(snapshot);
        }
        self.populate_locked().await
    }

    /// Aggregate and replace the snapshot regardless of its age.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, AggregateError> {
        let _guard = self.populate.lock().await;
        self.populate_locked().await
    }

    pub fn invalidate(&self) {
        self.slot.store(None);
        tracing::info!("Snapshot cache invalidated");
    }

    fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.current()
            .filter(|snapshot| !self.is_stale(snapshot))
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        self.ttl.is_some_and(|ttl| snapshot.age() > ttl)
    }

    async fn populate_locked(&self) -> Result<Arc<Snapshot>, AggregateError> {
        let started = Instant::now();
        let snapshot = match self.aggregator.aggregate().await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::error!(error = %e, "Aggregation failed, keeping previous snapshot");
                return Err(e);
            }
        };
        self.slot.store(Some(snapshot.clone()));
        tracing::info!(
            agencies = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot cache populated"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentFetcher;
    use crate::source::testing::StubSource;
    use fedreg_core::AgencyRecord;
    use std::sync::atomic::Ordering;
    use time::macros::datetime;

    fn stub() -> StubSource {
        StubSource {
            agencies: vec![
                StubSource::agency("energy", "Department of Energy", "DOE"),
                StubSource::agency("labor", "Department of Labor", ""),
            ],
            ..Default::default()
        }
        .with_page("energy", 3, vec![StubSource::doc("Rule", "2020-01-01")])
        .with_page("labor", 5, vec![StubSource::doc("Notice", "2020-01-01")])
    }

    fn cache(source: Arc<StubSource>, ttl: Option<Duration>) -> SnapshotCache {
        let aggregator = Aggregator::new(DocumentFetcher::new(source, 30), 10, 20);
        SnapshotCache::new(aggregator, ttl)
    }

    fn stats(slug: &str, display_name: &str, full_name: &str) -> AgencyStats {
        let agency = AgencyRecord {
            slug: slug.into(),
            name: full_name.into(),
            short_name: display_name.into(),
            ..Default::default()
        };
        AgencyStats::new(&agency, vec![], 1)
    }

    fn snapshot_of(items: Vec<AgencyStats>) -> Snapshot {
        let agencies = items.into_iter().map(|s| (s.slug.clone(), s)).collect();
        Snapshot::new(agencies, datetime!(2025-11-05 12:00:00 UTC))
    }

    #[tokio::test]
    async fn populates_once_then_serves_cached() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), None);
        assert_eq!(cache.status(), CacheStatus::Empty);
        assert!(cache.current().is_none());

        let first = cache.get_or_populate().await.unwrap();
        let second = cache.get_or_populate().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.directory_calls(), 1);
        assert_eq!(cache.status(), CacheStatus::Populated);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_aggregate_once() {
        let source = Arc::new(StubSource {
            delay: Duration::from_millis(50),
            ..stub()
        });
        let cache = Arc::new(cache(source.clone(), None));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_or_populate().await }));
        }
        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(source.directory_calls(), 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
    }

    #[tokio::test]
    async fn refresh_always_aggregates() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), None);

        let first = cache.get_or_populate().await.unwrap();
        let refreshed = cache.refresh().await.unwrap();

        assert_eq!(source.directory_calls(), 2);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert!(Arc::ptr_eq(&refreshed, &cache.current().unwrap()));
    }

    #[tokio::test]
    async fn expired_snapshot_is_repopulated() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), Some(Duration::from_millis(30)));

        cache.get_or_populate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.status(), CacheStatus::Stale);

        cache.get_or_populate().await.unwrap();
        assert_eq!(source.directory_calls(), 2);
        assert_eq!(cache.status(), CacheStatus::Populated);
    }

    #[tokio::test]
    async fn no_ttl_never_goes_stale() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), None);

        cache.get_or_populate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.status(), CacheStatus::Populated);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), None);

        let before = cache.get_or_populate().await.unwrap();
        source.directory_down.store(true, Ordering::SeqCst);

        assert!(cache.refresh().await.is_err());
        assert!(Arc::ptr_eq(&before, &cache.current().unwrap()));
    }

    #[tokio::test]
    async fn failed_first_population_stays_empty() {
        let source = Arc::new(stub());
        source.directory_down.store(true, Ordering::SeqCst);
        let cache = cache(source, None);

        assert!(cache.get_or_populate().await.is_err());
        assert_eq!(cache.status(), CacheStatus::Empty);
    }

    #[tokio::test]
    async fn invalidate_empties_the_slot() {
        let source = Arc::new(stub());
        let cache = cache(source.clone(), None);

        cache.get_or_populate().await.unwrap();
        cache.invalidate();
        assert_eq!(cache.status(), CacheStatus::Empty);

        cache.get_or_populate().await.unwrap();
        assert_eq!(source.directory_calls(), 2);
    }

    #[test]
    fn display_name_collision_resolves_to_smallest_slug() {
        let snapshot = snapshot_of(vec![
            stats("uscg-b", "USCG", "Coast Guard B"),
            stats("uscg-a", "USCG", "Coast Guard A"),
            stats("energy", "DOE", "Department of Energy"),
        ]);

        let by_name = snapshot.by_display_name();
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name["USCG"].slug, "uscg-a");
        assert_eq!(by_name["DOE"].slug, "energy");
    }

    #[test]
    fn sorted_by_display_name_ignores_case() {
        let snapshot = snapshot_of(vec![
            stats("b", "bravo", "B"),
            stats("a", "Alpha", "A"),
            stats("c", "Charlie", "C"),
        ]);
        let names: Vec<_> = snapshot
            .sorted_by_display_name()
            .iter()
            .map(|s| s.display_name.as_str())
            .collect();
        assert_eq!(names, ["Alpha", "bravo", "Charlie"]);
    }

    #[test]
    fn search_by_name_matches_display_or_full_name() {
        let snapshot = snapshot_of(vec![
            stats("energy", "DOE", "Department of Energy"),
            stats("epa", "EPA", "Environmental Protection Agency"),
        ]);

        assert_eq!(snapshot.search_by_name("energy").unwrap().slug, "energy");
        assert_eq!(snapshot.search_by_name("epa").unwrap().slug, "epa");
        // "department of energy" and "environmental ... agency" both contain "en"
        assert_eq!(snapshot.search_by_name("EN").unwrap().slug, "energy");
        assert!(snapshot.search_by_name("bakery").is_none());
        assert!(snapshot.search_by_name("  ").is_none());
    }
}
