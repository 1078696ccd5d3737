use std::collections::BTreeMap;
use std::sync::Arc;

use fedreg_core::{AgencyRecord, AgencyStats, matcher, time::now_utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::Snapshot;
use crate::config::AppConfig;
use crate::documents::{DocumentFetcher, DocumentPage};
use crate::source::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The agency directory could not be fetched; nothing can be aggregated.
    #[error("Failed to fetch agency directory: {0}")]
    Directory(#[source] FetchError),
}

/// Builds a [`Snapshot`] from the agency directory and per-agency documents.
#[derive(Clone)]
pub struct Aggregator {
    fetcher: DocumentFetcher,
    max_concurrent: usize,
    documents_per_agency: u32,
}

impl Aggregator {
    pub fn new(fetcher: DocumentFetcher, max_concurrent: usize, documents_per_agency: u32) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            documents_per_agency,
        }
    }

    pub fn from_config(fetcher: DocumentFetcher, cfg: &AppConfig) -> Self {
        Self::new(
            fetcher,
            cfg.aggregation.max_concurrent,
            cfg.aggregation.documents_per_agency,
        )
    }

    /// Fetch every CFR agency's recent documents and build a snapshot.
    ///
    /// Agencies whose upstream total is zero are left out. The result does
    /// not depend on the order in which fetches complete.
    pub async fn aggregate(&self) -> Result<Snapshot, AggregateError> {
        let now = now_utc();
        let directory = self
            .fetcher
            .source()
            .fetch_agencies()
            .await
            .map_err(AggregateError::Directory)?;
        let directory_size = directory.len();

        let candidates: Vec<AgencyRecord> = directory
            .into_iter()
            .filter(|agency| matcher::matches(&agency.name))
            .filter(|agency| {
                if agency.slug.is_empty() {
                    tracing::warn!(agency.name = %agency.name, "Skipping agency without slug");
                    false
                } else {
                    true
                }
            })
            .collect();
        let matched = candidates.len();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for agency in candidates {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let limit = self.documents_per_agency;
            tasks.spawn(async move {
                let page = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        fetcher
                            .fetch_agency_documents(&agency.slug, &agency.name, limit, now)
                            .await
                    }
                    Err(_) => DocumentPage::empty(),
                };
                (agency, page)
            });
        }

        let mut agencies = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((agency, page)) => {
                    if page.total_count == 0 {
                        tracing::debug!(agency.slug = %agency.slug, "Agency has no recent documents");
                        continue;
                    }
                    let stats = AgencyStats::new(&agency, page.documents, page.total_count);
                    agencies.insert(agency.slug, stats);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Agency fetch task failed");
                }
            }
        }

        tracing::info!(
            directory = directory_size,
            matched,
            with_documents = agencies.len(),
            "Aggregation complete"
        );

        Ok(Snapshot::new(agencies, now))
    }
}
