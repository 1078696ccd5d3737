use std::sync::Arc;

use fedreg_core::time::{NEW_DOCUMENT_WINDOW, date_filter};
use fedreg_core::{DocumentRecord, RecentDocument};
use time::{Duration, OffsetDateTime};

use crate::config::AppConfig;
use crate::retry::RetryPolicy;
use crate::source::{DocumentQuery, RegisterSource};

/// Documents fetched for one agency plus the upstream's total match count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<DocumentRecord>,
    pub total_count: u64,
}

impl DocumentPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Fetches and normalizes document pages.
///
/// Failures never escape: they are logged and turned into empty results so
/// one bad agency cannot sink a whole aggregation.
#[derive(Clone)]
pub struct DocumentFetcher {
    source: Arc<dyn RegisterSource>,
    lookback: Duration,
    retry: RetryPolicy,
}

impl DocumentFetcher {
    pub fn new(source: Arc<dyn RegisterSource>, lookback_days: u32) -> Self {
        Self {
            source,
            lookback: Duration::days(i64::from(lookback_days)),
            retry: RetryPolicy::disabled(),
        }
    }

    pub fn from_config(source: Arc<dyn RegisterSource>, cfg: &AppConfig) -> Self {
        Self::new(source, cfg.aggregation.lookback_days).with_retry(RetryPolicy::new(
            cfg.upstream.max_retries,
            cfg.upstream.retry_backoff_ms,
        ))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &Arc<dyn RegisterSource> {
        &self.source
    }

    /// Newest documents for one agency published within the lookback window.
    pub async fn fetch_agency_documents(
        &self,
        slug: &str,
        name: &str,
        limit: u32,
        now: OffsetDateTime,
    ) -> DocumentPage {
        let query = DocumentQuery::for_agency(slug, date_filter(now, self.lookback), limit);

        match self
            .retry
            .execute(|| self.source.search_documents(&query))
            .await
        {
            Ok(response) => DocumentPage {
                documents: response
                    .results
                    .iter()
                    .map(|raw| DocumentRecord::from_raw(raw, now))
                    .collect(),
                total_count: response.count,
            },
            Err(e) => {
                tracing::warn!(agency.slug = slug, agency.name = name, error = %e, "Failed to fetch agency documents");
                DocumentPage::empty()
            }
        }
    }

    /// Documents from every agency published since yesterday, newest first.
    pub async fn fetch_recent_documents(
        &self,
        page_size: u32,
        now: OffsetDateTime,
    ) -> Vec<RecentDocument> {
        let query = DocumentQuery::all_agencies(date_filter(now, NEW_DOCUMENT_WINDOW), page_size);

        match self.source.search_documents(&query).await {
            Ok(response) => response.results.iter().map(RecentDocument::from).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch recent documents");
                Vec::new()
            }
        }
    }
}
