//! Federal Register API access.
//!
//! [`RegisterSource`] is the seam between the aggregation pipeline and the
//! network: the server uses [`FederalRegisterClient`], tests substitute an
//! in-process source or point the client at a mock server.

use std::time::Duration;

use async_trait::async_trait;
use fedreg_core::{AgencyRecord, DocumentSearchResponse};
use serde::de::DeserializeOwned;

use crate::config::UpstreamConfig;

/// Fields requested for per-agency document searches.
pub const DOCUMENT_FIELDS: &[&str] = &[
    "title",
    "document_number",
    "publication_date",
    "type",
    "pdf_url",
    "html_url",
    "abstract",
];

/// Fields requested for the all-agencies recent listing.
pub const RECENT_FIELDS: &[&str] = &[
    "title",
    "document_number",
    "publication_date",
    "type",
    "pdf_url",
    "html_url",
    "agencies",
];

/// Errors produced while talking to the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Transport failure: connect, timeout, reset.
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered with a non-success status code.
    #[error("HTTP error: status {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::Client(_) | Self::Decode(_) => false,
        }
    }
}

/// A document search against `/documents.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Restrict to one agency; `None` searches every agency.
    pub agency_slug: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub published_since: String,
    pub per_page: u32,
    pub fields: &'static [&'static str],
}

impl DocumentQuery {
    pub fn for_agency(slug: impl Into<String>, published_since: String, per_page: u32) -> Self {
        Self {
            agency_slug: Some(slug.into()),
            published_since,
            per_page,
            fields: DOCUMENT_FIELDS,
        }
    }

    pub fn all_agencies(published_since: String, per_page: u32) -> Self {
        Self {
            agency_slug: None,
            published_since,
            per_page,
            fields: RECENT_FIELDS,
        }
    }

    /// Query string pairs in the form the Federal Register API expects.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4 + self.fields.len());
        if let Some(slug) = &self.agency_slug {
            pairs.push(("conditions[agencies][]", slug.clone()));
        }
        pairs.push((
            "conditions[publication_date][gte]",
            self.published_since.clone(),
        ));
        pairs.push(("per_page", self.per_page.to_string()));
        pairs.push(("order", "newest".to_string()));
        for field in self.fields {
            pairs.push(("fields[]", (*field).to_string()));
        }
        pairs
    }
}

#[async_trait]
pub trait RegisterSource: Send + Sync {
    /// The full agency directory.
    async fn fetch_agencies(&self) -> Result<Vec<AgencyRecord>, FetchError>;

    /// One page of document search results.
    async fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<DocumentSearchResponse, FetchError>;
}

/// reqwest-backed [`RegisterSource`].
#[derive(Debug, Clone)]
pub struct FederalRegisterClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl FederalRegisterClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        Self::with_settings(
            &config.base_url,
            config.timeout(),
            &config.user_agent,
        )
    }

    pub fn with_settings(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        tracing::debug!(url, "Fetching from Federal Register");

        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RegisterSource for FederalRegisterClient {
    async fn fetch_agencies(&self) -> Result<Vec<AgencyRecord>, FetchError> {
        let url = format!("{}/agencies", self.base_url);
        self.get_json(&url, &[]).await
    }

    async fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<DocumentSearchResponse, FetchError> {
        let url = format!("{}/documents.json", self.base_url);
        self.get_json(&url, &query.to_pairs()).await
    }
}
