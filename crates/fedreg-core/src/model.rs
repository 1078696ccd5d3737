//! Agency and document types.
//!
//! Upstream payloads are deserialized leniently: the Federal Register API
//! returns `null` for many optional fields, which become empty strings here.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::heuristics::{estimate_document_size, size_mb, truncate_abstract};
use crate::time::is_within_24_hours;

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the upstream agency directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgencyRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub slug: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub short_name: String,
    #[serde(
        default,
        rename(deserialize = "agency_url"),
        deserialize_with = "nullable_string"
    )]
    pub url: String,
}

impl AgencyRecord {
    /// Short name when present, full name otherwise.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

/// Agency reference embedded in a document search result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentAgency {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
}

/// A document row as returned by the upstream search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub document_number: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub publication_date: String,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub pdf_url: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub html_url: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub agencies: Vec<DocumentAgency>,
}

impl RawDocument {
    fn title_or_default(&self) -> String {
        self.title.clone().unwrap_or_else(|| "Untitled".to_string())
    }

    fn type_or_default(&self) -> String {
        self.doc_type.clone().unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Paginated response of the upstream document search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentSearchResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

/// A normalized document with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: String,
    pub document_number: String,
    pub publication_date: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub size_kb: u32,
    pub pdf_url: String,
    pub html_url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub is_new: bool,
}

impl DocumentRecord {
    /// Normalize an upstream row, computing size and recency against `now`.
    pub fn from_raw(raw: &RawDocument, now: OffsetDateTime) -> Self {
        let doc_type = raw.type_or_default();
        Self {
            title: raw.title_or_default(),
            document_number: raw.document_number.clone(),
            publication_date: raw.publication_date.clone(),
            size_kb: estimate_document_size(&doc_type),
            doc_type,
            pdf_url: raw.pdf_url.clone(),
            html_url: raw.html_url.clone(),
            abstract_text: truncate_abstract(raw.abstract_text.as_deref()),
            is_new: is_within_24_hours(&raw.publication_date, now),
        }
    }
}

/// A document from the all-agencies listing of the last 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentDocument {
    pub title: String,
    pub document_number: String,
    pub publication_date: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub agency: String,
    pub size_kb: u32,
    pub pdf_url: String,
    pub html_url: String,
}

impl From<&RawDocument> for RecentDocument {
    fn from(raw: &RawDocument) -> Self {
        let doc_type = raw.type_or_default();
        let agency = raw
            .agencies
            .first()
            .map(|a| a.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        Self {
            title: raw.title_or_default(),
            document_number: raw.document_number.clone(),
            publication_date: raw.publication_date.clone(),
            size_kb: estimate_document_size(&doc_type),
            doc_type,
            agency,
            pdf_url: raw.pdf_url.clone(),
            html_url: raw.html_url.clone(),
        }
    }
}

/// Per-agency statistics derived from one directory entry and its documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyStats {
    pub display_name: String,
    /// Total reported by the upstream search, not the number of documents held.
    pub document_count: u64,
    pub recent_documents: Vec<DocumentRecord>,
    pub new_documents_count: usize,
    pub size_mb: f64,
    pub agency_id: Option<u64>,
    pub slug: String,
    pub url: String,
    pub full_name: String,
}

impl AgencyStats {
    pub fn new(agency: &AgencyRecord, documents: Vec<DocumentRecord>, total_count: u64) -> Self {
        let total_kb: u64 = documents.iter().map(|d| u64::from(d.size_kb)).sum();
        let new_documents_count = documents.iter().filter(|d| d.is_new).count();
        Self {
            display_name: agency.display_name().to_string(),
            document_count: total_count,
            new_documents_count,
            size_mb: size_mb(total_kb),
            recent_documents: documents,
            agency_id: agency.id,
            slug: agency.slug.clone(),
            url: agency.url.clone(),
            full_name: agency.name.clone(),
        }
    }
}
