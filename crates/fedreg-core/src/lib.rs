pub mod error;
pub mod heuristics;
pub mod matcher;
pub mod model;
pub mod time;

pub use error::{CoreError, ErrorCategory, Result};
pub use heuristics::{estimate_document_size, size_mb, truncate_abstract};
pub use matcher::{cfr_title_for, cfr_title_name, matches};
pub use model::{
    AgencyRecord, AgencyStats, DocumentAgency, DocumentRecord, DocumentSearchResponse,
    RawDocument, RecentDocument,
};
pub use crate::time::{PublicationDate, is_within_24_hours, now_utc, parse_publication_date};
