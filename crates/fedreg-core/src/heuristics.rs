//! Size estimates and text trimming for Federal Register documents.
//!
//! Sizes are a lookup by document type, not real byte counts.

/// Size in KB for document types not in the table.
pub const DEFAULT_DOCUMENT_SIZE_KB: u32 = 50;

/// Maximum number of characters kept from a document abstract.
pub const ABSTRACT_MAX_CHARS: usize = 200;

const DOCUMENT_SIZES_KB: [(&str, u32); 4] = [
    ("Rule", 150),
    ("Proposed Rule", 120),
    ("Notice", 80),
    ("Presidential Document", 100),
];

/// Estimated size in KB for a document type.
pub fn estimate_document_size(doc_type: &str) -> u32 {
    DOCUMENT_SIZES_KB
        .iter()
        .find(|(known, _)| *known == doc_type)
        .map(|(_, size)| *size)
        .unwrap_or(DEFAULT_DOCUMENT_SIZE_KB)
}

/// Total KB expressed in MB, rounded to 4 decimal places.
pub fn size_mb(total_kb: u64) -> f64 {
    let mb = total_kb as f64 / 1024.0;
    (mb * 10_000.0).round() / 10_000.0
}

/// First 200 characters of an abstract followed by `...`.
///
/// The ellipsis is appended whenever an abstract is present, even a short
/// one; a missing or empty abstract becomes an empty string.
pub fn truncate_abstract(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.is_empty() => {
            let mut truncated: String = text.chars().take(ABSTRACT_MAX_CHARS).collect();
            truncated.push_str("...");
            truncated
        }
        _ => String::new(),
    }
}
