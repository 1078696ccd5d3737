//! Server-rendered HTML pages.

use std::fmt::Write as _;

use fedreg_core::{AgencyStats, DocumentRecord, RecentDocument};

use crate::cache::Snapshot;

/// Documents shown per agency in the expandable index row.
pub const INDEX_DOCUMENTS_PER_AGENCY: usize = 10;

const RECENT_TITLE_CHARS: usize = 100;

const STYLE: &str = r#"
    body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
    .container { max-width: 1200px; margin: 0 auto; padding: 24px; }
    table { width: 100%; border-collapse: collapse; background: #fff; }
    th, td { padding: 8px 10px; border-bottom: 1px solid #e3e5e8; text-align: left; vertical-align: top; }
    th { background: #1f3b5c; color: #fff; }
    .metadata { background: #fff; padding: 12px 16px; margin-bottom: 16px; border-left: 4px solid #1f3b5c; }
    .button { display: inline-block; margin: 8px 8px 0 0; padding: 6px 12px; background: #1f3b5c; color: #fff; text-decoration: none; border-radius: 3px; }
    .button.alert { background: #b3261e; }
    .new-badge { background: #b3261e; color: #fff; padding: 1px 6px; border-radius: 8px; font-size: 0.8em; }
    .agency-row { cursor: pointer; }
    .agency-row:hover { background: #eef2f7; }
    .documents-container { padding: 8px 16px; background: #fafbfc; }
    .document-item { padding: 6px 0; border-bottom: 1px dashed #ddd; }
    .doc-meta { font-size: 0.85em; color: #555; }
    .show-more, .footer { font-size: 0.9em; color: #666; }
"#;

const TOGGLE_SCRIPT: &str = r#"
    function toggleDocuments(id) {
        var row = document.getElementById(id);
        if (row) { row.style.display = row.style.display === 'none' ? 'table-row' : 'none'; }
    }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduce a slug to characters safe in both an element id and a quoted
/// JavaScript string.
fn element_id(slug: &str) -> String {
    slug.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn link(url: &str, label: &str, class: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    format!(
        r#"<a href="{}" target="_blank" class="{class}">{label}</a>"#,
        escape(url)
    )
}

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>{STYLE}</style>{head_extra}
</head>
<body>
<div class="container">
{body}
</div>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn document_item(doc: &DocumentRecord) -> String {
    let indicator = if doc.is_new { "🔴 " } else { "" };
    format!(
        r#"<div class="document-item">
    <div class="doc-title">{indicator}{title}</div>
    <div class="doc-meta"><span>{doc_type}</span> | <span>{published}</span> | <span>{size} KB</span> | {pdf} {html}</div>
</div>"#,
        title = escape(&doc.title),
        doc_type = escape(&doc.doc_type),
        published = escape(&doc.publication_date),
        size = doc.size_kb,
        pdf = link(&doc.pdf_url, "PDF", "doc-link"),
        html = link(&doc.html_url, "HTML", "doc-link"),
    )
}

fn agency_rows(stats: &AgencyStats) -> String {
    let name = escape(&stats.display_name);
    let agency_cell = if stats.url.is_empty() {
        name
    } else {
        format!(
            r#"<a href="{}" target="_blank">{name}</a>"#,
            escape(&stats.url)
        )
    };
    let badge = if stats.new_documents_count > 0 {
        format!(
            r#" <span class="new-badge">{} NEW</span>"#,
            stats.new_documents_count
        )
    } else {
        String::new()
    };
    let full_name = if stats.full_name != stats.display_name {
        escape(&stats.full_name)
    } else {
        String::new()
    };

    let documents: String = stats
        .recent_documents
        .iter()
        .take(INDEX_DOCUMENTS_PER_AGENCY)
        .map(document_item)
        .collect();
    let documents = if documents.is_empty() {
        "<p>No recent documents</p>".to_string()
    } else {
        documents
    };
    let show_more = if stats.recent_documents.len() > INDEX_DOCUMENTS_PER_AGENCY {
        format!(
            r#"<p class="show-more">Showing {INDEX_DOCUMENTS_PER_AGENCY} of {} recent documents</p>"#,
            stats.recent_documents.len()
        )
    } else {
        String::new()
    };
    let row_id = format!("docs-{}", element_id(&stats.slug));

    format!(
        r#"<tr class="agency-row" onclick="toggleDocuments('{row_id}')">
    <td>{agency_cell}{badge}</td>
    <td>{full_name}</td>
    <td style="text-align: right;">{count}</td>
    <td style="text-align: right;">{size:.2}</td>
    <td style="text-align: center;">&#9660;</td>
</tr>
<tr id="{row_id}" class="documents-row" style="display: none;">
    <td colspan="5"><div class="documents-container">
        <h4>Recent Documents</h4>
        {documents}
        {show_more}
    </div></td>
</tr>
"#,
        count = group_thousands(stats.document_count),
        size = stats.size_mb,
    )
}

/// Index page: summary block plus one expandable row per agency.
pub fn render_index(snapshot: &Snapshot, last_updated: &str) -> String {
    let rows: String = snapshot
        .sorted_by_display_name()
        .into_iter()
        .map(agency_rows)
        .collect();

    let body = format!(
        r#"<h1>Federal Regulations Agency Tracker</h1>
<div class="metadata">
    <strong>Last Updated:</strong> {last_updated}<br>
    <strong>Total Agencies:</strong> {agencies}<br>
    <strong>Total Documents:</strong> {documents}<br>
    <strong>New in 24hrs:</strong> <span class="new-badge">{new}</span><br>
    <strong>Estimated Total Size:</strong> {size:.2} MB<br>
    <a href="/refresh" class="button">Refresh Data</a>
    <a href="/recent" class="button alert">View All New (24hrs)</a>
    <a href="/api/agency-stats" class="button">JSON API</a>
</div>
<p>Click an agency row to see its recent Federal Register documents. Documents marked 🔴 were published in the last 24 hours.</p>
<table>
    <thead><tr>
        <th>Agency</th>
        <th>Full Name</th>
        <th style="text-align: right;">Total Docs</th>
        <th style="text-align: right;">Size (MB)</th>
        <th style="text-align: center;">Expand</th>
    </tr></thead>
    <tbody>
{rows}    </tbody>
</table>
<div class="footer">
    <p><strong>Data Source:</strong> <a href="https://www.federalregister.gov" target="_blank">Federal Register API</a>.
    <strong>Reference:</strong> <a href="https://www.ecfr.gov" target="_blank">Electronic Code of Federal Regulations</a>.</p>
</div>"#,
        last_updated = escape(last_updated),
        agencies = snapshot.len(),
        documents = group_thousands(snapshot.total_documents()),
        new = snapshot.total_new_documents(),
        size = snapshot.total_size_mb(),
    );

    let script = format!("\n    <script>{TOGGLE_SCRIPT}</script>");
    page("Federal Regulations Agency Tracker", &script, &body)
}

/// Table of every document published in the last 24 hours.
pub fn render_recent(documents: &[RecentDocument]) -> String {
    let mut rows = String::new();
    for doc in documents {
        let title: String = doc.title.chars().take(RECENT_TITLE_CHARS).collect();
        let _ = write!(
            rows,
            r#"<tr>
    <td><span class="new-badge">NEW</span> {title}...</td>
    <td>{agency}</td>
    <td>{doc_type}</td>
    <td>{published}</td>
    <td style="text-align: right;">{size} KB</td>
    <td>{pdf} {html}</td>
</tr>
"#,
            title = escape(&title),
            agency = escape(&doc.agency),
            doc_type = escape(&doc.doc_type),
            published = escape(&doc.publication_date),
            size = doc.size_kb,
            pdf = link(&doc.pdf_url, "PDF", ""),
            html = link(&doc.html_url, "HTML", ""),
        );
    }

    let body = format!(
        r#"<h1>Recent Federal Register Documents (Last 24 Hours)</h1>
<p>Found {count} new documents.</p>
<p><a href="/">&larr; Back to All Agencies</a></p>
<table>
    <thead><tr>
        <th>Title</th><th>Agency</th><th>Type</th><th>Published</th><th>Size</th><th>Links</th>
    </tr></thead>
    <tbody>
{rows}    </tbody>
</table>"#,
        count = documents.len(),
    );

    page("Recent Federal Register Documents (24 Hours)", "", &body)
}
