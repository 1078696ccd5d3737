use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use fedreg_api::ApiError;
use fedreg_core::time::{format_rfc3339, now_utc};
use fedreg_core::{AgencyStats, CoreError, RecentDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::aggregator::AggregateError;
use crate::cache::{CacheStatus, Snapshot};
use crate::html;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct AgencyStatsResponse<'a> {
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub total_agencies: usize,
    pub agencies: BTreeMap<&'a str, &'a AgencyStats>,
}

impl<'a> AgencyStatsResponse<'a> {
    /// `total_agencies` counts the keys actually returned, so agencies that
    /// share a display name are counted once.
    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        let agencies = snapshot.by_display_name();
        Self {
            last_updated: snapshot.last_updated,
            total_agencies: agencies.len(),
            agencies,
        }
    }
}

#[derive(Serialize)]
pub struct RecentResponse {
    pub count: usize,
    pub documents: Vec<RecentDocument>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub total_agencies: usize,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub version: &'static str,
    pub commit: &'static str,
    pub cache_status: CacheStatus,
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

fn upstream_error(err: AggregateError) -> ApiError {
    ApiError::upstream(err.to_string())
}

async fn snapshot(state: &AppState) -> Result<Arc<Snapshot>, ApiError> {
    state.cache.get_or_populate().await.map_err(upstream_error)
}

fn index_html(snapshot: &Snapshot) -> Result<Html<String>, ApiError> {
    let last_updated = format_rfc3339(snapshot.last_updated)?;
    Ok(Html(html::render_index(snapshot, &last_updated)))
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let snapshot = snapshot(&state).await?;
    index_html(&snapshot)
}

/// `GET /recent`
pub async fn recent_page(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state
        .fetcher
        .fetch_recent_documents(state.config.aggregation.recent_page_size, now_utc())
        .await;
    Html(html::render_recent(&documents))
}

/// `GET /api/agency-stats`, or the index page with `?format=html`.
pub async fn agency_stats(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
) -> Result<Response, ApiError> {
    let snapshot = snapshot(&state).await?;
    if params
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("html"))
    {
        return Ok(index_html(&snapshot)?.into_response());
    }

    Ok(Json(AgencyStatsResponse::from_snapshot(&snapshot)).into_response())
}

/// `GET /api/recent`
pub async fn recent_api(State(state): State<AppState>) -> Json<RecentResponse> {
    let documents = state
        .fetcher
        .fetch_recent_documents(state.config.aggregation.recent_page_size, now_utc())
        .await;
    Json(RecentResponse {
        count: documents.len(),
        documents,
    })
}

/// `GET /api/agency/{slug}`
pub async fn agency_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AgencyStats>, ApiError> {
    let snapshot = snapshot(&state).await?;
    snapshot
        .agency_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| CoreError::agency_not_found(slug).into())
}

/// `GET /api/agencies/search?name=`
pub async fn search_agency(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AgencyStats>, ApiError> {
    let name = params.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("query parameter 'name' is required"));
    }
    let snapshot = snapshot(&state).await?;
    snapshot
        .search_by_name(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No agency matching '{}'", name.trim())))
}

/// `GET|POST /refresh`
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let snapshot = state.cache.refresh().await.map_err(upstream_error)?;
    Ok(Json(RefreshResponse {
        status: "success",
        last_updated: snapshot.last_updated,
        total_agencies: snapshot.len(),
    }))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "healthy",
        timestamp: now_utc(),
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT"),
        cache_status: state.cache.status(),
        cache_ttl_secs: state.cache.ttl().map(|ttl| ttl.as_secs()),
    })
}

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /api`
pub async fn api_index(State(state): State<AppState>) -> impl IntoResponse {
    let cache_mode = match state.cache.ttl() {
        Some(ttl) => format!("expires after {}s", ttl.as_secs()),
        None => "kept until refreshed".to_string(),
    };
    let body = json!({
        "service": "fedreg",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": cache_mode,
        "endpoints": {
            "GET /": "HTML overview of CFR agencies",
            "GET /recent": "HTML list of documents from the last 24 hours",
            "GET /api/agency-stats": "Agency statistics keyed by display name (?format=html for HTML)",
            "GET /api/recent": "Documents from the last 24 hours",
            "GET /api/agency/{slug}": "Statistics for one agency",
            "GET /api/agencies/search?name=": "First agency whose name contains the given text",
            "GET|POST /refresh": "Rebuild the cached statistics",
            "GET /api/health": "Service and cache status",
            "GET /healthz": "Liveness probe",
        }
    });
    (StatusCode::OK, Json(body))
}
