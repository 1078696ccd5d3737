pub mod aggregator;
pub mod cache;
pub mod config;
pub mod documents;
pub mod handlers;
pub mod html;
pub mod middleware;
pub mod observability;
pub mod retry;
pub mod server;
pub mod source;

pub use aggregator::{AggregateError, Aggregator};
pub use cache::{CacheStatus, Snapshot, SnapshotCache};
pub use config::{AggregationConfig, AppConfig, CacheConfig, ServerConfig, UpstreamConfig};
pub use documents::{DocumentFetcher, DocumentPage};
pub use observability::init_tracing;
pub use retry::RetryPolicy;
pub use server::{AppState, FedregServer, ServerBuilder, build_app, build_app_with_source, router};
pub use source::{DocumentQuery, FederalRegisterClient, FetchError, RegisterSource};
