/// Run configuration for a single ingestion pass.
pub mod config;

/// Parse-or-pass-through date normalization.
pub mod dates;

/// `filings` rows, mapped from the search API's filing objects.
pub mod filings;

/// `holdings` rows, flattened out of each filing's nested holdings array.
pub mod holdings;

/// The pagination loop; drives a [`ingest::FilingSource`] into a [`ingest::FilingStore`].
pub mod ingest;

/// Lenient serde helpers for loosely typed JSON payloads.
pub(crate) mod de;

/// Filings search client for the [sec-api.io] Query API.
///
/// [sec-api.io]: https://sec-api.io/docs/query-api
pub mod sec_api;

/// SQL statements and the reference schema.
pub mod sql;

/// PostgreSQL implementation of [`ingest::FilingStore`].
pub mod store;

pub(crate) mod tui;

pub use config::IngestConfig;
pub use ingest::{FilingSource, FilingStore, IngestReport, Ingestor};

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
    pub(crate) use tokio_postgres::Client as PgClient;
}

/// Errors raised by the spider; anything not covered here travels as [`anyhow::Error`].
#[derive(Debug, thiserror::Error)]
pub enum SpiderError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("search API returned HTTP {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Format the time elapsed since `time`, for log lines.
pub fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
