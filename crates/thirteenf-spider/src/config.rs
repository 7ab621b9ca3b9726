use crate::http::var;
use crate::SpiderError;
use rust_decimal::Decimal;

/// The quarter-end being collected.
pub const PERIOD_OF_REPORT: &str = "2024-03-31";

/// Filings requested per page, and therefore per committed batch.
pub const PAGE_SIZE: u64 = 200;

/// Query API endpoint; the API key travels as the `token` query parameter.
pub const SEC_API_URL: &str = "https://api.sec-api.io";

const DEFAULT_USER_AGENT: &str = concat!("thirteenf-spider/", env!("CARGO_PKG_VERSION"));

/// Largest value a `NUMERIC(20, 2)` column holds: 10^18 - 0.01.
pub fn max_holding_value() -> Decimal {
    Decimal::from_i128_with_scale(99_999_999_999_999_999_999, 2)
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub period_of_report: String,
    pub page_size: u64,

    /// Holding values above this are logged and clamped to it.
    pub max_holding_value: Decimal,

    pub api_url: String,
    pub api_key: String,
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            period_of_report: PERIOD_OF_REPORT.to_string(),
            page_size: PAGE_SIZE,
            max_holding_value: max_holding_value(),
            api_url: SEC_API_URL.to_string(),
            api_key: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl IngestConfig {
    /// Build the run configuration; period and page size are fixed, credentials come from the
    /// environment (`SEC_API_KEY`, optionally `USER_AGENT`).
    pub fn from_env() -> Result<Self, SpiderError> {
        let api_key = var("SEC_API_KEY").map_err(|_| SpiderError::MissingEnv("SEC_API_KEY"))?;
        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(config)
    }
}
