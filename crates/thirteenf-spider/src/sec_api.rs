use crate::config::IngestConfig;
use crate::filings::RawFiling;
use crate::http::HttpClient;
use crate::ingest::FilingSource;
use crate::{de, SpiderError};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

/// Query API client; one POST per page, no retries.
pub struct SecApi {
    http_client: HttpClient,
    url: String,
    api_key: String,
}

impl SecApi {
    pub fn new(config: &IngestConfig) -> Result<Self, SpiderError> {
        let http_client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            http_client,
            url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl FilingSource for SecApi {
    async fn search(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse> {
        trace!(
            "requesting filings from {} (from {}, size {})",
            self.url,
            query.from,
            query.size
        );
        let response = self
            .http_client
            .post(&self.url)
            .query(&[("token", &self.api_key)])
            .json(query)
            .send()
            .await
            .map_err(|err| {
                error!("failed to reach the search API, error({err})");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("search API returned HTTP {status}: {body}");
            return Err(SpiderError::Api { status, body }.into());
        }

        let page: SearchResponse = response
            .json()
            .await
            .map_err(|err| {
                error!("failed to parse search API response, error({err})");
                err
            })
            .context("search API response")?;
        debug!(
            "search API returned {} filings (total {})",
            page.filings.as_ref().map_or(0, Vec::len),
            page.total.value
        );

        Ok(page)
    }
}

// request
// ----------------------------------------------------------------------------

// {
//     "query": "formType:\"13F-HR\" AND NOT formType:\"13F-HR/A\" AND periodOfReport:\"2024-03-31\"",
//     "from": 0,
//     "size": 200,
//     "sort": [{ "filedAt": { "order": "desc" } }]
// }
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub from: u64,
    pub size: u64,
    pub sort: Vec<SortField>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SortField {
    #[serde(rename = "filedAt")]
    pub filed_at: SortOrder,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SortOrder {
    pub order: &'static str,
}

impl SearchQuery {
    /// Original 13F-HR filings (amendments excluded) for `period`, newest first.
    pub fn thirteen_f(period: &str, from: u64, size: u64) -> Self {
        Self {
            query: format!(
                "formType:\"13F-HR\" AND NOT formType:\"13F-HR/A\" AND periodOfReport:\"{period}\""
            ),
            from,
            size,
            sort: vec![SortField {
                filed_at: SortOrder { order: "desc" },
            }],
        }
    }
}

// response
// ----------------------------------------------------------------------------

// {
//     "total": { "value": 7412, "relation": "eq" },
//     "filings": [ { ... }, ... ]
// }
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    pub total: Total,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub filings: Option<Vec<RawFiling>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Total {
    pub value: u64,
    #[serde(default)]
    pub relation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_serializes_to_the_api_shape() {
        let query = SearchQuery::thirteen_f("2024-03-31", 400, 50);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "query": "formType:\"13F-HR\" AND NOT formType:\"13F-HR/A\" AND periodOfReport:\"2024-03-31\"",
                "from": 400,
                "size": 50,
                "sort": [{ "filedAt": { "order": "desc" } }]
            })
        );
    }

    #[test]
    fn response_deserializes() {
        let page: SearchResponse = serde_json::from_value(json!({
            "total": { "value": 450, "relation": "eq" },
            "query": { "from": 0, "size": 1 },
            "filings": [
                { "id": "a", "holdings": [{ "cusip": "037833100" }] },
                { "id": "b" }
            ]
        }))
        .unwrap();

        assert_eq!(page.total.value, 450);
        assert_eq!(page.total.relation.as_deref(), Some("eq"));
        let filings = page.filings.unwrap();
        assert_eq!(filings.len(), 2);
        assert_eq!(filings[0].holdings.as_ref().unwrap().len(), 1);
        assert!(filings[1].holdings.is_none());
    }

    #[test]
    fn config_builds_a_client() {
        let config = IngestConfig {
            api_key: "key".to_string(),
            ..IngestConfig::default()
        };
        let api = SecApi::new(&config).unwrap();
        assert_eq!(api.url, crate::config::SEC_API_URL);
        assert_eq!(api.api_key, "key");
    }
}
