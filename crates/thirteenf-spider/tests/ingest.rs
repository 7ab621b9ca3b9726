use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use thirteenf_spider::filings::{FilingRow, RawFiling};
use thirteenf_spider::holdings::HoldingRow;
use thirteenf_spider::ingest::Batch;
use thirteenf_spider::sec_api::{SearchQuery, SearchResponse, Total};
use thirteenf_spider::{FilingSource, FilingStore, IngestConfig, Ingestor};

/// Serves `total` synthetic filings, each with two holdings, and records every request.
struct FakeSource {
    total: u64,
    requests: Mutex<Vec<(u64, u64)>>,
}

impl FakeSource {
    fn new(total: u64) -> Self {
        Self {
            total,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(u64, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilingSource for FakeSource {
    async fn search(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse> {
        self.requests.lock().unwrap().push((query.from, query.size));

        let end = (query.from + query.size).min(self.total);
        let filings = (query.from..end)
            .map(|n| {
                serde_json::from_value::<RawFiling>(json!({
                    "id": format!("filing-{n}"),
                    "formType": "13F-HR",
                    "filedAt": "2024-05-15T16:05:27-04:00",
                    "periodOfReport": "2024-03-31",
                    "holdings": [
                        { "cusip": "037833100", "value": 100 },
                        { "cusip": "594918104", "value": "1e40" }
                    ]
                }))
                .unwrap()
            })
            .collect();

        Ok(SearchResponse {
            total: Total {
                value: self.total,
                relation: Some("eq".to_string()),
            },
            filings: Some(filings),
        })
    }
}

/// In-memory stand-in for the two tables: filings keyed by id, holdings appended.
#[derive(Default)]
struct FakeStore {
    commits: usize,
    filings: HashMap<String, FilingRow>,
    holdings: Vec<HoldingRow>,
    fail_on_commit: Option<usize>,
}

#[async_trait]
impl FilingStore for FakeStore {
    async fn persist(&mut self, batch: &Batch) -> anyhow::Result<()> {
        if self.fail_on_commit == Some(self.commits + 1) {
            anyhow::bail!("value out of range for type numeric");
        }
        for filing in &batch.filings {
            self.filings.insert(filing.id.clone(), filing.clone());
        }
        self.holdings.extend(batch.holdings.iter().cloned());
        self.commits += 1;
        Ok(())
    }
}

fn config() -> IngestConfig {
    IngestConfig {
        api_key: "test".to_string(),
        ..IngestConfig::default()
    }
}

#[tokio::test]
async fn paginates_450_filings_in_three_batches() {
    let mut ingestor = Ingestor::new(config(), FakeSource::new(450), FakeStore::default());
    let report = ingestor.run().await.unwrap();

    assert_eq!(report.total, 450);
    assert_eq!(report.pages, 3);
    assert_eq!(report.filings, 450);
    assert_eq!(report.holdings, 900);
    assert_eq!(report.clamped, 450);
    assert_eq!(ingestor.store().commits, 3);
    assert_eq!(ingestor.store().filings.len(), 450);
}

#[tokio::test]
async fn page_requests_are_200_200_50_after_the_count_probe() {
    let source = FakeSource::new(450);
    let mut ingestor = Ingestor::new(config(), source, FakeStore::default());
    ingestor.run().await.unwrap();

    // the first request is the single-row probe for the total
    let requests = ingestor_source_requests(&ingestor);
    assert_eq!(requests[0], (0, 1));
    assert_eq!(&requests[1..], &[(0, 200), (200, 200), (400, 50)]);
}

#[tokio::test]
async fn clamped_values_are_stored_as_the_maximum() {
    let mut ingestor = Ingestor::new(config(), FakeSource::new(3), FakeStore::default());
    ingestor.run().await.unwrap();

    let max = thirteenf_spider::config::max_holding_value();
    let values: Vec<Option<Decimal>> = ingestor.store().holdings.iter().map(|h| h.value).collect();
    assert_eq!(values.len(), 6);
    assert!(values.iter().all(|v| v.unwrap() <= max));
    assert_eq!(values.iter().filter(|v| **v == Some(max)).count(), 3);
}

#[tokio::test]
async fn reingesting_upserts_filings_but_duplicates_holdings() {
    let mut ingestor = Ingestor::new(config(), FakeSource::new(5), FakeStore::default());
    ingestor.run().await.unwrap();
    ingestor.run().await.unwrap();

    assert_eq!(ingestor.store().filings.len(), 5);
    assert_eq!(ingestor.store().holdings.len(), 20);
}

#[tokio::test]
async fn a_failed_batch_stops_the_run() {
    let store = FakeStore {
        fail_on_commit: Some(2),
        ..FakeStore::default()
    };
    let mut ingestor = Ingestor::new(config(), FakeSource::new(450), store);
    let err = ingestor.run().await.unwrap_err();

    assert!(err.to_string().contains("out of range"));
    assert_eq!(ingestor.store().commits, 1);
    assert_eq!(ingestor.store().filings.len(), 200);
}

#[tokio::test]
async fn an_empty_period_fetches_no_pages() {
    let mut ingestor = Ingestor::new(config(), FakeSource::new(0), FakeStore::default());
    let report = ingestor.run().await.unwrap();

    assert_eq!(report.pages, 0);
    assert_eq!(ingestor.store().commits, 0);
}

fn ingestor_source_requests(ingestor: &Ingestor<FakeSource, FakeStore>) -> Vec<(u64, u64)> {
    ingestor.source().requests()
}
