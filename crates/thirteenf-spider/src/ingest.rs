use crate::config::IngestConfig;
use crate::filings::{map_filing, FilingRow, RawFiling};
use crate::holdings::{map_holdings, HoldingRow};
use crate::sec_api::{SearchQuery, SearchResponse};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, error, info, trace};

/// Where filings come from; implemented by [`crate::sec_api::SecApi`].
#[async_trait]
pub trait FilingSource {
    async fn search(&self, query: &SearchQuery) -> anyhow::Result<SearchResponse>;
}

/// Where batches go; implemented by [`crate::store::PgStore`].
#[async_trait]
pub trait FilingStore {
    /// Upsert the batch's filings and insert its holdings, committing both or neither.
    async fn persist(&mut self, batch: &Batch) -> anyhow::Result<()>;
}

/// One page of filings, mapped into rows.
#[derive(Debug, Default)]
pub struct Batch {
    pub filings: Vec<FilingRow>,
    pub holdings: Vec<HoldingRow>,

    /// Filings dropped for lacking an id.
    pub skipped: usize,

    /// Holding values clamped to the configured maximum.
    pub clamped: usize,
}

impl Batch {
    /// Map a page of raw filings into `filings` and `holdings` rows.
    pub fn map(raw: &[RawFiling], max_value: Decimal) -> Self {
        let mut batch = Batch::default();

        for filing in raw {
            let Some(row) = map_filing(filing) else {
                batch.skipped += 1;
                continue;
            };

            let holdings = map_holdings(filing, &row.id, max_value);
            batch.clamped += holdings.clamped;
            batch.holdings.extend(holdings.rows);
            batch.filings.push(row);
        }

        batch
    }
}

/// What an ingestion run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub total: u64,
    pub pages: usize,
    pub filings: usize,
    pub holdings: usize,
    pub skipped: usize,
    pub clamped: usize,
}

/// Offsets and sizes of every page needed to cover `total` filings.
///
/// ```rust
/// use thirteenf_spider::ingest::page_plan;
///
/// assert_eq!(page_plan(450, 200), vec![(0, 200), (200, 200), (400, 50)]);
/// ```
pub fn page_plan(total: u64, page_size: u64) -> Vec<(u64, u64)> {
    if page_size == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(page_size as usize)
        .map(|from| (from, page_size.min(total - from)))
        .collect()
}

/// The ingestion process: count the period's filings, then fetch, map and persist them one page
/// at a time.
pub struct Ingestor<S, D> {
    config: IngestConfig,
    source: S,
    store: D,
    tui: bool,
}

impl<S, D> Ingestor<S, D>
where
    S: FilingSource + Send + Sync,
    D: FilingStore + Send,
{
    pub fn new(config: IngestConfig, source: S, store: D) -> Self {
        Self {
            config,
            source,
            store,
            tui: false,
        }
    }

    /// Show a progress bar instead of relying on trace output.
    pub fn with_tui(mut self, tui: bool) -> Self {
        self.tui = tui;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Number of filings matching the configured period, from a single-row probe.
    pub async fn total_filings(&self) -> anyhow::Result<u64> {
        let probe = SearchQuery::thirteen_f(&self.config.period_of_report, 0, 1);
        let response = self.source.search(&probe).await?;
        Ok(response.total.value)
    }

    pub async fn run(&mut self) -> anyhow::Result<IngestReport> {
        let time = std::time::Instant::now();
        let period = self.config.period_of_report.clone();

        if self.config.page_size == 0 {
            anyhow::bail!("page size must be positive");
        }

        if self.tui {
            println!(
                "{bar}\n{name:^40}\n{bar}",
                bar = "=".repeat(40),
                name = format!("13F-HR {period}")
            );
        }

        debug!("counting 13F-HR filings for period {period}");
        let total = self.total_filings().await.map_err(|err| {
            error!("failed to count filings for period {period}, error({err})");
            err
        })?;
        info!("{total} filings found for period {period}");

        let mut report = IngestReport {
            total,
            ..IngestReport::default()
        };
        let pb = crate::tui::progress_bar(self.tui, total, "collecting 13F-HR filings ...")?;

        for (from, size) in page_plan(total, self.config.page_size) {
            trace!("fetching filings {from}..{}", from + size);
            let query = SearchQuery::thirteen_f(&period, from, size);
            let page = self.source.search(&query).await.map_err(|err| {
                error!("failed to fetch filings {from}..{}, error({err})", from + size);
                err
            })?;
            report.pages += 1;

            let raw = page.filings.unwrap_or_default();
            let batch = Batch::map(&raw, self.config.max_holding_value);
            if batch.holdings.is_empty() {
                info!("no holdings data to save for filings {from}..{}", from + size);
            }

            self.store.persist(&batch).await.map_err(|err| {
                error!(
                    "failed to persist filings {from}..{}, error({err})",
                    from + size
                );
                err
            })?;

            report.filings += batch.filings.len();
            report.holdings += batch.holdings.len();
            report.skipped += batch.skipped;
            report.clamped += batch.clamped;
            pb.inc(raw.len() as u64);
            debug!(
                "batch {} committed: {} filings, {} holdings",
                report.pages,
                batch.filings.len(),
                batch.holdings.len()
            );
        }

        pb.finish_and_clear();
        if self.tui {
            println!("collecting 13F-HR filings ... done\n");
        }
        info!(
            "ingested period {period}: {report:?}, {}",
            crate::time_elapsed(time)
        );

        Ok(report)
    }
}
