use crate::filings::FilingRow;
use crate::holdings::HoldingRow;
use crate::http::PgClient;
use crate::ingest::{Batch, FilingStore};
use crate::sql;
use async_trait::async_trait;
use tokio_postgres::{NoTls, Transaction};
use tracing::{debug, error, trace};

/// PostgreSQL store; each batch is written inside a single TRANSACTION.
pub struct PgStore {
    pg_client: PgClient,
}

impl PgStore {
    pub fn new(pg_client: PgClient) -> Self {
        Self { pg_client }
    }

    /// Connect to `url`, holding the connection open on a background task.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        trace!("connecting to the 13F database ...");
        let (pg_client, pg_conn) = tokio_postgres::connect(url, NoTls).await.map_err(|err| {
            error!("13F database connection error: {}", err);
            err
        })?;

        tokio::spawn(async move {
            if let Err(err) = pg_conn.await {
                error!("13F database connection error: {}", err);
            }
        });
        debug!("13F database connection established");

        Ok(Self::new(pg_client))
    }

    pub fn client(&self) -> &PgClient {
        &self.pg_client
    }
}

#[async_trait]
impl FilingStore for PgStore {
    async fn persist(&mut self, batch: &Batch) -> anyhow::Result<()> {
        let time = std::time::Instant::now();

        // preprocess pg queries, then open the batch TRANSACTION
        let upsert = self.pg_client.prepare(sql::UPSERT_FILING).await?;
        let insert = self.pg_client.prepare(sql::INSERT_HOLDING).await?;
        let tx = self.pg_client.transaction().await?;

        upsert_filings(&tx, &upsert, &batch.filings).await?;
        insert_holdings(&tx, &insert, &batch.holdings).await?;

        tx.commit().await.map_err(|err| {
            error!("failed to commit transaction for 13F batch, error({err})");
            err
        })?;

        debug!(
            "{} filings & {} holdings committed. {}",
            batch.filings.len(),
            batch.holdings.len(),
            crate::time_elapsed(time)
        );
        Ok(())
    }
}

async fn upsert_filings(
    tx: &Transaction<'_>,
    stmt: &tokio_postgres::Statement,
    filings: &[FilingRow],
) -> anyhow::Result<()> {
    for row in filings {
        tx.execute(
            stmt,
            &[
                &row.id,
                &row.accession_no,
                &row.cik,
                &row.ticker,
                &row.company_name,
                &row.company_name_long,
                &row.form_type,
                &row.description,
                &row.link_to_text,
                &row.link_to_html,
                &row.link_to_filing_details,
                &row.period_of_report,
                &row.effectiveness_date,
                &row.filed_at_datetime,
                &row.filed_at_timezone,
            ],
        )
        .await
        .map_err(|err| {
            error!("failed to upsert filing {}, error({err})", row.id);
            err
        })?;
        trace!("filing {} upserted", row.id);
    }
    Ok(())
}

// a single bad row aborts the whole batch; it is reported first
async fn insert_holdings(
    tx: &Transaction<'_>,
    stmt: &tokio_postgres::Statement,
    holdings: &[HoldingRow],
) -> anyhow::Result<()> {
    for row in holdings {
        tx.execute(
            stmt,
            &[
                &row.cusip,
                &row.ticker,
                &row.cik,
                &row.investment_discretion,
                &row.name_of_issuer,
                &row.value,
                &row.title_of_class,
                &row.voting_authority_sole,
                &row.voting_authority_shared,
                &row.voting_authority_none,
                &row.shrs_or_prn_amt_type,
                &row.shrs_or_prn_amt,
                &row.filing_id,
                &row.other_manager,
                &row.put_call,
            ],
        )
        .await
        .map_err(|err| {
            error!("failed to insert holding, error({err}) for row: {row:?}");
            err
        })?;
    }
    Ok(())
}
