use dotenv::var;
use thirteenf_spider::{sec_api::SecApi, store::PgStore, time_elapsed, IngestConfig, Ingestor};
use tracing::{debug, error, info};

/// Collect every filing of the configured period into `DATABASE_URL`.
pub(crate) async fn run(tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    let config = IngestConfig::from_env()?;
    let source = SecApi::new(&config)?;
    let store = PgStore::connect(&var("DATABASE_URL").map_err(|err| {
        error!("environment variable DATABASE_URL: {err}");
        err
    })?)
    .await?;
    debug!("13F database connection established");

    let mut ingestor = Ingestor::new(config, source, store).with_tui(tui);
    let report = ingestor.run().await?;

    info!(
        "{} filings ({} holdings) stored over {} pages, {} skipped, {} values clamped, {}",
        report.filings,
        report.holdings,
        report.pages,
        report.skipped,
        report.clamped,
        time_elapsed(time)
    );
    if tui {
        println!(
            "Stored {} of {} filings with {} holdings, {}",
            report.filings,
            report.total,
            report.holdings,
            time_elapsed(time)
        );
    }

    Ok(())
}
