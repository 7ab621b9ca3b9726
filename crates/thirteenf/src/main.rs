mod ask;
mod cli;
mod ingest;

// remote imports
use clap::Parser;
use cli::Cli;
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preprocess the trace level
fn preprocess(trace_level: Level) {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level; warnings & errors are always shown
    preprocess(cli::max_level(cli.trace));
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    use cli::Commands::*;
    match cli.command {
        // `thirteenf ingest`: page through the period's filings
        Ingest => ingest::run(tui).await?,

        // `thirteenf ask [QUESTION]`: one question, answered from the database
        Ask { question } => ask::run(question, tui).await?,
    }

    Ok(())
}
