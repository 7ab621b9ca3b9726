use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    ///
    /// Without it, progress is shown as bars instead of log lines.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect the quarter's 13F-HR filings into the PostgreSQL database.
    Ingest,

    /// Ask a question about the collected filings.
    Ask {
        /// The question; prompted for when omitted.
        question: Option<String>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

/// Subscriber level for `--trace`; without it only warnings & errors are logged.
pub fn max_level(trace: Option<TraceLevel>) -> Level {
    match trace {
        Some(TraceLevel::DEBUG) => Level::DEBUG,
        Some(TraceLevel::ERROR) => Level::ERROR,
        Some(TraceLevel::INFO) => Level::INFO,
        Some(TraceLevel::TRACE) => Level::TRACE,
        Some(TraceLevel::WARN) | None => Level::WARN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_takes_an_optional_question() {
        let cli = Cli::parse_from(["thirteenf", "ask", "Who holds the most AAPL?"]);
        match cli.command {
            Commands::Ask { question } => {
                assert_eq!(question.as_deref(), Some("Who holds the most AAPL?"))
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from(["thirteenf", "ask"]);
        assert!(matches!(cli.command, Commands::Ask { question: None }));
    }

    #[test]
    fn trace_level_is_global() {
        let cli = Cli::parse_from(["thirteenf", "ingest", "--trace", "DEBUG"]);
        assert!(matches!(cli.command, Commands::Ingest));
        assert_eq!(cli.trace, Some(TraceLevel::DEBUG));

        assert!(Cli::try_parse_from(["thirteenf", "-t", "LOUD", "ingest"]).is_err());
    }

    #[test]
    fn warnings_are_logged_without_a_trace_level() {
        assert_eq!(max_level(None), Level::WARN);
        assert_eq!(max_level(Some(TraceLevel::ERROR)), Level::ERROR);
        assert_eq!(max_level(Some(TraceLevel::TRACE)), Level::TRACE);
    }
}
