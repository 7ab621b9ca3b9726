use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use dotenv::var;
use thirteenf_query::{Assistant, AssistantConfig, LlmConfig, OpenAiClient, PgDatabase};
use tracing::{debug, error};

/// Answer `question`, prompting for it when none was given.
pub(crate) async fn run(question: Option<String>, tui: bool) -> anyhow::Result<()> {
    let question = match question {
        Some(question) => question,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Question")
            .interact_text()?,
    };

    let config = AssistantConfig::from_env();
    let model = OpenAiClient::new(LlmConfig::from_env())?;
    let database = PgDatabase::connect(
        &var("DATABASE_URL").map_err(|err| {
            error!("environment variable DATABASE_URL: {err}");
            err
        })?,
        &config,
    )?;
    debug!("assistant ready, model {}", model.config().model);

    let assistant = Assistant::new(config, model, database);
    let answer = assistant.ask(&question).await?;
    if tui {
        println!("{}\n{answer}", "Answer".green().bold());
    } else {
        println!("{answer}");
    }

    Ok(())
}
