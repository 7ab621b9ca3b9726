use crate::config::AssistantConfig;
use crate::database::SqlDatabase;
use crate::error::AssistantError;
use crate::llm::LanguageModel;
use crate::prompts::{render_answer_prompt, render_sql_prompt};
use tracing::{debug, error, info};

/// Answers questions by having the model write SQL, checking and running it, then having the
/// model phrase the rows as an answer.
pub struct Assistant<M, D> {
    config: AssistantConfig,
    model: M,
    database: D,
}

impl<M, D> Assistant<M, D>
where
    M: LanguageModel,
    D: SqlDatabase,
{
    pub fn new(config: AssistantConfig, model: M, database: D) -> Self {
        Self {
            config,
            model,
            database,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    /// Answer one question.
    ///
    /// The SQL is planned with `EXPLAIN` before it runs; a query that fails to plan is returned
    /// as [`AssistantError::InvalidQuery`] and the model is not asked for an answer.
    pub async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        let schema = self.database.table_info().await.map_err(|err| {
            error!("failed to describe the database, error({err})");
            AssistantError::Schema(err)
        })?;

        let prompt = render_sql_prompt(&schema, question);
        let reply = self
            .model
            .complete(&prompt, &[self.config.sql_stop.as_str()])
            .await?;
        let query = clean_sql(&reply);
        if query.is_empty() {
            return Err(AssistantError::EmptyQuery {
                question: question.to_string(),
            });
        }
        info!("generated SQL: {query}");

        if let Err(err) = self.database.explain(&query).await {
            error!("generated SQL failed to plan, error({err})");
            return Err(AssistantError::InvalidQuery { query, source: err });
        }

        let result = match self.database.run(&query).await {
            Ok(result) => result,
            Err(err) => {
                error!("generated SQL failed to run, error({err})");
                return Err(AssistantError::Execution { query, source: err });
            }
        };
        debug!("query returned {} rows", result.rows.len());

        let prompt = render_answer_prompt(&schema, question, &query, &result.to_string());
        let answer = self
            .model
            .complete(&prompt, &[self.config.answer_stop.as_str()])
            .await?;

        Ok(answer.trim().to_string())
    }
}

/// Trim a model reply down to its SQL: surrounding whitespace and one markdown fence are removed.
pub fn clean_sql(reply: &str) -> String {
    let mut sql = reply.trim();
    if let Some(body) = sql.strip_prefix("```") {
        let body = body
            .strip_prefix("sql")
            .or_else(|| body.strip_prefix("SQL"))
            .unwrap_or(body);
        sql = body.strip_suffix("```").unwrap_or(body).trim();
    }
    sql.to_string()
}
