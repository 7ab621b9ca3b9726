use crate::llm::LlmError;

/// Failures talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures of a single question.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("failed to read the database schema: {0}")]
    Schema(#[source] DatabaseError),

    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("language model returned no SQL for question {question:?}")]
    EmptyQuery { question: String },

    /// The generated SQL did not pass `EXPLAIN`.
    #[error("Invalid SQL query: {query}. Error: {source}")]
    InvalidQuery {
        query: String,
        #[source]
        source: DatabaseError,
    },

    #[error("failed to run SQL query: {query}. Error: {source}")]
    Execution {
        query: String,
        #[source]
        source: DatabaseError,
    },
}
