//! Ask questions of the 13F database in plain English.
//!
//! The [`Assistant`] runs a two-stage chain: the language model writes SQL for the question,
//! the SQL is checked with `EXPLAIN` and executed, and the model then phrases the result as an
//! answer.

pub mod assistant;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod prompts;

pub use assistant::Assistant;
pub use config::{AssistantConfig, LlmConfig};
pub use database::{PgDatabase, QueryResult, SqlDatabase};
pub use error::{AssistantError, DatabaseError};
pub use llm::{LanguageModel, LlmError, OpenAiClient};
