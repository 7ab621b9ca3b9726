use dotenv::var;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the chat-completion client.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// API base; `/v1/chat/completions` is appended.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    /// Defaults, overridden by `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_ENDPOINT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = var("OPENAI_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(model) = var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = var("OPENAI_ENDPOINT") {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config
    }
}

/// What the assistant may see of the database, and how its model calls are cut off.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Postgres schema holding the tables.
    pub schema: String,

    /// Tables described to the model; empty means every table in `schema`.
    pub tables: Vec<String>,

    /// Sample rows shown per table.
    pub sample_rows: usize,

    /// Stop sequence for the SQL-writing call.
    pub sql_stop: String,

    /// Stop sequence for the answer-writing call.
    pub answer_stop: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tables: vec!["filings".to_string(), "holdings".to_string()],
            sample_rows: 3,
            sql_stop: "\nSQLResult:".to_string(),
            answer_stop: "\nEndResponse".to_string(),
        }
    }
}

impl AssistantConfig {
    /// Defaults, with the schema overridden by `THIRTEENF_SCHEMA`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(schema) = var("THIRTEENF_SCHEMA") {
            config.schema = schema;
        }
        config
    }
}
