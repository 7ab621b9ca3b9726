use crate::config::AssistantConfig;
use crate::error::DatabaseError;
use async_trait::async_trait;
use deadpool_postgres::{ManagerConfig, Pool, RecyclingMethod};
use std::fmt;
use tokio_postgres::SimpleQueryMessage;
use tracing::{debug, trace};

/// Longest cell shown in sample rows; longer values are cut with an ellipsis.
const SAMPLE_CELL_CHARS: usize = 100;

/// The database the assistant reads; implemented for PostgreSQL by [`PgDatabase`].
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Describe the visible tables: their columns plus a few sample rows.
    async fn table_info(&self) -> Result<String, DatabaseError>;

    /// Plan `query` without running it; more than one statement is an error.
    async fn explain(&self, query: &str) -> Result<(), DatabaseError>;

    /// Run `query` and capture its rows as text.
    async fn run(&self, query: &str) -> Result<QueryResult, DatabaseError>;
}

/// Rows of a query, every cell rendered as text; `None` is SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Collect the rows of a simple (text protocol) query.
    pub fn from_messages(messages: Vec<SimpleQueryMessage>) -> Self {
        let mut result = Self::default();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    result.columns = columns.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(row) => {
                    if result.columns.is_empty() {
                        result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    result
                        .rows
                        .push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
                }
                _ => {}
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// column names on the first line, one tab-separated row per line after it
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "(no rows)");
        }
        write!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
            write!(f, "\n{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

/// One column, as listed by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Render a table as a `CREATE TABLE` outline followed by its sample rows.
pub fn render_table(table: &str, columns: &[Column], sample: &QueryResult) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|c| {
            let null = if c.nullable { "" } else { " NOT NULL" };
            format!("\t{} {}{null}", c.name, c.data_type)
        })
        .collect();

    let mut out = format!("CREATE TABLE {table} (\n{}\n)", cols.join(",\n"));
    if !sample.is_empty() {
        let mut rows = vec![sample.columns.join("\t")];
        for row in &sample.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|c| truncate(c.as_deref().unwrap_or("NULL")))
                .collect();
            rows.push(cells.join("\t"));
        }
        out.push_str(&format!(
            "\n\n/*\n{} rows from {table} table:\n{}\n*/",
            sample.rows.len(),
            rows.join("\n")
        ));
    }
    out
}

fn truncate(cell: &str) -> String {
    match cell.char_indices().nth(SAMPLE_CELL_CHARS) {
        Some((end, _)) => format!("{}...", &cell[..end]),
        None => cell.to_string(),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// PostgreSQL behind a connection pool.
pub struct PgDatabase {
    pool: Pool,
    schema: String,
    tables: Vec<String>,
    sample_rows: usize,
}

impl PgDatabase {
    pub fn new(pool: Pool, config: &AssistantConfig) -> Self {
        Self {
            pool,
            schema: config.schema.clone(),
            tables: config.tables.clone(),
            sample_rows: config.sample_rows,
        }
    }

    /// Build a pool for `url`.
    pub fn connect(url: &str, config: &AssistantConfig) -> Result<Self, DatabaseError> {
        trace!("creating postgres connection pool config");
        let mut pg_config = deadpool_postgres::Config::new();
        pg_config.url = Some(url.to_string());
        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = pg_config
            .create_pool(
                Some(deadpool_postgres::Runtime::Tokio1),
                tokio_postgres::NoTls,
            )
            .map_err(|err| DatabaseError::Other(err.to_string()))?;
        debug!("13F connection pool established");

        Ok(Self::new(pool, config))
    }

    async fn columns(&self) -> Result<Vec<(String, Column)>, DatabaseError> {
        let pg_client = self.pool.get().await?;
        let tables: Option<&Vec<String>> = (!self.tables.is_empty()).then_some(&self.tables);
        let rows = pg_client
            .query(
                "
                SELECT table_name::text, column_name::text, data_type::text, is_nullable = 'YES'
                FROM information_schema.columns
                WHERE table_schema = $1 AND ($2::text[] IS NULL OR table_name = ANY($2))
                ORDER BY table_name, ordinal_position
                ",
                &[&self.schema, &tables],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get(0),
                    Column {
                        name: row.get(1),
                        data_type: row.get(2),
                        nullable: row.get(3),
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl SqlDatabase for PgDatabase {
    async fn table_info(&self) -> Result<String, DatabaseError> {
        let mut tables: Vec<(String, Vec<Column>)> = Vec::new();
        for (table, column) in self.columns().await? {
            match tables.last_mut() {
                Some((name, columns)) if *name == table => columns.push(column),
                _ => tables.push((table, vec![column])),
            }
        }

        let pg_client = self.pool.get().await?;
        let mut described = Vec::with_capacity(tables.len());
        for (table, columns) in &tables {
            let sample = if self.sample_rows > 0 {
                let stmt = format!(
                    "SELECT * FROM {}.{} LIMIT {}",
                    quote_ident(&self.schema),
                    quote_ident(table),
                    self.sample_rows
                );
                QueryResult::from_messages(pg_client.simple_query(&stmt).await?)
            } else {
                QueryResult::default()
            };
            described.push(render_table(table, columns, &sample));
        }

        trace!("described {} tables", described.len());
        Ok(described.join("\n\n"))
    }

    // extended protocol: a single statement only, so nothing stacked after it can run
    async fn explain(&self, query: &str) -> Result<(), DatabaseError> {
        let pg_client = self.pool.get().await?;
        pg_client.query(&format!("EXPLAIN {query}"), &[]).await?;
        Ok(())
    }

    async fn run(&self, query: &str) -> Result<QueryResult, DatabaseError> {
        let pg_client = self.pool.get().await?;
        let messages = pg_client.simple_query(query).await?;
        Ok(QueryResult::from_messages(messages))
    }
}
