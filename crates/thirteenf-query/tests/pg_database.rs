use dotenv::var;
use serde_json::json;
use thirteenf_query::{AssistantConfig, DatabaseError, PgDatabase, SqlDatabase};
use thirteenf_spider::config::max_holding_value;
use thirteenf_spider::filings::RawFiling;
use thirteenf_spider::ingest::Batch;
use thirteenf_spider::sql::CREATE_TABLES;
use thirteenf_spider::store::PgStore;
use thirteenf_spider::FilingStore;

// Needs a scratch PostgreSQL database at DATABASE_URL.
async fn seeded_database(schema: &str) -> PgDatabase {
    dotenv::dotenv().ok();
    let url = var("DATABASE_URL").expect("environment variable DATABASE_URL");

    let mut store = PgStore::connect(&url).await.unwrap();
    store
        .client()
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {schema} CASCADE;
             CREATE SCHEMA {schema};
             SET search_path TO {schema};"
        ))
        .await
        .unwrap();
    store.client().batch_execute(CREATE_TABLES).await.unwrap();

    let raw: Vec<RawFiling> = serde_json::from_value(json!([{
        "id": "f1",
        "companyName": "BERKSHIRE HATHAWAY INC",
        "holdings": [
            { "nameOfIssuer": "APPLE INC", "cusip": "037833100", "value": 135360000000u64 },
            { "nameOfIssuer": "CHEVRON CORP", "cusip": "166764100", "value": 18800000000u64 }
        ]
    }]))
    .unwrap();
    store
        .persist(&Batch::map(&raw, max_holding_value()))
        .await
        .unwrap();

    let config = AssistantConfig {
        schema: schema.to_string(),
        ..AssistantConfig::default()
    };
    PgDatabase::connect(&url, &config).unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn table_info_describes_both_tables() {
    let database = seeded_database("thirteenf_test_info").await;
    let info = database.table_info().await.unwrap();

    assert!(info.contains("CREATE TABLE filings (\n\tid text NOT NULL"));
    assert!(info.contains("CREATE TABLE holdings ("));
    assert!(info.contains("\tvalue numeric"));
    assert!(info.contains("1 rows from filings table:"));
    assert!(info.contains("2 rows from holdings table:"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn explain_rejects_unknown_columns() {
    const SCHEMA: &str = "thirteenf_test_explain";
    let database = seeded_database(SCHEMA).await;

    database
        .explain(&format!("SELECT name_of_issuer FROM {SCHEMA}.holdings"))
        .await
        .unwrap();
    let err = database
        .explain(&format!("SELECT nope FROM {SCHEMA}.holdings"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Postgres(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn run_returns_rows_as_text() {
    const SCHEMA: &str = "thirteenf_test_run";
    let database = seeded_database(SCHEMA).await;

    let result = database
        .run(&format!(
            "SELECT name_of_issuer, value FROM {SCHEMA}.holdings ORDER BY value DESC"
        ))
        .await
        .unwrap();
    assert_eq!(result.columns, vec!["name_of_issuer", "value"]);
    assert_eq!(result.rows[0][0].as_deref(), Some("APPLE INC"));
    assert_eq!(result.rows[0][1].as_deref(), Some("135360000000.00"));
    assert_eq!(result.rows.len(), 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn explain_rejects_stacked_statements_without_running_them() {
    const SCHEMA: &str = "thirteenf_test_stacked";
    let database = seeded_database(SCHEMA).await;

    let result = database
        .explain(&format!("SELECT 1; DELETE FROM {SCHEMA}.holdings"))
        .await;
    assert!(matches!(result, Err(DatabaseError::Postgres(_))));

    let count = database
        .run(&format!("SELECT COUNT(*) FROM {SCHEMA}.holdings"))
        .await
        .unwrap();
    assert_eq!(count.rows[0][0].as_deref(), Some("2"));
}
