//! Prompt templates for the two model calls.
//!
//! Placeholders are `{schema}`, `{question}`, `{query}` and `{response}`; they are filled by plain
//! substitution so braces inside schema text or SQL results are left alone.

/// Few-shot examples shown with every SQL prompt.
pub const SQL_EXAMPLES: [(&str, &str); 2] = [
    (
        "Which 5 issuers have the largest total reported value?",
        "SELECT name_of_issuer, SUM(value) AS total_value FROM holdings \
         GROUP BY name_of_issuer ORDER BY total_value DESC LIMIT 5",
    ),
    (
        "How many holdings did BERKSHIRE HATHAWAY INC report?",
        "SELECT COUNT(*) FROM holdings h JOIN filings f ON f.id = h.filing_id \
         WHERE f.company_name = 'BERKSHIRE HATHAWAY INC'",
    ),
];

pub const SQL_TEMPLATE: &str = "\
Based on the table schema below, write a precise SQL query that would answer the user's question:
Schema:
{schema}

Question: {question}

Remember to consider table relationships and use JOINs if necessary. Here are some examples of similar queries:
{examples}
Now, write the SQL query for the given question. Reply with the query only.
SQL Query:";

pub const RESPONSE_TEMPLATE: &str = "\
Based on the table schema below, the question, the SQL query, and the SQL response, write a natural language response:
Schema:
{schema}

Question: {question}

SQL Query: {query}

SQL Response: {response}

Make sure the response is clear and answers the user's question fully.
";

fn examples() -> String {
    SQL_EXAMPLES
        .iter()
        .enumerate()
        .map(|(i, (question, sql))| format!("Example {}:\nQuestion: {question}\nSQL Query: {sql}\n", i + 1))
        .collect()
}

/// The prompt asking for SQL.
pub fn render_sql_prompt(schema: &str, question: &str) -> String {
    let examples = examples();
    fill(
        SQL_TEMPLATE,
        &[("{examples}", examples.as_str()), ("{schema}", schema), ("{question}", question)],
    )
}

/// The prompt asking for the final answer.
pub fn render_answer_prompt(schema: &str, question: &str, query: &str, response: &str) -> String {
    fill(
        RESPONSE_TEMPLATE,
        &[
            ("{schema}", schema),
            ("{question}", question),
            ("{query}", query),
            ("{response}", response),
        ],
    )
}

// Single left-to-right pass, so substituted text is never re-scanned for placeholders.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
