//////////////////////////////////////////////////////////////////
// schema
//////////////////////////////////////////////////////////////////

/// DDL for `filings` and `holdings`; the spider expects these to exist already.
pub static CREATE_TABLES: &'static str = include_str!("../sql/schema.sql");

//////////////////////////////////////////////////////////////////
// filings
//////////////////////////////////////////////////////////////////

/// `filings` holds one row per 13F-HR filing; re-ingesting a period overwrites each row.
pub(crate) static UPSERT_FILING: &'static str = "
    INSERT INTO filings (
        id,
        accession_no,
        cik,
        ticker,
        company_name,
        company_name_long,
        form_type,
        description,
        link_to_text,
        link_to_html,
        link_to_filing_details,
        period_of_report,
        effectiveness_date,
        filed_at_datetime,
        filed_at_timezone
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    ON CONFLICT (id) DO UPDATE SET
        accession_no = EXCLUDED.accession_no,
        cik = EXCLUDED.cik,
        ticker = EXCLUDED.ticker,
        company_name = EXCLUDED.company_name,
        company_name_long = EXCLUDED.company_name_long,
        form_type = EXCLUDED.form_type,
        description = EXCLUDED.description,
        link_to_text = EXCLUDED.link_to_text,
        link_to_html = EXCLUDED.link_to_html,
        link_to_filing_details = EXCLUDED.link_to_filing_details,
        period_of_report = EXCLUDED.period_of_report,
        effectiveness_date = EXCLUDED.effectiveness_date,
        filed_at_datetime = EXCLUDED.filed_at_datetime,
        filed_at_timezone = EXCLUDED.filed_at_timezone
";

//////////////////////////////////////////////////////////////////
// holdings
//////////////////////////////////////////////////////////////////

/// `holdings` is insert-only; re-ingesting a period duplicates its rows.
pub(crate) static INSERT_HOLDING: &'static str = "
    INSERT INTO holdings (
        cusip,
        ticker,
        cik,
        investment_discretion,
        name_of_issuer,
        value,
        title_of_class,
        voting_authority_sole,
        voting_authority_shared,
        voting_authority_none,
        shrs_or_prn_amt_type,
        shrs_or_prn_amt,
        filing_id,
        other_manager,
        put_call
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
";
