use crate::dates::normalize_date;
use crate::de;
use crate::holdings::RawHolding;
use regex::Regex;
use serde::Deserialize;
use tracing::{trace, warn};

lazy_static::lazy_static! {
    /// `filedAt` is a local datetime followed by its UTC offset, e.g. `2024-05-15T16:05:27-04:00`.
    static ref FILED_AT: Regex =
        Regex::new(r"^(.*)([+-]\d{2}:\d{2})").expect("FILED_AT is a valid regex");
}

// Input
// =====
//
// {
//     "id": "0bd0a1fb28d7e2a1a4c5cb4e2a6c4b61",
//     "accessionNo": "0001172661-24-002010",
//     "cik": "1803084",
//     "ticker": "",
//     "companyName": "Cypress Capital Management, LLC",
//     "companyNameLong": "Cypress Capital Management, LLC (Filer)",
//     "formType": "13F-HR",
//     "description": "Form 13F-HR - Quarterly report filed by institutional managers, Holdings",
//     "filedAt": "2024-05-15T16:05:27-04:00",
//     "linkToTxt": "https://www.sec.gov/Archives/edgar/data/...txt",
//     "linkToHtml": "https://www.sec.gov/Archives/edgar/data/...-index.htm",
//     "linkToFilingDetails": "https://www.sec.gov/Archives/edgar/data/...html",
//     "periodOfReport": "2024-03-31",
//     "effectivenessDate": "2024-03-31",
//     "entities": [ ... ],             <-- dropped
//     "documentFormatFiles": [ ... ],  <-- dropped
//     "dataFiles": [ ... ],            <-- dropped
//     "holdings": [ ... ]              <-- see `holdings::RawHolding`
// }
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFiling {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub accession_no: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cik: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub company_name_long: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub form_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    #[serde(default, alias = "linkToTxt", deserialize_with = "de::opt_string")]
    pub link_to_text: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub link_to_html: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub link_to_filing_details: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub period_of_report: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub effectiveness_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub filed_at: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub holdings: Option<Vec<RawHolding>>,
}

impl RawFiling {
    /// The filing's identifier, if it carries a usable one.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

// Output
// ======
//
// One row of `filings`; `id` is the upsert key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilingRow {
    pub id: String,
    pub accession_no: Option<String>,
    pub cik: Option<String>,
    pub ticker: Option<String>,
    pub company_name: Option<String>,
    pub company_name_long: Option<String>,
    pub form_type: Option<String>,
    pub description: Option<String>,
    pub link_to_text: Option<String>,
    pub link_to_html: Option<String>,
    pub link_to_filing_details: Option<String>,
    pub period_of_report: Option<String>,
    pub effectiveness_date: Option<String>,
    pub filed_at_datetime: Option<String>,
    pub filed_at_timezone: Option<String>,
}

/// Flatten a filing into its `filings` row.
///
/// Returns `None` for a filing without an identifier, since it has no upsert key.
pub fn map_filing(raw: &RawFiling) -> Option<FilingRow> {
    let Some(id) = raw.key() else {
        warn!(
            "skipping filing without an id, accession number {:?}",
            raw.accession_no
        );
        return None;
    };

    let (filed_at_datetime, filed_at_timezone) = match raw.filed_at.as_deref() {
        Some(filed_at) => split_filed_at(filed_at),
        None => (None, None),
    };

    trace!("mapped filing {id}");
    Some(FilingRow {
        id: id.to_string(),
        accession_no: raw.accession_no.clone(),
        cik: raw.cik.clone(),
        ticker: raw.ticker.clone(),
        company_name: raw.company_name.clone(),
        company_name_long: raw.company_name_long.clone(),
        form_type: raw.form_type.clone(),
        description: raw.description.clone(),
        link_to_text: raw.link_to_text.clone(),
        link_to_html: raw.link_to_html.clone(),
        link_to_filing_details: raw.link_to_filing_details.clone(),
        period_of_report: raw.period_of_report.as_deref().map(normalize_date),
        effectiveness_date: raw.effectiveness_date.as_deref().map(normalize_date),
        filed_at_datetime,
        filed_at_timezone,
    })
}

/// Split a `filedAt` timestamp into its local datetime and signed UTC offset.
///
/// Both halves are `None` when no `±HH:MM` offset is found.
pub fn split_filed_at(filed_at: &str) -> (Option<String>, Option<String>) {
    match FILED_AT.captures(filed_at) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawFiling {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn filed_at_splits_into_datetime_and_offset() {
        for ts in [
            "2024-05-15T16:05:27-04:00",
            "2024-05-15T16:05:27+05:30",
            "2024-02-01T09:00:00.123-05:00",
        ] {
            let (dt, tz) = split_filed_at(ts);
            let (dt, tz) = (dt.unwrap(), tz.unwrap());
            assert_eq!(format!("{dt}{tz}"), ts);
            assert_eq!(tz.len(), 6);
        }

        let (dt, tz) = split_filed_at("2024-05-15T16:05:27-04:00");
        assert_eq!(dt.as_deref(), Some("2024-05-15T16:05:27"));
        assert_eq!(tz.as_deref(), Some("-04:00"));
    }

    #[test]
    fn filed_at_without_offset_is_absent() {
        assert_eq!(split_filed_at("2024-05-15T16:05:27Z"), (None, None));
        assert_eq!(split_filed_at(""), (None, None));
    }

    #[test]
    fn filing_maps_to_row() {
        let filing = raw(json!({
            "id": "abc",
            "accessionNo": "0001172661-24-002010",
            "cik": 1803084,
            "ticker": "",
            "companyName": "Cypress Capital Management, LLC",
            "formType": "13F-HR",
            "filedAt": "2024-05-15T16:05:27-04:00",
            "linkToTxt": "https://www.sec.gov/a.txt",
            "periodOfReport": "03/31/2024",
            "effectivenessDate": "sometime",
            "entities": [{ "cik": "1803084" }],
            "dataFiles": [],
            "holdings": []
        }));

        let row = map_filing(&filing).unwrap();
        assert_eq!(row.id, "abc");
        assert_eq!(row.cik.as_deref(), Some("1803084"));
        assert_eq!(row.ticker.as_deref(), Some(""));
        assert_eq!(row.link_to_text.as_deref(), Some("https://www.sec.gov/a.txt"));
        assert_eq!(row.period_of_report.as_deref(), Some("2024-03-31"));
        assert_eq!(row.effectiveness_date.as_deref(), Some("sometime"));
        assert_eq!(row.filed_at_datetime.as_deref(), Some("2024-05-15T16:05:27"));
        assert_eq!(row.filed_at_timezone.as_deref(), Some("-04:00"));
        assert_eq!(row.company_name_long, None);
        assert_eq!(row.link_to_html, None);
    }

    #[test]
    fn filing_without_id_is_skipped() {
        assert!(map_filing(&raw(json!({ "accessionNo": "x" }))).is_none());
        assert!(map_filing(&raw(json!({ "id": "  " }))).is_none());
        assert!(map_filing(&raw(json!({ "id": null }))).is_none());
    }
}
