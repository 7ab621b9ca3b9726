use crate::de;
use crate::filings::RawFiling;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, trace, warn};

// Input
// =====
//
// "holdings": [
//     {
//         "nameOfIssuer": "APPLE INC",
//         "titleOfClass": "COM",
//         "cusip": "037833100",
//         "ticker": "AAPL",
//         "cik": "320193",
//         "value": 12874000,
//         "shrsOrPrnAmt": { "sshPrnamt": 75076, "sshPrnamtType": "SH" },
//         "putCall": "Put",
//         "investmentDiscretion": "SOLE",
//         "otherManager": "1,2",
//         "votingAuthority": { "Sole": 75076, "Shared": 0, "None": 0 }
//     },
//     ...
// ]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHolding {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cusip: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub ticker: Option<String>,
    #[serde(default)]
    pub cik: Option<Value>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub investment_discretion: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name_of_issuer: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub title_of_class: Option<String>,
    /// `{ "Sole": .., "Shared": .., "None": .. }`; any other shape reads as no votes reported.
    #[serde(default)]
    pub voting_authority: Option<Value>,
    /// Either the bare amount, or `{ "sshPrnamt": .., "sshPrnamtType": .. }`.
    #[serde(default)]
    pub shrs_or_prn_amt: Option<Value>,
    #[serde(default, rename = "shrsOrPrnAmt_Type", deserialize_with = "de::opt_string")]
    pub shrs_or_prn_amt_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub other_manager: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub put_call: Option<String>,
}

// Output
// ======
//
// One row of `holdings`; insert-only, `filing_id` references `filings.id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoldingRow {
    pub cusip: Option<String>,
    pub ticker: Option<String>,
    pub cik: Option<i64>,
    pub investment_discretion: Option<String>,
    pub name_of_issuer: Option<String>,
    pub value: Option<Decimal>,
    pub title_of_class: Option<String>,
    pub voting_authority_sole: Option<i64>,
    pub voting_authority_shared: Option<i64>,
    pub voting_authority_none: Option<i64>,
    pub shrs_or_prn_amt_type: Option<String>,
    pub shrs_or_prn_amt: Option<i64>,
    pub filing_id: String,
    pub other_manager: Option<String>,
    pub put_call: Option<String>,
}

/// Holding rows of one filing, and how many of their values had to be clamped.
#[derive(Debug, Default)]
pub struct MappedHoldings {
    pub rows: Vec<HoldingRow>,
    pub clamped: usize,
}

/// Flatten a filing's nested holdings into `holdings` rows owned by `filing_id`.
///
/// A filing without holdings yields no rows. Values whose magnitude exceeds `max_value` are
/// clamped to `max_value` with their sign kept.
pub fn map_holdings(filing: &RawFiling, filing_id: &str, max_value: Decimal) -> MappedHoldings {
    let holdings = match filing.holdings.as_deref() {
        Some(holdings) if !holdings.is_empty() => holdings,
        _ => {
            debug!("no holdings found for filing {filing_id}");
            return MappedHoldings::default();
        }
    };

    let mut mapped = MappedHoldings {
        rows: Vec::with_capacity(holdings.len()),
        clamped: 0,
    };

    for holding in holdings {
        let voting = |key: &str| match &holding.voting_authority {
            Some(Value::Object(votes)) => votes.get(key).and_then(coerce_integer),
            _ => None,
        };
        let (shrs_or_prn_amt, shrs_or_prn_amt_type) = shares_or_principal(holding);

        let value = match holding.value.as_ref().and_then(coerce_decimal) {
            Some(value) if value.abs() > max_value => {
                let clamped = if value.is_sign_negative() { -max_value } else { max_value };
                warn!(
                    "out of range value in filing {filing_id}: cusip {:?}, ticker {:?}, value {value}; clamping to {clamped}",
                    holding.cusip, holding.ticker
                );
                mapped.clamped += 1;
                Some(clamped)
            }
            value => value,
        };

        mapped.rows.push(HoldingRow {
            cusip: holding.cusip.clone(),
            ticker: holding.ticker.clone(),
            cik: holding.cik.as_ref().and_then(coerce_integer),
            investment_discretion: holding.investment_discretion.clone(),
            name_of_issuer: holding.name_of_issuer.clone(),
            value,
            title_of_class: holding.title_of_class.clone(),
            voting_authority_sole: voting("Sole"),
            voting_authority_shared: voting("Shared"),
            voting_authority_none: voting("None"),
            shrs_or_prn_amt_type,
            shrs_or_prn_amt,
            filing_id: filing_id.to_string(),
            other_manager: holding.other_manager.clone(),
            put_call: holding.put_call.clone(),
        });
    }

    trace!("mapped {} holdings for filing {filing_id}", mapped.rows.len());
    mapped
}

// the amount is either flat (`shrsOrPrnAmt` + `shrsOrPrnAmt_Type`), or nested as
// `{ "sshPrnamt": 75076, "sshPrnamtType": "SH" }`
fn shares_or_principal(holding: &RawHolding) -> (Option<i64>, Option<String>) {
    match &holding.shrs_or_prn_amt {
        Some(Value::Object(nested)) => {
            let amount = nested.get("sshPrnamt").and_then(coerce_integer);
            let kind = holding.shrs_or_prn_amt_type.clone().or_else(|| {
                nested
                    .get("sshPrnamtType")
                    .cloned()
                    .and_then(de::scalar_to_string)
            });
            (amount, kind)
        }
        Some(flat) => (coerce_integer(flat), holding.shrs_or_prn_amt_type.clone()),
        None => (None, holding.shrs_or_prn_amt_type.clone()),
    }
}

/// Coerce a JSON scalar to an integer; blank, fractional, out of range or unparseable input is
/// `None`.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

// whole floats inside the i64 range; `i64::MAX as f64` rounds up to 2^63, hence the strict bound
fn integral(float: f64) -> Option<i64> {
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

/// Coerce a JSON scalar to a decimal; unparseable input is `None`.
///
/// Magnitudes beyond [`Decimal`]'s range saturate to [`Decimal::MAX`] / [`Decimal::MIN`], so
/// they are still caught by the clamp rather than silently dropped.
pub fn coerce_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| {
            let float = text.parse::<f64>().ok().filter(|f| f.is_finite())?;
            Some(Decimal::from_f64(float).unwrap_or(if float.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }))
        })
}
