use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::categorizer::{categorize, ProductCategory};
use crate::types::{Money, YearMonth};

const MISSING: &str = "N/A";

/// Largest amount accepted for a single record (one trillion). Anything above
/// is treated as corrupt; keeping single rows this far below `Decimal::MAX`
/// lets batch totals accumulate without overflow.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Amounts are kept to centavo precision.
const AMOUNT_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// A row as delivered by the data-access layer. Every field is optional and
/// loosely typed; nothing is trusted until `normalize` has re-validated it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDisbursementRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub nome: Option<Value>,
    #[serde(default)]
    pub nr_cpf_cnpj: Option<Value>,
    #[serde(default)]
    pub descricao: Option<Value>,
    #[serde(default)]
    pub nome_inst: Option<Value>,
    #[serde(default)]
    pub cidade: Option<Value>,
    #[serde(default)]
    pub uf: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub valor_solic: Option<Value>,
    #[serde(default)]
    pub vlr_liberado: Option<Value>,
    #[serde(default)]
    pub vl_financ: Option<Value>,
    #[serde(default)]
    pub data_entrada: Option<Value>,
}

/// A validated record. Amounts are never negative; `entry_date` is `None`
/// when the source value could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisbursementRecord {
    pub id: String,
    pub customer_id: String,
    pub description: String,
    pub category: ProductCategory,
    pub institution: String,
    pub city: String,
    pub state: String,
    pub requested_amount: Money,
    pub released_amount: Money,
    pub financed_amount: Money,
    pub entry_date: Option<NaiveDate>,
}

impl DisbursementRecord {
    pub fn year_month(&self) -> Option<YearMonth> {
        self.entry_date.map(YearMonth::from_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub record_index: usize,
    pub record_id: String,
    pub field: String,
    pub raw_value: String,
    pub reason: String,
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record #{} (id {}): {} = '{}' {}; defaulted",
            self.record_index, self.record_id, self.field, self.raw_value, self.reason
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<DisbursementRecord>,
    pub issues: Vec<DataQualityIssue>,
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

fn text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse "1234.56", "1.234,56", "1234,56" and "R$ 1.234,56".
fn parse_amount_str(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    let canonical = match (cleaned.contains(','), cleaned.contains('.')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (true, false) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    Decimal::from_str(&canonical)
        .ok()
        .or_else(|| Decimal::from_scientific(&canonical).ok())
}

enum Coerced<T> {
    Ok(T),
    Defaulted(T, &'static str),
}

fn coerce_amount(value: &Option<Value>) -> Coerced<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => return Coerced::Ok(Decimal::ZERO),
        Some(Value::Number(n)) => parse_amount_str(&n.to_string()),
        Some(Value::String(s)) => parse_amount_str(s),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v < Decimal::ZERO => Coerced::Defaulted(Decimal::ZERO, "is negative"),
        Some(v) if v > MAX_AMOUNT => Coerced::Defaulted(Decimal::ZERO, "exceeds the maximum amount"),
        Some(v) => Coerced::Ok(v.round_dp(AMOUNT_DP)),
        None => Coerced::Defaulted(Decimal::ZERO, "is not a number"),
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

fn coerce_date(value: &Option<Value>) -> Coerced<Option<NaiveDate>> {
    match value {
        None | Some(Value::Null) => Coerced::Defaulted(None, "is missing"),
        Some(Value::String(s)) => match parse_date_str(s) {
            Some(d) => Coerced::Ok(Some(d)),
            None => Coerced::Defaulted(None, "is not a recognised date"),
        },
        Some(_) => Coerced::Defaulted(None, "is not a recognised date"),
    }
}

fn raw_repr(value: &Option<Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Re-validate one raw row. Never fails: malformed fields fall back to zero
/// (amounts) or `None` (date) and are reported as issues.
pub fn normalize(
    raw: &RawDisbursementRecord,
    index: usize,
) -> (DisbursementRecord, Vec<DataQualityIssue>) {
    let id = text(&raw.id).unwrap_or_else(|| format!("#{index}"));
    let mut issues = Vec::new();

    let mut amount = |field: &str, value: &Option<Value>| match coerce_amount(value) {
        Coerced::Ok(v) => v,
        Coerced::Defaulted(v, reason) => {
            issues.push(DataQualityIssue {
                record_index: index,
                record_id: id.clone(),
                field: field.to_string(),
                raw_value: raw_repr(value),
                reason: reason.to_string(),
            });
            v
        }
    };
    let requested_amount = amount("valor_solic", &raw.valor_solic);
    let released_amount = amount("vlr_liberado", &raw.vlr_liberado);
    let financed_amount = amount("vl_financ", &raw.vl_financ);

    let entry_date = match coerce_date(&raw.data_entrada) {
        Coerced::Ok(d) => d,
        Coerced::Defaulted(d, reason) => {
            issues.push(DataQualityIssue {
                record_index: index,
                record_id: id.clone(),
                field: "data_entrada".to_string(),
                raw_value: raw_repr(&raw.data_entrada),
                reason: reason.to_string(),
            });
            d
        }
    };

    let description = text(&raw.descricao);
    let category = categorize(description.as_deref());

    let record = DisbursementRecord {
        customer_id: text(&raw.nr_cpf_cnpj).unwrap_or_else(|| MISSING.to_string()),
        description: description.unwrap_or_else(|| MISSING.to_string()),
        category,
        institution: text(&raw.nome_inst).unwrap_or_else(|| MISSING.to_string()),
        city: text(&raw.cidade).unwrap_or_else(|| MISSING.to_string()),
        state: text(&raw.uf).unwrap_or_else(|| MISSING.to_string()),
        requested_amount,
        released_amount,
        financed_amount,
        entry_date,
        id,
    };
    (record, issues)
}

pub fn normalize_batch(raw: &[RawDisbursementRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(raw.len()),
        issues: Vec::new(),
    };
    for (index, row) in raw.iter().enumerate() {
        let (record, issues) = normalize(row, index);
        for issue in &issues {
            log::warn!("normalizer: {issue}");
        }
        batch.records.push(record);
        batch.issues.extend(issues);
    }
    batch
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
