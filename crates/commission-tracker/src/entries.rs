//! Sale entries: the in-memory model, commission math, and row normalization
//!
//! The hosted backend returns rows with snake_case keys while rows built by
//! older clients used camelCase. Both shapes are absorbed here and nowhere
//! else; the rest of the crate only sees `SaleEntry`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::constants;
use crate::error::ValidationError;
use crate::money::round2;

/// A row as exchanged with the backing store
pub type RawRow = serde_json::Map<String, Value>;

/// (persisted key, in-memory key) for every field that exists in both conventions
const FIELD_PAIRS: [(&str, &str); 4] = [
    ("staff_name", "staffName"),
    ("sales_amount", "salesAmount"),
    ("commission_rate", "commissionRate"),
    ("service_type", "serviceType"),
];

/// Opaque entry identifier (backends hand out integers or UUID strings)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(i64),
    Text(String),
}

impl EntryId {
    /// Placeholder id for an entry not yet confirmed by the store
    pub fn pending() -> Self {
        EntryId::Number(Utc::now().timestamp_millis())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntryId::Number),
            Value::String(s) if !s.is_empty() => Some(EntryId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            EntryId::Number(n) => Value::from(*n),
            EntryId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{}", n),
            EntryId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for EntryId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(EntryId::Number)
            .unwrap_or_else(|_| EntryId::Text(s.to_string())))
    }
}

/// One commissioned sale
#[derive(Debug, Clone, PartialEq)]
pub struct SaleEntry {
    pub id: EntryId,
    pub staff_name: String,
    pub sales_amount: f64,
    /// Unset means the default rate; never filled in on write
    pub commission_rate: Option<f64>,
    pub service_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// User input for creating or editing an entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInput {
    pub staff_name: String,
    pub sales_amount: f64,
    pub commission_rate: Option<f64>,
    pub service_type: Option<String>,
    pub date: NaiveDate,
}

impl EntryInput {
    /// Check amount and rate before anything reaches the store
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.staff_name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        check_amount(self.sales_amount)?;
        if let Some(rate) = self.commission_rate {
            check_rate(rate)?;
        }
        Ok(())
    }
}

/// Amounts must be finite and non-negative
fn check_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// Rates must lie in (0, 1]
fn check_rate(rate: f64) -> Result<f64, ValidationError> {
    if rate.is_nan() || rate <= 0.0 || rate > 1.0 {
        return Err(ValidationError::InvalidRate(rate));
    }
    Ok(rate)
}

// =============================================================================
// Commission
// =============================================================================

/// The stored rate, or the default when none was recorded
pub fn effective_rate(entry: &SaleEntry) -> f64 {
    entry
        .commission_rate
        .unwrap_or(constants::DEFAULT_COMMISSION_RATE)
}

/// Commission earned on one entry, rounded to cents
pub fn commission(entry: &SaleEntry) -> f64 {
    round2(entry.sales_amount * effective_rate(entry))
}

/// Rate as a whole percentage, e.g. "70%"
pub fn rate_label(entry: &SaleEntry) -> String {
    format!("{:.0}%", effective_rate(entry) * 100.0)
}

// =============================================================================
// Row Normalization
// =============================================================================

/// Merge both key conventions into the in-memory (camelCase) shape.
///
/// When a field appears under both keys the persisted (snake_case) value wins
/// unless it is null. Keys outside the mapped set pass through untouched.
pub fn normalize_row(raw: &RawRow) -> RawRow {
    let mut row = raw.clone();

    for (persisted, canonical) in FIELD_PAIRS {
        let value = match row.remove(persisted) {
            Some(v) if !v.is_null() => Some(v),
            _ => row.get(canonical).cloned(),
        };
        if let Some(v) = value {
            row.insert(canonical.to_string(), v);
        }
    }

    row
}

/// Parse a row in either key convention into a `SaleEntry`.
///
/// Amounts and rates outside their valid ranges are rejected like any other
/// malformed field.
pub fn normalize_field_names(raw: &RawRow) -> Result<SaleEntry, ValidationError> {
    let row = normalize_row(raw);

    let id = row
        .get("id")
        .and_then(EntryId::from_value)
        .ok_or(ValidationError::MissingField("id"))?;

    let staff_name = match row.get("staffName") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => return Err(ValidationError::MissingField("staffName")),
        Some(other) => {
            return Err(ValidationError::InvalidField {
                field: "staffName",
                value: other.to_string(),
            });
        }
    };

    let sales_amount = decimal_field(&row, "salesAmount")?
        .ok_or(ValidationError::MissingField("salesAmount"))
        .and_then(check_amount)?;
    let commission_rate = decimal_field(&row, "commissionRate")?
        .map(check_rate)
        .transpose()?;

    let service_type = match row.get("serviceType") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    let timestamp = match row.get("timestamp") {
        Some(Value::String(s)) => parse_timestamp(s)?,
        _ => return Err(ValidationError::MissingField("timestamp")),
    };

    Ok(SaleEntry {
        id,
        staff_name,
        sales_amount,
        commission_rate,
        service_type,
        timestamp,
    })
}

/// Persisted shape for inserts and updates (snake_case, no id)
pub fn to_persisted_shape(entry: &SaleEntry) -> RawRow {
    let mut row = RawRow::new();
    row.insert("staff_name".into(), Value::from(entry.staff_name.as_str()));
    row.insert("sales_amount".into(), Value::from(entry.sales_amount));
    if let Some(rate) = entry.commission_rate {
        row.insert("commission_rate".into(), Value::from(rate));
    }
    if let Some(service) = &entry.service_type {
        row.insert("service_type".into(), Value::from(service.as_str()));
    }
    row.insert(
        "timestamp".into(),
        Value::from(format_timestamp(&entry.timestamp)),
    );
    row
}

/// In-memory shape including the id (what `normalize_row` produces)
pub fn to_canonical_row(entry: &SaleEntry) -> RawRow {
    let mut row = to_persisted_shape(entry);
    row.insert("id".into(), entry.id.to_value());
    for (persisted, canonical) in FIELD_PAIRS {
        if let Some(v) = row.remove(persisted) {
            row.insert(canonical.to_string(), v);
        }
    }
    row
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accept RFC 3339 or Postgres `timestamptz` text
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp(s.to_string()))
}

/// Numeric field that may arrive as a JSON number or a numeric string
fn decimal_field(row: &RawRow, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(ValidationError::InvalidField {
            field,
            value: n.to_string(),
        }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidField {
                field,
                value: s.clone(),
            }),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}
