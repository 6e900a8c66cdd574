use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single typed cell in a transaction record.
///
/// CSV ingestion coerces raw text into these per the catalog's declared
/// field type; the evaluator pattern-matches on the variant instead of
/// coercing at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// Numeric view, for the ordering operators and amount statistics.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Textual view, for substring matching. Dates render as ISO-8601
    /// so queries like "in 2020" can match against date fields.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            FieldValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One transaction: a flat field-name → value mapping.
///
/// Field order is preserved for display; the record set is loaded once
/// and treated as read-only for the lifetime of a session.
pub type Transaction = IndexMap<String, FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display_drops_trailing_fraction() {
        assert_eq!(FieldValue::Number(5.0).to_string(), "5");
        assert_eq!(FieldValue::Number(5.25).to_string(), "5.25");
    }

    #[test]
    fn date_as_text_is_iso() {
        let d = FieldValue::Date(NaiveDate::from_ymd_opt(2020, 3, 14).unwrap());
        assert_eq!(d.as_text().unwrap(), "2020-03-14");
    }

    #[test]
    fn text_has_no_numeric_view() {
        assert_eq!(FieldValue::Text("5".into()).as_number(), None);
    }

    #[test]
    fn untagged_serde_round_trip() {
        let tx: Transaction = [
            ("merchant".to_string(), FieldValue::Text("Starbucks".into())),
            ("amt".to_string(), FieldValue::Number(4.85)),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back["amt"].as_number(), Some(4.85));
        assert_eq!(back["merchant"], FieldValue::Text("Starbucks".into()));
    }
}
