//! CSV ingestion of transaction records.
//!
//! Reads a headered CSV, resolves each column against the field catalog
//! (aliases allowed), and coerces cells into typed [`FieldValue`]s per
//! the declared field type. The result is the read-only in-memory record
//! set the query pipeline evaluates against.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use spendlens_catalog::{FieldCatalog, ValueType};
use spendlens_core::{FieldValue, Transaction};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no catalog field matches any CSV column")]
    NoUsableColumns,
    #[error("row {row}, column '{column}': cannot read '{value}' as {expected}")]
    Coerce {
        row: usize,
        column: String,
        value: String,
        expected: ValueType,
    },
}

/// Load transactions from a CSV file on disk.
pub fn load_transactions(path: &Path, catalog: &FieldCatalog) -> Result<Vec<Transaction>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let records = read_transactions(file, catalog)?;
    info!("Loaded {} transactions from {}", records.len(), path.display());
    Ok(records)
}

/// Read transactions from any CSV source with a header row.
pub fn read_transactions<R: io::Read>(
    reader: R,
    catalog: &FieldCatalog,
) -> Result<Vec<Transaction>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Map each CSV column to a catalog field and its declared type;
    // unresolvable columns are skipped and logged once.
    let headers = csv_reader.headers()?.clone();
    let columns: Vec<Option<(&'static str, ValueType)>> = headers
        .iter()
        .map(|h| {
            let resolved = catalog
                .resolve_field(h)
                .and_then(|name| catalog.descriptor(name).map(|d| (name, d.value_type)));
            if resolved.is_none() {
                warn!(column = h, "CSV column not in catalog, skipping");
            }
            resolved
        })
        .collect();

    if columns.iter().all(Option::is_none) {
        return Err(IngestError::NoUsableColumns);
    }

    let mut transactions = Vec::new();
    for (row_index, result) in csv_reader.records().enumerate() {
        let row = result?;
        let mut transaction = Transaction::new();
        for (cell, column) in row.iter().zip(&columns) {
            let Some((name, value_type)) = column else { continue };
            let value = coerce(cell, *value_type).ok_or_else(|| IngestError::Coerce {
                row: row_index + 2, // 1-based, after the header
                column: name.to_string(),
                value: cell.to_string(),
                expected: *value_type,
            })?;
            transaction.insert(name.to_string(), value);
        }
        transactions.push(transaction);
    }

    Ok(transactions)
}

fn coerce(cell: &str, value_type: ValueType) -> Option<FieldValue> {
    match value_type {
        ValueType::Text => Some(FieldValue::Text(cell.to_string())),
        ValueType::Number => cell.parse::<f64>().ok().map(FieldValue::Number),
        ValueType::Date => parse_date(cell).map(FieldValue::Date),
        ValueType::DateTime => parse_datetime(cell).map(FieldValue::DateTime),
    }
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%d/%m/%Y"))
        .ok()
}

fn parse_datetime(cell: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%d/%m/%Y %H:%M"))
        .ok();
    match naive {
        Some(n) => Some(n.and_utc()),
        // A bare date still loads into a datetime column, at midnight.
        None => parse_date(cell).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
trans_num,date,merchant,category,amt,city,state,isFraud
a1,2020-06-01 09:15:00,Starbucks Coffee,food_dining,4.85,Austin,TX,0
b2,2020-06-02 18:30:00,Amazon,shopping_net,120.00,Dallas,TX,0
c3,2020-06-03 02:10:00,QuickCash,misc_net,900.00,Miami,FL,1
";

    fn catalog() -> FieldCatalog {
        FieldCatalog::transactions()
    }

    #[test]
    fn loads_and_coerces_all_rows() {
        let records = read_transactions(SAMPLE.as_bytes(), &catalog()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["amt"], FieldValue::Number(4.85));
        assert_eq!(records[2]["isFraud"], FieldValue::Number(1.0));
        assert_eq!(
            records[0]["merchant"],
            FieldValue::Text("Starbucks Coffee".into())
        );
        assert!(matches!(records[0]["date"], FieldValue::DateTime(_)));
    }

    #[test]
    fn header_aliases_resolve() {
        let csv = "amount,store\n9.99,Target\n";
        let records = read_transactions(csv.as_bytes(), &catalog()).unwrap();
        assert_eq!(records[0]["amt"], FieldValue::Number(9.99));
        assert_eq!(records[0]["merchant"], FieldValue::Text("Target".into()));
    }

    #[test]
    fn unknown_columns_are_skipped() {
        let csv = "amt,favorite_color\n5.00,teal\n";
        let records = read_transactions(csv.as_bytes(), &catalog()).unwrap();
        assert_eq!(records[0].len(), 1);
        assert!(records[0].contains_key("amt"));
    }

    #[test]
    fn no_usable_columns_is_an_error() {
        let csv = "foo,bar\n1,2\n";
        let err = read_transactions(csv.as_bytes(), &catalog()).unwrap_err();
        assert!(matches!(err, IngestError::NoUsableColumns));
    }

    #[test]
    fn bad_number_reports_row_and_column() {
        let csv = "amt\n5.00\nnot-a-number\n";
        let err = read_transactions(csv.as_bytes(), &catalog()).unwrap_err();
        match err {
            IngestError::Coerce { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "amt");
            }
            other => panic!("expected Coerce, got {}", other),
        }
    }

    #[test]
    fn bare_date_loads_into_datetime_column() {
        let csv = "date,amt\n2020-06-01,5.00\n";
        let records = read_transactions(csv.as_bytes(), &catalog()).unwrap();
        assert!(matches!(records[0]["date"], FieldValue::DateTime(_)));
    }
}
