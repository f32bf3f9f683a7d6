//! Spreadsheet-style tabular export.
//!
//! The store hands over a date-range slice; this writes it as a five-column
//! CSV table. A write failure is surfaced as an export error and never
//! touches ledger state.

use std::path::Path;

use tracing::info;

use crate::error::LedgerError;
use crate::record::Record;

const HEADER: [&str; 5] = ["contacts", "payment_method", "details", "amount", "timestamp"];

/// Write `records` as a CSV table at `path`.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for rec in records {
        writer.write_record([
            rec.contact.encode().as_str(),
            rec.method.as_str(),
            rec.details.as_str(),
            rec.amount.to_string().as_str(),
            rec.display_timestamp().as_str(),
        ])?;
    }
    writer.flush().map_err(LedgerError::Io)?;
    info!("exported {} records to {}", records.len(), path.display());
    Ok(())
}
