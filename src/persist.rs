//! Columnar backing-file persistence.
//!
//! The whole record collection is written as one document of five parallel
//! typed columns. Amounts are serialized as decimal strings, so a value
//! never round-trips through binary floating point. Saves go to a temporary
//! file in the destination directory and are renamed over the target, so a
//! crash mid-write leaves the previous file intact and loadable.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amount;
use crate::contact::ContactIdentity;
use crate::error::LedgerError;
use crate::record::{Record, RecordId, TIMESTAMP_FORMAT};

/// On-disk schema: five columns of equal length, one row per record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerColumns {
    contacts: Vec<String>,
    payment_methods: Vec<String>,
    details: Vec<String>,
    amounts: Vec<Decimal>,
    timestamps: Vec<String>,
}

impl LedgerColumns {
    fn from_records(records: &[Record]) -> Self {
        let mut columns = Self::default();
        for rec in records {
            columns.contacts.push(rec.contact.encode());
            columns.payment_methods.push(rec.method.as_str().to_string());
            columns.details.push(rec.details.clone());
            columns.amounts.push(rec.amount);
            columns.timestamps.push(rec.display_timestamp());
        }
        columns
    }

    fn into_records(self) -> Result<Vec<Record>, LedgerError> {
        let rows = self.contacts.len();
        if self.payment_methods.len() != rows
            || self.details.len() != rows
            || self.amounts.len() != rows
            || self.timestamps.len() != rows
        {
            return Err(LedgerError::Corrupt(
                "column lengths differ".to_string(),
            ));
        }

        let mut records = Vec::with_capacity(rows);
        for (i, contact) in self.contacts.iter().enumerate() {
            let contact = ContactIdentity::decode(contact)?;
            let method = self.payment_methods[i]
                .parse()
                .map_err(|_| LedgerError::Corrupt(format!(
                    "row {}: unknown payment method {:?}",
                    i, self.payment_methods[i]
                )))?;
            let timestamp =
                NaiveDateTime::parse_from_str(&self.timestamps[i], TIMESTAMP_FORMAT).map_err(
                    |_| LedgerError::Corrupt(format!(
                        "row {}: bad timestamp {:?}",
                        i, self.timestamps[i]
                    )),
                )?;
            records.push(Record {
                // Ids are per-session and positional; the store takes over
                // assignment for rows added after load.
                id: RecordId(i as u64 + 1),
                contact,
                method,
                details: self.details[i].clone(),
                amount: amount::quantize(self.amounts[i]),
                timestamp,
            });
        }
        Ok(records)
    }
}

/// Load the full record collection. A missing file is an empty ledger,
/// never an error.
pub fn load(path: &Path) -> Result<Vec<Record>, LedgerError> {
    if !path.exists() {
        info!("no ledger file at {}, starting empty", path.display());
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path)?;
    let columns: LedgerColumns = serde_json::from_slice(&bytes)?;
    let records = columns.into_records()?;
    info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Serialize the full collection and atomically replace the backing file.
pub fn save_atomic(path: &Path, records: &[Record]) -> Result<(), LedgerError> {
    let columns = LedgerColumns::from_records(records);

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut tmp, &columns)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| LedgerError::Io(e.error))?;

    debug!("saved {} records to {}", records.len(), path.display());
    Ok(())
}
