//! The ledger store.
//!
//! Owns the full in-memory record collection and the backing file path.
//! Every mutating operation rewrites the whole file synchronously before it
//! returns; a failed save rolls the in-memory collection back so memory
//! never diverges from disk. Single writer, single reader, no locking.
//!
//! # Identity merge rule
//!
//! On submit, each non-empty input slot value is checked against every
//! stored identity in store order (exact slot equality). The first stored
//! identity containing any of the values becomes the record's canonical
//! identity wholesale, even where the submission left slots blank. The
//! first-match tie-break is deliberate: channels recorded separately before
//! ever being typed together stay under whichever identity the scan finds
//! first, and are not reconciled.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::amount;
use crate::contact::ContactIdentity;
use crate::error::LedgerError;
use crate::persist;
use crate::record::{PaymentMethod, Record, RecordId};

/// Rows shown by the recent view.
pub const RECENT_LIMIT: usize = 50;

/// One submission from the entry form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub im: String,
    pub chat: String,
    pub shop: String,
    pub method: PaymentMethod,
    pub details: String,
    pub amount: Decimal,
    /// Book a second, negated record under the internal sentinel so the
    /// merchant's own fund movement nets to zero in aggregate totals.
    pub offsetting: bool,
}

/// What a submission resolved to; enough for the caller to render a receipt.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub contact: ContactIdentity,
    pub amount: Decimal,
    pub timestamp: NaiveDateTime,
    pub record_ids: Vec<RecordId>,
}

/// Result of a contact query: matching rows in store order plus their
/// exact decimal sum. Zero rows is a valid soft state, not an error.
#[derive(Debug, Clone)]
pub struct ContactQuery {
    pub records: Vec<Record>,
    pub total: Decimal,
}

/// The in-memory ledger plus its backing file.
pub struct LedgerStore {
    path: PathBuf,
    records: Vec<Record>,
    next_id: u64,
}

impl LedgerStore {
    /// Open the ledger at `path`, loading the backing file if it exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let records = persist::load(&path)?;
        let next_id = records.last().map(|r| r.id.0 + 1).unwrap_or(1);
        Ok(Self {
            path,
            records,
            next_id,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Submit one entry (and, when offsetting, its paired internal record).
    /// Not committed until the backing file has been rewritten.
    pub fn submit(&mut self, submission: Submission) -> Result<SubmitOutcome, LedgerError> {
        let candidate =
            ContactIdentity::from_slots(&submission.im, &submission.chat, &submission.shop)?;
        if candidate.is_empty() {
            return Err(LedgerError::Validation(
                "at least one contact handle is required".to_string(),
            ));
        }

        let contact = self.resolve_identity(&candidate);
        let value = amount::quantize(submission.amount);
        let timestamp = now_seconds();

        let before = self.records.len();
        let mut record_ids = Vec::with_capacity(2);

        record_ids.push(self.append(Record {
            id: RecordId(0), // assigned by append
            contact: contact.clone(),
            method: submission.method,
            details: submission.details.trim().to_string(),
            amount: value,
            timestamp,
        }));

        if submission.offsetting {
            record_ids.push(self.append(Record {
                id: RecordId(0),
                contact: ContactIdentity::internal(),
                method: PaymentMethod::InternalTransfer,
                details: submission.details.trim().to_string(),
                amount: -value,
                timestamp,
            }));
        }

        if let Err(e) = self.save() {
            self.records.truncate(before);
            return Err(e);
        }

        info!(
            "recorded {} {} for {} ({} rows)",
            value,
            submission.method,
            contact,
            record_ids.len()
        );
        Ok(SubmitOutcome {
            contact,
            amount: value,
            timestamp,
            record_ids,
        })
    }

    /// All records whose identity contains the trimmed value in any slot,
    /// with their exact total. Empty input is a validation error; zero
    /// matches is not.
    pub fn query_contact(&self, raw: &str) -> Result<ContactQuery, LedgerError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(LedgerError::Validation("query contact is empty".to_string()));
        }

        let records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.contact.contains(value))
            .cloned()
            .collect();
        let total = amount::sum(records.iter().map(|r| &r.amount));
        debug!("contact query {:?}: {} rows, total {}", value, records.len(), total);
        Ok(ContactQuery { records, total })
    }

    /// Most recent rows, timestamp descending, at most `limit`. Ties keep
    /// store order.
    pub fn recent(&self, limit: usize) -> Vec<Record> {
        let mut rows: Vec<Record> = self.records.clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit);
        rows
    }

    /// Per-method exact totals, sorted by method display name.
    pub fn totals_by_method(&self) -> Vec<(PaymentMethod, Decimal)> {
        let mut totals: Vec<(PaymentMethod, Decimal)> = Vec::new();
        for method in PaymentMethod::ALL {
            let amounts: Vec<&Decimal> = self
                .records
                .iter()
                .filter(|r| r.method == method)
                .map(|r| &r.amount)
                .collect();
            if !amounts.is_empty() {
                totals.push((method, amount::sum(amounts)));
            }
        }
        totals.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        totals
    }

    /// Records whose timestamp's date falls in the inclusive [start, end]
    /// range, in store order. Empty is a valid soft result.
    pub fn date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| {
                let date = r.timestamp.date();
                date >= start && date <= end
            })
            .cloned()
            .collect()
    }

    /// Deduplicated canonical identities, sorted by encoded form. Feeds
    /// contact prefill in the entry form.
    pub fn known_contacts(&self) -> Vec<ContactIdentity> {
        let mut contacts: Vec<ContactIdentity> =
            self.records.iter().map(|r| r.contact.clone()).collect();
        contacts.sort_by_key(|c| c.encode());
        contacts.dedup();
        contacts
    }

    /// Pure slot auto-fill: the full canonical identity of the first stored
    /// record containing `value` in any slot, if one exists. Called by the
    /// entry form on every slot edit.
    pub fn resolve_slots(&self, value: &str) -> Option<ContactIdentity> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.contact.contains(value))
            .map(|r| r.contact.clone())
    }

    /// Remove every record whose display tuple equals the given key.
    /// Same-second duplicates sharing the full tuple all go; that is the
    /// intended bulk semantics of tuple deletion. Returns the number of
    /// rows removed; zero matches is a no-op that leaves the file untouched.
    pub fn delete_matching(
        &mut self,
        contact: &str,
        method: PaymentMethod,
        details: &str,
        timestamp: &str,
    ) -> Result<usize, LedgerError> {
        self.delete_where(|r| r.matches_key(contact, method, details, timestamp))
    }

    /// Remove exactly the record with the given surrogate id, if present.
    pub fn delete_by_id(&mut self, id: RecordId) -> Result<bool, LedgerError> {
        Ok(self.delete_where(|r| r.id == id)? > 0)
    }

    fn delete_where<F: Fn(&Record) -> bool>(&mut self, matches: F) -> Result<usize, LedgerError> {
        let removed = self.records.iter().filter(|r| matches(*r)).count();
        if removed == 0 {
            return Ok(0);
        }

        let original = std::mem::take(&mut self.records);
        self.records = original.iter().filter(|r| !matches(*r)).cloned().collect();

        if let Err(e) = self.save() {
            self.records = original;
            return Err(e);
        }
        info!("deleted {} record(s), {} remain", removed, self.records.len());
        Ok(removed)
    }

    /// First-match identity resolution; see the module docs for the rule.
    fn resolve_identity(&self, candidate: &ContactIdentity) -> ContactIdentity {
        for value in candidate.slots() {
            if value.is_empty() {
                continue;
            }
            if let Some(existing) = self.records.iter().find(|r| r.contact.contains(value)) {
                debug!("merging submission into existing identity {}", existing.contact);
                return existing.contact.clone();
            }
        }
        candidate.clone()
    }

    fn append(&mut self, mut record: Record) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        record.id = id;
        self.records.push(record);
        id
    }

    fn save(&self) -> Result<(), LedgerError> {
        persist::save_atomic(&self.path, &self.records)
    }
}

/// Current local time truncated to whole seconds, matching the precision of
/// the display format and the backing file.
fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
