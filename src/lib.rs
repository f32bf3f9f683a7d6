//! Tillbook - Merchant Transaction Ledger
//!
//! Records manual payment/refund transactions and looks them up by informal
//! contact identifiers (IM handle, chat-app handle, marketplace handle).
//! The core is the ledger store: contact identity resolution and merging,
//! exact-decimal query/aggregation, and a crash-consistent columnar backing
//! file rewritten atomically after every mutation.

pub mod amount;
pub mod contact;
pub mod error;
pub mod export;
pub mod persist;
pub mod record;
pub mod store;

#[cfg(test)]
mod store_tests;

pub use contact::ContactIdentity;
pub use error::LedgerError;
pub use record::{PaymentMethod, Record, RecordId};
pub use store::{ContactQuery, LedgerStore, Submission, SubmitOutcome};
