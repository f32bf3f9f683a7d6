//! Ledger store invariant tests.
//!
//! Covers the load-bearing behaviors: identity merge and its first-match
//! tie-break, exact decimal totals, offsetting balance, tuple deletion,
//! rollback on failed saves, and validation rejections.

use crate::contact::ContactIdentity;
use crate::error::LedgerError;
use crate::record::{PaymentMethod, RecordId};
use crate::store::{LedgerStore, Submission, RECENT_LIMIT};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> (LedgerStore, PathBuf) {
    let path = dir.path().join("ledger.json");
    (LedgerStore::open(&path).unwrap(), path)
}

fn submission(im: &str, chat: &str, shop: &str, amount: Decimal) -> Submission {
    Submission {
        im: im.to_string(),
        chat: chat.to_string(),
        shop: shop.to_string(),
        method: PaymentMethod::Alipay,
        details: String::new(),
        amount,
        offsetting: false,
    }
}

// =============================================================================
// IDENTITY RESOLUTION
// =============================================================================

#[test]
fn merge_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    store.submit(submission("alice", "ali_chat", "shop9", dec!(10))).unwrap();
    store.submit(submission("alice", "ali_chat", "shop9", dec!(20))).unwrap();

    let contacts = store.known_contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].encode(), "alice$ali_chat$shop9");
}

#[test]
fn partial_submission_folds_into_canonical_identity() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    store.submit(submission("alice", "ali_chat", "shop9", dec!(10))).unwrap();
    // Marketplace handle only; must land under the full identity.
    let outcome = store.submit(submission("", "", "shop9", dec!(5))).unwrap();

    assert_eq!(outcome.contact.encode(), "alice$ali_chat$shop9");
    assert_eq!(store.known_contacts().len(), 1);
}

#[test]
fn first_match_tie_break_does_not_reconcile_split_identities() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    // Channels recorded separately: two distinct canonical identities.
    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    store.submit(submission("", "ali_chat", "shop9", dec!(20))).unwrap();
    assert_eq!(store.known_contacts().len(), 2);

    // Typed together later: first match (on the IM slot) wins wholesale.
    let outcome = store.submit(submission("alice", "ali_chat", "", dec!(30))).unwrap();
    assert_eq!(outcome.contact.encode(), "alice$$");

    // The split identities are NOT merged.
    assert_eq!(store.known_contacts().len(), 2);
}

#[test]
fn membership_is_exact_slot_equality() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    let outcome = store.submit(submission("ali", "", "", dec!(20))).unwrap();

    // "ali" is a substring of "alice" but not an equal slot value.
    assert_eq!(outcome.contact.encode(), "ali$$");
    assert_eq!(store.known_contacts().len(), 2);
}

#[test]
fn resolve_slots_fills_from_any_channel() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    store.submit(submission("alice", "ali_chat", "shop9", dec!(10))).unwrap();

    let full = store.resolve_slots("shop9").unwrap();
    assert_eq!(full.encode(), "alice$ali_chat$shop9");
    assert!(store.resolve_slots("nobody").is_none());
    assert!(store.resolve_slots("  ").is_none());
}

// =============================================================================
// SUBMISSION & VALIDATION
// =============================================================================

#[test]
fn empty_submission_rejected_without_mutation() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = open_store(&dir);

    let result = store.submit(submission("", "  ", "", dec!(10)));
    assert!(matches!(result, Err(LedgerError::Validation(_))));
    assert!(store.is_empty());
    assert!(!path.exists());
}

#[test]
fn delimiter_in_slot_rejected() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    let result = store.submit(submission("a$b", "", "", dec!(10)));
    assert!(matches!(result, Err(LedgerError::Validation(_))));
    assert!(store.is_empty());
}

#[test]
fn amounts_are_quantized_to_two_digits() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    let outcome = store.submit(submission("alice", "", "", dec!(10.005))).unwrap();
    assert_eq!(outcome.amount.to_string(), "10.01");
    assert_eq!(store.records()[0].amount.to_string(), "10.01");
}

#[test]
fn offsetting_pair_balances_to_zero() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    let outcome = store
        .submit(Submission {
            offsetting: true,
            ..submission("alice", "", "", dec!(50.00))
        })
        .unwrap();

    assert_eq!(outcome.record_ids.len(), 2);
    assert_eq!(store.len(), 2);

    let customer = &store.records()[0];
    let offset = &store.records()[1];
    assert_eq!(customer.amount + offset.amount, Decimal::ZERO);
    assert_eq!(offset.contact, ContactIdentity::internal());
    assert_eq!(offset.method, PaymentMethod::InternalTransfer);
    assert_eq!(offset.timestamp, customer.timestamp);
    assert_eq!(offset.details, customer.details);
}

#[test]
fn failed_save_rolls_submission_back() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("data");
    std::fs::create_dir(&sub).unwrap();
    let path = sub.join("ledger.json");
    let mut store = LedgerStore::open(&path).unwrap();
    store.submit(submission("alice", "", "", dec!(10))).unwrap();

    // Saving becomes impossible once the backing directory is gone.
    std::fs::remove_dir_all(&sub).unwrap();
    let result = store.submit(submission("bob", "", "", dec!(20)));

    assert!(matches!(result, Err(LedgerError::Io(_))));
    assert_eq!(store.len(), 1, "failed save must not commit in memory");
    assert_eq!(store.records()[0].contact.encode(), "alice$$");
}

// =============================================================================
// QUERIES & AGGREGATION
// =============================================================================

#[test]
fn query_total_is_exact_decimal_sum() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    for _ in 0..3 {
        store.submit(submission("alice", "", "", dec!(0.10))).unwrap();
        store.submit(submission("alice", "", "", dec!(0.20))).unwrap();
    }

    let query = store.query_contact("alice").unwrap();
    assert_eq!(query.records.len(), 6);
    assert_eq!(query.total.to_string(), "0.90");
}

#[test]
fn query_rejects_empty_but_reports_no_match_softly() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);
    store.submit(submission("alice", "", "", dec!(10))).unwrap();

    assert!(matches!(store.query_contact("   "), Err(LedgerError::Validation(_))));

    let query = store.query_contact("nobody").unwrap();
    assert!(query.records.is_empty());
    assert_eq!(query.total, Decimal::ZERO);
}

#[test]
fn totals_by_method_group_and_sort_by_name() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    store
        .submit(Submission {
            method: PaymentMethod::Wechat,
            ..submission("alice", "", "", dec!(0.10))
        })
        .unwrap();
    store
        .submit(Submission {
            method: PaymentMethod::Wechat,
            ..submission("alice", "", "", dec!(0.20))
        })
        .unwrap();
    store
        .submit(Submission {
            method: PaymentMethod::Alipay,
            ..submission("bob", "", "", dec!(-5.00))
        })
        .unwrap();

    let totals = store.totals_by_method();
    assert_eq!(totals.len(), 2);
    // Sorted by display name: "Alipay" < "WeChat".
    assert_eq!(totals[0].0, PaymentMethod::Alipay);
    assert_eq!(totals[0].1.to_string(), "-5.00");
    assert_eq!(totals[1].0, PaymentMethod::Wechat);
    assert_eq!(totals[1].1.to_string(), "0.30");
}

#[test]
fn recent_is_timestamp_descending_and_capped() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    for i in 0..(RECENT_LIMIT + 5) {
        store.submit(submission(&format!("c{}", i), "", "", dec!(1))).unwrap();
    }

    let recent = store.recent(RECENT_LIMIT);
    assert_eq!(recent.len(), RECENT_LIMIT);
    for pair in recent.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[test]
fn date_range_is_inclusive_and_soft_when_empty() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);
    store.submit(submission("alice", "", "", dec!(10))).unwrap();

    let today = store.records()[0].timestamp.date();
    assert_eq!(store.date_range(today, today).len(), 1);

    let tomorrow = today.succ_opt().unwrap();
    assert!(store.date_range(tomorrow, tomorrow).is_empty());
}

// =============================================================================
// DELETION
// =============================================================================

#[test]
fn delete_matching_removes_all_tuple_duplicates() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);

    // Two identical submissions in the same second share the full display
    // tuple; tuple deletion removes both by design.
    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    store.submit(submission("alice", "", "", dec!(10))).unwrap();

    let rec = store.records()[0].clone();
    if store.records()[1].timestamp != rec.timestamp {
        // Crossed a second boundary; duplicate-tuple semantics don't apply.
        return;
    }

    let removed = store
        .delete_matching("alice$$", rec.method, &rec.details, &rec.display_timestamp())
        .unwrap();
    assert_eq!(removed, 2);
    assert!(store.is_empty());
}

#[test]
fn delete_of_absent_tuple_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = open_store(&dir);
    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    let saved = std::fs::read(&path).unwrap();

    let removed = store
        .delete_matching("ghost$$", PaymentMethod::Alipay, "", "2020-01-01 00:00:00")
        .unwrap();

    assert_eq!(removed, 0);
    assert_eq!(store.len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), saved, "no-op delete must not rewrite");
}

#[test]
fn delete_by_id_removes_exactly_one_row() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = open_store(&dir);
    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    store.submit(submission("alice", "", "", dec!(10))).unwrap();

    let id = store.records()[0].id;
    assert!(store.delete_by_id(id).unwrap());
    assert_eq!(store.len(), 1);
    assert!(!store.delete_by_id(RecordId(9999)).unwrap());
}

#[test]
fn failed_save_rolls_deletion_back() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("data");
    std::fs::create_dir(&sub).unwrap();
    let path = sub.join("ledger.json");
    let mut store = LedgerStore::open(&path).unwrap();
    store.submit(submission("alice", "", "", dec!(10))).unwrap();
    let id = store.records()[0].id;

    std::fs::remove_dir_all(&sub).unwrap();
    assert!(store.delete_by_id(id).is_err());
    assert_eq!(store.len(), 1, "failed save must not commit the deletion");
}

// =============================================================================
// PERSISTENCE ROUND-TRIP
// =============================================================================

#[test]
fn reopened_store_matches_field_for_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");

    let mut store = LedgerStore::open(&path).unwrap();
    store.submit(submission("alice", "ali_chat", "", dec!(0.10))).unwrap();
    store
        .submit(Submission {
            method: PaymentMethod::Pinduoduo,
            details: "refund, broken seal".to_string(),
            offsetting: true,
            ..submission("bob", "", "", dec!(-7.50))
        })
        .unwrap();

    let reopened = LedgerStore::open(&path).unwrap();
    assert_eq!(reopened.records(), store.records());
    assert_eq!(reopened.records()[1].amount.to_string(), "-7.50");
    assert_eq!(reopened.records()[0].contact.encode(), "alice$ali_chat$");
}
