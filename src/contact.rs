//! Composite contact identities.
//!
//! A customer is identified by up to three informal channel handles in fixed
//! slot order: instant-messaging handle, chat-app handle, marketplace shop
//! handle. The encoded form joins the three slots with `$`, which is why the
//! delimiter is banned from raw slot values. Once three handles have been
//! recorded together they stay linked under one canonical identity string;
//! see `LedgerStore::submit` for the merge rule.

use std::fmt;

use crate::error::LedgerError;

/// Reserved delimiter between slots in the encoded identity string.
pub const SLOT_DELIMITER: char = '$';

/// Slot value used for all three slots of the internal sentinel identity.
const INTERNAL_SLOT: &str = "internal";

/// A composite contact identity: three optional slots in fixed order.
/// Absent slots are literally empty strings, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactIdentity {
    pub im: String,
    pub chat: String,
    pub shop: String,
}

impl ContactIdentity {
    /// Build an identity from raw slot inputs, trimming surrounding
    /// whitespace. Rejects the reserved delimiter inside any slot.
    pub fn from_slots(im: &str, chat: &str, shop: &str) -> Result<Self, LedgerError> {
        let identity = Self {
            im: im.trim().to_string(),
            chat: chat.trim().to_string(),
            shop: shop.trim().to_string(),
        };
        for slot in identity.slots() {
            if slot.contains(SLOT_DELIMITER) {
                return Err(LedgerError::Validation(format!(
                    "contact handle may not contain {:?}: {:?}",
                    SLOT_DELIMITER, slot
                )));
            }
        }
        Ok(identity)
    }

    /// The fixed sentinel identity for self-offsetting internal entries.
    pub fn internal() -> Self {
        Self {
            im: INTERNAL_SLOT.to_string(),
            chat: INTERNAL_SLOT.to_string(),
            shop: INTERNAL_SLOT.to_string(),
        }
    }

    pub fn slots(&self) -> [&str; 3] {
        [&self.im, &self.chat, &self.shop]
    }

    /// True when all three slots are empty. An all-empty identity is not
    /// storable; submission rejects it up front.
    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(|s| s.is_empty())
    }

    /// Exact slot-value membership test. This is list membership, not a
    /// substring match: the query value must equal one of the slots.
    pub fn contains(&self, value: &str) -> bool {
        !value.is_empty() && self.slots().contains(&value)
    }

    /// Encoded form: the three slots joined by the reserved delimiter.
    pub fn encode(&self) -> String {
        format!("{}{}{}{}{}", self.im, SLOT_DELIMITER, self.chat, SLOT_DELIMITER, self.shop)
    }

    /// Decode an encoded identity string from the backing file.
    pub fn decode(encoded: &str) -> Result<Self, LedgerError> {
        let mut parts = encoded.split(SLOT_DELIMITER);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(im), Some(chat), Some(shop), None) => Ok(Self {
                im: im.to_string(),
                chat: chat.to_string(),
                shop: shop.to_string(),
            }),
            _ => Err(LedgerError::Corrupt(format!(
                "contact identity must have exactly three slots: {:?}",
                encoded
            ))),
        }
    }
}

impl fmt::Display for ContactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
