//! Ledger records and the closed payment-method set.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::contact::ContactIdentity;
use crate::error::LedgerError;

/// Display/round-trip format for record timestamps (second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Closed set of payment methods. `InternalTransfer` is the marker for the
/// offsetting entries a merchant books against their own fund movements; it
/// is never a customer-facing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Wechat,
    Taobao,
    Alipay,
    Jd,
    Pinduoduo,
    InternalTransfer,
}

impl PaymentMethod {
    /// All methods, in entry-form order.
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Wechat,
        PaymentMethod::Taobao,
        PaymentMethod::Alipay,
        PaymentMethod::Jd,
        PaymentMethod::Pinduoduo,
        PaymentMethod::InternalTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wechat => "WeChat",
            PaymentMethod::Taobao => "Taobao",
            PaymentMethod::Alipay => "Alipay",
            PaymentMethod::Jd => "JD",
            PaymentMethod::Pinduoduo => "Pinduoduo",
            PaymentMethod::InternalTransfer => "(internal transfer)",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        for method in Self::ALL {
            if method.as_str().to_ascii_lowercase() == normalized {
                return Ok(method);
            }
        }
        match normalized.as_str() {
            "wechat" => Ok(PaymentMethod::Wechat),
            "taobao" => Ok(PaymentMethod::Taobao),
            "alipay" => Ok(PaymentMethod::Alipay),
            "jd" => Ok(PaymentMethod::Jd),
            "pinduoduo" | "pdd" => Ok(PaymentMethod::Pinduoduo),
            "internal" | "internal transfer" => Ok(PaymentMethod::InternalTransfer),
            _ => Err(LedgerError::Validation(format!("unknown payment method: {:?}", s))),
        }
    }
}

/// Session-local surrogate id for a record. Assigned at creation or load,
/// never persisted; exists so a row can be deleted unambiguously even when
/// its display tuple collides with another row's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

/// One ledger entry. Never mutated in place after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub contact: ContactIdentity,
    pub method: PaymentMethod,
    pub details: String,
    pub amount: Decimal,
    pub timestamp: NaiveDateTime,
}

impl Record {
    /// Timestamp in the fixed display format used by tables, deletion keys,
    /// and the backing file.
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// True when this record's display tuple matches the given deletion key.
    pub fn matches_key(
        &self,
        contact: &str,
        method: PaymentMethod,
        details: &str,
        timestamp: &str,
    ) -> bool {
        self.method == method
            && self.details == details
            && self.contact.encode() == contact
            && self.display_timestamp() == timestamp
    }
}
