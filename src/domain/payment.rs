use super::record::{Record, merge};
use crate::error::DeskError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Prefix of every generated transaction id.
pub const TRANSACTION_PREFIX: &str = "TXN";

/// A strictly positive monetary amount.
///
/// Serialized as a plain JSON number so snapshots stay readable by other
/// consumers of the same store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, DeskError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(DeskError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DeskError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| DeskError::Validation(format!("`{}` is not a valid amount", s)))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    /// Never written by `process`; accepted so externally edited snapshots load.
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processing => "Processing",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeskError::Validation(format!("unknown payment status `{}`", s)))
    }
}

/// A fee payment owed to a teacher for a class.
///
/// `transaction_id` is set if and only if the status is `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub amount: Amount,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl Payment {
    /// A freshly initiated payment awaiting processing.
    pub fn pending(
        id: String,
        teacher_id: String,
        class_id: String,
        amount: Amount,
        description: String,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            teacher_id,
            class_id,
            amount,
            date,
            status: PaymentStatus::Pending,
            description,
            transaction_id: None,
        }
    }

    /// Settles the payment successfully under the given transaction id.
    pub fn complete(&mut self, transaction_id: String) {
        self.status = PaymentStatus::Completed;
        self.transaction_id = Some(transaction_id);
    }

    /// Marks the payment as declined.
    pub fn fail(&mut self) {
        self.status = PaymentStatus::Failed;
        self.transaction_id = None;
    }

    /// True when the transaction id invariant holds.
    pub fn is_consistent(&self) -> bool {
        (self.status == PaymentStatus::Completed) == self.transaction_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentPatch {
    pub teacher_id: Option<String>,
    pub class_id: Option<String>,
    pub amount: Option<Amount>,
    pub date: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub description: Option<String>,
}

impl Record for Payment {
    const KEY: &'static str = "payments";
    type Patch = PaymentPatch;

    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    /// Merges the patch. Leaving `Completed` drops the transaction id; the
    /// ledger issues one when a patch moves a payment into `Completed`.
    fn apply(&mut self, patch: PaymentPatch) {
        merge(&mut self.teacher_id, patch.teacher_id);
        merge(&mut self.class_id, patch.class_id);
        merge(&mut self.amount, patch.amount);
        merge(&mut self.date, patch.date);
        merge(&mut self.status, patch.status);
        merge(&mut self.description, patch.description);
        if self.status != PaymentStatus::Completed {
            self.transaction_id = None;
        }
    }

    fn seed() -> Vec<Self> {
        let date = |d| NaiveDate::from_ymd_opt(2025, 6, d).unwrap_or_default();
        let mut seed = vec![
            Payment::pending(
                "1".to_string(),
                "1".to_string(),
                "1".to_string(),
                Amount(dec!(500)),
                "Payment for Grade 10 Calculus, June 2025".to_string(),
                date(15),
            ),
            Payment::pending(
                "2".to_string(),
                "2".to_string(),
                "2".to_string(),
                Amount(dec!(600)),
                "Payment for Grade 12 Physics, June 2025".to_string(),
                date(20),
            ),
            Payment::pending(
                "3".to_string(),
                "3".to_string(),
                "3".to_string(),
                Amount(dec!(450)),
                "Payment for Grade 10 English, June 2025".to_string(),
                date(25),
            ),
        ];
        seed[0].complete("TXN123456".to_string());
        seed[2].complete("TXN789012".to_string());
        seed
    }
}
