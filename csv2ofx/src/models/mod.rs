//! Domain models produced by the conversion pipeline.
//!
//! - [`TransactionRecord`] - one decoded transaction
//! - [`Statement`] - the ordered transaction list handed to the serializer
//! - [`PayerIdentity`] - account and bank written into every statement
//! - [`TransactionKind`] - OFX transaction type derived from the amount sign

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Currency used when a format leaves `curdef` empty.
pub const DEFAULT_CURRENCY: &str = "NOK";

/// Round to two decimals, folding `-0.00` into `0.00`.
pub fn round_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// One canonical decoded transaction.
///
/// Dates that failed to parse are `None` (the empty date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub posted_date: Option<NaiveDateTime>,
    pub user_date: Option<NaiveDateTime>,
    pub memo: String,
}

impl TransactionRecord {
    pub fn kind(&self) -> TransactionKind {
        TransactionKind::from_amount(self.amount)
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {:.2} posted={} user={} memo={:?}}}",
            self.kind(),
            self.amount,
            DisplayDate(self.posted_date),
            DisplayDate(self.user_date),
            self.memo
        )
    }
}

struct DisplayDate(Option<NaiveDateTime>);

impl fmt::Display for DisplayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => f.write_str("-"),
        }
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// OFX `TRNTYPE` values the serializer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Sign of the amount as written, i.e. after rounding to cents.
    pub fn from_amount(amount: f64) -> Self {
        if round_cents(amount) < 0.0 {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    pub fn as_ofx(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ofx())
    }
}

// =============================================================================
// Payer Identity
// =============================================================================

/// Account and bank attached to every produced statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerIdentity {
    pub account: String,
    pub bank: String,
}

impl Default for PayerIdentity {
    fn default() -> Self {
        Self {
            account: "0000000000".to_string(),
            bank: "Sbanken".to_string(),
        }
    }
}

// =============================================================================
// Statement
// =============================================================================

/// The structured transaction list handed to a
/// [`StatementWriter`](crate::StatementWriter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub currency: String,
    pub payer: PayerIdentity,
    pub transactions: Vec<TransactionRecord>,
}

impl Statement {
    /// Earliest and latest posted dates, ignoring empty dates.
    pub fn posted_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut dates = self.transactions.iter().filter_map(|t| t.posted_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    pub fn total(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

/// Single-line summary of the whole statement, written to the diagnostic sink.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Statement {} account={} bank={} transactions={} [",
            self.currency,
            self.payer.account,
            self.payer.bank,
            self.transactions.len()
        )?;
        for (i, tx) in self.transactions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{tx}")?;
        }
        f.write_str("]")
    }
}
