//! Record decoder
//!
//! Applies a [`FormatSpec`] to one raw row to produce a [`TransactionRecord`].

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use super::format::FormatSpec;
use super::rule::{FieldRule, RawRow};
use crate::error::FieldError;
use crate::models::TransactionRecord;

/// A structural failure while decoding a row, with the field that hit it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}': {source}")]
pub struct DecodeError {
    pub field: &'static str,
    pub source: FieldError,
}

/// Decodes rows with one format.
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'a> {
    format: &'a FormatSpec,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(format: &'a FormatSpec) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &'a FormatSpec {
        self.format
    }

    /// Decode one row.
    ///
    /// Every field is evaluated independently. A date that does not parse
    /// becomes the empty date; a number that does not parse counts as zero.
    /// Only a short row (or a sum rule used as text/date) fails.
    pub fn decode<R: RawRow + ?Sized>(&self, row: &R) -> Result<TransactionRecord, DecodeError> {
        let fields = &self.format.fields;

        let amount = fields.trnamt.number(row).map_err(at("trnamt"))?;
        let posted_date = tolerant_date(&fields.dtposted, row, "dtposted")?;
        let user_date = tolerant_date(&fields.dtuser, row, "dtuser")?;
        let memo = fields.memo.text(row).map_err(at("memo"))?.to_string();

        Ok(TransactionRecord {
            amount,
            posted_date,
            user_date,
            memo,
        })
    }
}

fn at(field: &'static str) -> impl Fn(FieldError) -> DecodeError {
    move |source| DecodeError { field, source }
}

fn tolerant_date<R: RawRow + ?Sized>(
    rule: &FieldRule,
    row: &R,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, DecodeError> {
    match rule.date(row) {
        Ok(date) => Ok(Some(date)),
        Err(err) if err.is_structural() => Err(DecodeError { field, source: err }),
        Err(err) => {
            debug!(field, error = %err, "date replaced by empty date");
            Ok(None)
        }
    }
}
