//! Field rules
//!
//! A [`FieldRule`] extracts one scalar value from a raw row. Leaf rules read a
//! single column; sum rules add up the numeric value of their children, to any
//! depth.
//!
//! In the specification document a rule is written as
//!
//! ```json
//! {"field": 3, "multiplier": -1.0, "dateformat": "%d.%m.%Y", "sum": []}
//! ```
//!
//! and a non-empty `sum` turns it into a sum rule.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldError, FieldResult};

// =============================================================================
// Raw rows
// =============================================================================

/// An ordered sequence of text tokens from one line of delimited input.
pub trait RawRow {
    fn len(&self) -> usize;

    fn token(&self, index: usize) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: AsRef<str>> RawRow for [S] {
    fn len(&self) -> usize {
        <[S]>::len(self)
    }

    fn token(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>, const N: usize> RawRow for [S; N] {
    fn len(&self) -> usize {
        N
    }

    fn token(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> RawRow for Vec<S> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn token(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

/// A byte record read as text.
///
/// Tokens are decoded on first access, so columns no rule reads are never
/// looked at. Invalid UTF-8 in a token becomes U+FFFD.
pub struct LossyRecord<'r> {
    record: &'r csv::ByteRecord,
    tokens: Vec<OnceCell<Cow<'r, str>>>,
}

impl<'r> LossyRecord<'r> {
    pub fn new(record: &'r csv::ByteRecord) -> Self {
        Self {
            record,
            tokens: (0..record.len()).map(|_| OnceCell::new()).collect(),
        }
    }
}

impl RawRow for LossyRecord<'_> {
    fn len(&self) -> usize {
        self.record.len()
    }

    fn token(&self, index: usize) -> Option<&str> {
        let bytes = self.record.get(index)?;
        let token = self.tokens.get(index)?.get_or_init(|| {
            let text = String::from_utf8_lossy(bytes);
            if let Cow::Owned(_) = text {
                debug!(column = index, "invalid UTF-8 replaced");
            }
            text
        });
        Some(&**token)
    }
}

fn token_at<R: RawRow + ?Sized>(row: &R, index: usize) -> FieldResult<&str> {
    row.token(index).ok_or(FieldError::MalformedRow {
        index,
        len: row.len(),
    })
}

// =============================================================================
// Date patterns
// =============================================================================

/// Tokens of a reference-time layout (`Mon Jan 2 15:04:05 MST 2006`).
/// Longer tokens come first so `2006` wins over `2`.
static REFERENCE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"January|Monday|2006|Z07:00|Z0700|-07:00|-0700|Jan|Mon|MST|_2|01|02|03|04|05|06|15|PM|pm|1|2")
        .expect("reference layout regex is valid")
});

/// A date pattern as written in the document, with its strftime equivalent.
///
/// Patterns containing `%` are strftime patterns. Anything else is read as a
/// reference layout, the notation older specification files use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl DatePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let strftime = if source.contains('%') {
            source.clone()
        } else {
            translate_reference_layout(&source)
        };
        Self { source, strftime }
    }

    /// The pattern as written in the document.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The chrono format string used for parsing.
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Parse a token. Date-only patterns yield midnight.
    pub fn parse(&self, value: &str) -> FieldResult<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, &self.strftime)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, &self.strftime)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| FieldError::DateParse {
                value: value.to_string(),
                format: self.source.clone(),
            })
    }
}

fn translate_reference_layout(layout: &str) -> String {
    REFERENCE_TOKEN
        .replace_all(layout, |caps: &Captures| {
            match &caps[0] {
                "January" => "%B",
                "Monday" => "%A",
                "2006" => "%Y",
                "Z07:00" | "Z0700" => "%#z",
                "-07:00" => "%:z",
                "-0700" => "%z",
                "Jan" => "%b",
                "Mon" => "%a",
                "MST" => "%Z",
                "_2" => "%e",
                "01" | "1" => "%m",
                "02" | "2" => "%d",
                "03" => "%I",
                "04" => "%M",
                "05" => "%S",
                "06" => "%y",
                "15" => "%H",
                "PM" | "pm" => "%p",
                other => other,
            }
            .to_string()
        })
        .into_owned()
}

// =============================================================================
// Field rules
// =============================================================================

/// Extraction rule for one logical output field.
///
/// A leaf rule without a `multiplier` key scales by 1.0, so the token is
/// taken as written. It is never 0; a document has to state `"multiplier": 0`
/// to zero a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFieldRule", into = "RawFieldRule")]
pub enum FieldRule {
    /// Reads column `index`.
    Leaf {
        index: usize,
        multiplier: f64,
        date_format: Option<DatePattern>,
    },
    /// Sum of the children's numeric values.
    Sum(Vec<FieldRule>),
}

impl FieldRule {
    /// Leaf rule over `index` with multiplier 1.0 and no date pattern.
    pub fn leaf(index: usize) -> Self {
        Self::Leaf {
            index,
            multiplier: 1.0,
            date_format: None,
        }
    }

    pub fn sum(children: Vec<FieldRule>) -> Self {
        Self::Sum(children)
    }

    /// Set the multiplier (no effect on sum rules).
    pub fn with_multiplier(mut self, value: f64) -> Self {
        if let Self::Leaf { multiplier, .. } = &mut self {
            *multiplier = value;
        }
        self
    }

    /// Set the date pattern (no effect on sum rules).
    pub fn with_date_format(mut self, pattern: &str) -> Self {
        if let Self::Leaf { date_format, .. } = &mut self {
            *date_format = Some(DatePattern::new(pattern));
        }
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Highest column index referenced anywhere in the rule.
    pub fn max_column(&self) -> Option<usize> {
        match self {
            Self::Leaf { index, .. } => Some(*index),
            Self::Sum(children) => children.iter().filter_map(FieldRule::max_column).max(),
        }
    }

    /// The token at the rule's column, verbatim.
    pub fn text<'r, R: RawRow + ?Sized>(&self, row: &'r R) -> FieldResult<&'r str> {
        match self {
            Self::Leaf { index, .. } => token_at(row, *index),
            Self::Sum(_) => Err(FieldError::CompositeField),
        }
    }

    /// The token at the rule's column parsed with the rule's date pattern.
    pub fn date<R: RawRow + ?Sized>(&self, row: &R) -> FieldResult<NaiveDateTime> {
        match self {
            Self::Leaf {
                index, date_format, ..
            } => {
                let value = token_at(row, *index)?;
                date_format
                    .as_ref()
                    .ok_or(FieldError::MissingDateFormat)?
                    .parse(value)
            }
            Self::Sum(_) => Err(FieldError::CompositeField),
        }
    }

    /// Numeric value of the rule.
    ///
    /// Unparseable tokens count as zero. Only a short row is an error.
    pub fn number<R: RawRow + ?Sized>(&self, row: &R) -> FieldResult<f64> {
        match self {
            Self::Leaf {
                index, multiplier, ..
            } => {
                let value = token_at(row, *index)?;
                let literal = parse_number(value).unwrap_or_else(|err| {
                    debug!(column = *index, error = %err, "numeric token replaced by 0");
                    0.0
                });
                Ok(literal * multiplier)
            }
            Self::Sum(children) => children
                .iter()
                .try_fold(0.0, |acc, child| -> FieldResult<f64> { Ok(acc + child.number(row)?) }),
        }
    }
}

/// Parse a decimal token, reading the first `,` as the decimal point.
pub fn parse_number(value: &str) -> FieldResult<f64> {
    value
        .replacen(',', ".", 1)
        .parse::<f64>()
        .map_err(|_| FieldError::NumericParse {
            value: value.to_string(),
        })
}

// =============================================================================
// Document representation
// =============================================================================

#[derive(Serialize, Deserialize)]
struct RawFieldRule {
    #[serde(default)]
    field: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dateformat: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sum: Vec<FieldRule>,

    #[serde(default = "default_multiplier")]
    multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

impl From<RawFieldRule> for FieldRule {
    fn from(raw: RawFieldRule) -> Self {
        if !raw.sum.is_empty() {
            return Self::Sum(raw.sum);
        }
        Self::Leaf {
            index: raw.field,
            multiplier: raw.multiplier,
            date_format: raw
                .dateformat
                .filter(|p| !p.is_empty())
                .map(DatePattern::new),
        }
    }
}

impl From<FieldRule> for RawFieldRule {
    fn from(rule: FieldRule) -> Self {
        match rule {
            FieldRule::Leaf {
                index,
                multiplier,
                date_format,
            } => Self {
                field: index,
                dateformat: date_format.map(|p| p.source),
                sum: Vec::new(),
                multiplier,
            },
            FieldRule::Sum(children) => Self {
                field: 0,
                dateformat: None,
                sum: children,
                multiplier: default_multiplier(),
            },
        }
    }
}
