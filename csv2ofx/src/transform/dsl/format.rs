//! Format specifications
//!
//! A [`FormatSpec`] describes one input dialect: how rows are split and how
//! each output field is extracted from a row.

use serde::{Deserialize, Serialize};

use super::rule::FieldRule;
use crate::models::DEFAULT_CURRENCY;

/// One named row-to-transaction mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Identifier used to select the format on the command line.
    pub name: String,

    /// Currency written into the statement.
    #[serde(default)]
    pub curdef: String,

    /// Declared header rows. The pipeline always skips exactly one row.
    #[serde(rename = "skip-header", default)]
    pub skip_header: u64,

    /// Declared footer rows. Not applied.
    #[serde(rename = "skip-footer", default)]
    pub skip_footer: u64,

    /// Delimiter; only the first character is used.
    #[serde(default = "default_comma")]
    pub comma: String,

    /// Input encoding label (`windows-1252`, `iso-8859-1`, ...). UTF-8 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    pub fields: FieldSpec,
}

fn default_comma() -> String {
    ",".to_string()
}

/// The six field rules of a format.
///
/// `trntype` and `ftid` are carried for document compatibility; decoding
/// does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub trntype: FieldRule,
    pub dtposted: FieldRule,
    pub dtuser: FieldRule,
    pub trnamt: FieldRule,
    pub memo: FieldRule,
    pub ftid: FieldRule,
}

impl FieldSpec {
    /// All rules with their document names.
    pub fn named(&self) -> [(&'static str, &FieldRule); 6] {
        [
            ("trntype", &self.trntype),
            ("dtposted", &self.dtposted),
            ("dtuser", &self.dtuser),
            ("trnamt", &self.trnamt),
            ("memo", &self.memo),
            ("ftid", &self.ftid),
        ]
    }
}

impl FormatSpec {
    /// Parse a single format from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The delimiter character. An empty `comma` means `,`.
    pub fn delimiter(&self) -> char {
        self.comma.chars().next().unwrap_or(',')
    }

    /// Currency code for the statement, `NOK` when unset.
    pub fn currency(&self) -> &str {
        if self.curdef.is_empty() {
            DEFAULT_CURRENCY
        } else {
            &self.curdef
        }
    }

    /// Highest column index any rule read by the decoder references.
    pub fn required_columns(&self) -> usize {
        [
            &self.fields.dtposted,
            &self.fields.dtuser,
            &self.fields.trnamt,
            &self.fields.memo,
        ]
        .into_iter()
        .filter_map(FieldRule::max_column)
        .max()
        .map_or(0, |max| max + 1)
    }
}

/// Example format used in documentation and tests.
pub fn example_format() -> FormatSpec {
    FormatSpec {
        name: "spv-kreditt".to_string(),
        curdef: "NOK".to_string(),
        skip_header: 1,
        skip_footer: 0,
        comma: ";".to_string(),
        encoding: None,
        fields: FieldSpec {
            trntype: FieldRule::leaf(0),
            dtposted: FieldRule::leaf(0).with_date_format("%d.%m.%Y"),
            dtuser: FieldRule::leaf(1).with_date_format("%d.%m.%Y"),
            trnamt: FieldRule::sum(vec![
                FieldRule::leaf(3).with_multiplier(-1.0),
                FieldRule::leaf(4),
            ]),
            memo: FieldRule::leaf(2),
            ftid: FieldRule::leaf(0),
        },
    }
}
