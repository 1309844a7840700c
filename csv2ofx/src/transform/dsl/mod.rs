//! Field-mapping DSL for bank CSV exports.
//!
//! This module provides:
//! - `rule`: [`FieldRule`], one possibly-recursive column rule
//! - `format`: [`FormatSpec`], a named dialect bundling six rules
//! - `decoder`: [`RecordDecoder`], applies a format to one raw row
//!
//! ## Usage Flow
//!
//! ```text
//! specs.json → SpecCatalog → FormatSpec → RecordDecoder::decode(row) → TransactionRecord
//! ```
//!
//! ## Example
//!
//! ```rust
//! use csv2ofx::transform::dsl::{example_format, RecordDecoder};
//!
//! let format = example_format();
//! let row = ["01.02.2024", "31.01.2024", "Rema 1000", "149,90", ""];
//! let record = RecordDecoder::new(&format).decode(&row[..]).unwrap();
//! assert_eq!(record.amount, -149.9);
//! ```

pub mod decoder;
pub mod format;
pub mod rule;

pub use decoder::{DecodeError, RecordDecoder};
pub use format::{example_format, FieldSpec, FormatSpec};
pub use rule::{parse_number, DatePattern, FieldRule, LossyRecord, RawRow};
