//! # csv2ofx - bank CSV exports to OFX statements
//!
//! csv2ofx reads delimited bank exports and writes OFX 1.02 statements. The
//! mapping from columns to transaction fields is data: a JSON specification
//! document describes each bank dialect as a named format.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV rows  │────▶│   Parser    │────▶│  Transform  │────▶│     OFX     │
//! │ (any enc.)  │     │ (csv+decode)│     │ (rules DSL) │     │ (statement) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                ▲
//!                                         ┌─────────────┐
//!                                         │   Catalog   │
//!                                         │ (specs.json)│
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csv2ofx::{convert, Diagnostics, SpecCatalog};
//!
//! let catalog = SpecCatalog::load("specs.json").unwrap();
//! let format = catalog.find_format("spv-kreditt").unwrap();
//!
//! let input = std::fs::File::open("export.csv").unwrap();
//! let mut output = std::io::stdout();
//! let mut diagnostics = Diagnostics::new(std::io::stderr());
//! convert(input, &mut output, &mut diagnostics, format).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Transactions, statements and the payer identity
//! - [`catalog`] - Specification document loading and format lookup
//! - [`validation`] - Specification schema and structural checks
//! - [`parser`] - Delimited row reading with transcoding
//! - [`transform`] - Field rules, record decoding and the pipeline
//! - [`ofx`] - OFX statement writer
//! - [`streams`] - stdin/stdout or file selection
//! - [`logs`] - Diagnostic sink

// Core modules
pub mod error;
pub mod models;

// Specification
pub mod catalog;
pub mod validation;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod ofx;

// IO
pub mod logs;
pub mod streams;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError,
    CatalogResult,
    ConvertError,
    ConvertResult,
    FieldError,
    FieldResult,
    StreamError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    PayerIdentity,
    Statement,
    TransactionKind,
    TransactionRecord,
    DEFAULT_CURRENCY,
    round_cents,
};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use catalog::SpecCatalog;

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{
    DatePattern,
    DecodeError,
    FieldRule,
    FieldSpec,
    FormatSpec,
    LossyRecord,
    RawRow,
    RecordDecoder,
    example_format,
    parse_number,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert,
    ConversionPipeline,
    ConvertOptions,
    PipelineState,
};

// =============================================================================
// Re-exports - Output and IO
// =============================================================================

pub use logs::Diagnostics;
pub use ofx::{OfxWriter, StatementWriter};
pub use streams::StreamTarget;
