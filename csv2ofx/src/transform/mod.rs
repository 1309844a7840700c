//! Transformation module.
//!
//! This module handles CSV to statement conversion:
//! - DSL: field rules, formats and the record decoder
//! - Pipeline: the streaming conversion driver

pub mod dsl;
pub mod pipeline;

pub use dsl::*;
pub use pipeline::*;
