//! Specification catalog - the formats defined in one JSON document.
//!
//! The document lists formats under a `format` key:
//!
//! ```json
//! {"format": [{"name": "spv-kreditt", "curdef": "NOK", "comma": ";", "fields": {...}}]}
//! ```
//!
//! A catalog is loaded once and only read afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{CatalogError, CatalogResult};
use crate::transform::dsl::FormatSpec;
use crate::validation::{validate_document, validate_format};

/// Ordered collection of formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecCatalog {
    #[serde(rename = "format", default)]
    formats: Vec<FormatSpec>,
}

impl SpecCatalog {
    pub fn new(formats: Vec<FormatSpec>) -> Self {
        Self { formats }
    }

    /// Load and validate a specification document from disk.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        info!(path = %path.display(), formats = catalog.len(), "specification loaded");
        Ok(catalog)
    }

    /// Parse and validate a specification document.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed document and build the catalog.
    pub fn from_value(value: Value) -> CatalogResult<Self> {
        validate_document(&value).map_err(|errors| CatalogError::Schema { errors })?;

        let catalog: SpecCatalog = serde_json::from_value(value)?;
        for format in &catalog.formats {
            validate_format(format).map_err(|message| CatalogError::InvalidFormat {
                name: format.name.clone(),
                message,
            })?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Find a format by name.
    ///
    /// The first format with a matching name wins. An unknown name falls
    /// back to the first format in the document without error; only an
    /// empty catalog fails.
    pub fn find_format(&self, name: &str) -> CatalogResult<&FormatSpec> {
        if let Some(format) = self.formats.iter().find(|f| f.name == name) {
            return Ok(format);
        }
        let fallback = self.formats.first().ok_or(CatalogError::Empty)?;
        info!(requested = name, using = %fallback.name, "unknown format, using first");
        Ok(fallback)
    }

    pub fn formats(&self) -> &[FormatSpec] {
        &self.formats
    }

    /// Format names in document order.
    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
