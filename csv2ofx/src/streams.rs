//! Input and output stream selection.
//!
//! `-` selects stdin or stdout; anything else is a file path.

use std::convert::Infallible;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StreamError;

/// Argument value selecting the standard streams.
pub const STDIO_SENTINEL: &str = "-";

/// Where the CLI reads input or writes output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    Stdio,
    Path(PathBuf),
}

impl StreamTarget {
    pub fn is_stdio(&self) -> bool {
        matches!(self, Self::Stdio)
    }

    /// Open for reading. `Stdio` reads stdin.
    pub fn open_input(&self) -> Result<Box<dyn Read>, StreamError> {
        match self {
            Self::Stdio => Ok(Box::new(BufReader::new(io::stdin()))),
            Self::Path(path) => {
                let file = File::open(path).map_err(|source| StreamError::Open {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Create or truncate for writing. `Stdio` writes stdout.
    pub fn create_output(&self) -> Result<Box<dyn Write>, StreamError> {
        match self {
            Self::Stdio => Ok(Box::new(BufWriter::new(io::stdout()))),
            Self::Path(path) => {
                let file = File::create(path).map_err(|source| StreamError::Create {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

impl Default for StreamTarget {
    fn default() -> Self {
        Self::Stdio
    }
}

impl FromStr for StreamTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == STDIO_SENTINEL {
            Ok(Self::Stdio)
        } else {
            Ok(Self::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str(STDIO_SENTINEL),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
