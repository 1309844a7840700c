//! Delimited row reading with optional transcoding.
//!
//! Rows are read with the `csv` crate, so quoted fields and embedded
//! delimiters behave as in any CSV export. Bank exports that are not UTF-8
//! are transcoded on the fly by [`DecodingReader`], one buffer at a time.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

use crate::error::{CatalogError, CatalogResult};
use crate::transform::dsl::FormatSpec;

const BUFFER_SIZE: usize = 8 * 1024;

/// Resolve an encoding label. `None` means the input is read as UTF-8.
pub fn resolve_encoding(label: Option<&str>) -> Result<Option<&'static Encoding>, String> {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return Ok(None);
    };
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) if encoding == UTF_8 => Ok(None),
        Some(encoding) => Ok(Some(encoding)),
        None => Err(format!("unknown encoding '{}'", label)),
    }
}

/// The delimiter as a byte, as the CSV reader needs it.
pub fn delimiter_byte(delimiter: char) -> Result<u8, String> {
    match delimiter {
        '"' | '\n' | '\r' => Err(format!("delimiter {:?} is not allowed", delimiter)),
        c if c.is_ascii() => Ok(c as u8),
        c => Err(format!("delimiter {:?} is not a single-byte character", c)),
    }
}

/// Build a row reader for `format` over `input`.
///
/// No row is treated as a header here and rows may differ in length; short
/// rows are reported by the decoder.
pub fn row_reader<'r, R: Read + 'r>(
    input: R,
    format: &FormatSpec,
) -> CatalogResult<csv::Reader<Box<dyn Read + 'r>>> {
    let invalid = |message: String| CatalogError::InvalidFormat {
        name: format.name.clone(),
        message,
    };
    let delimiter = delimiter_byte(format.delimiter()).map_err(invalid)?;
    let encoding = resolve_encoding(format.encoding.as_deref()).map_err(invalid)?;

    let source: Box<dyn Read + 'r> = match encoding {
        Some(encoding) => Box::new(DecodingReader::new(input, encoding)),
        None => Box::new(input),
    };

    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(source))
}

/// Transcodes a byte stream to UTF-8 as it is read.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Vec<u8>,
    input_pos: usize,
    input_len: usize,
    output: Vec<u8>,
    output_pos: usize,
    output_len: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder(),
            input: vec![0; BUFFER_SIZE],
            input_pos: 0,
            input_len: 0,
            output: vec![0; BUFFER_SIZE * 3],
            output_pos: 0,
            output_len: 0,
            eof: false,
            finished: false,
        }
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.output_pos < self.output_len {
                let n = buf.len().min(self.output_len - self.output_pos);
                buf[..n].copy_from_slice(&self.output[self.output_pos..self.output_pos + n]);
                self.output_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }

            if self.input_pos == self.input_len && !self.eof {
                let n = self.inner.read(&mut self.input)?;
                self.input_pos = 0;
                self.input_len = n;
                self.eof = n == 0;
            }

            let (result, read, written, _) = self.decoder.decode_to_utf8(
                &self.input[self.input_pos..self.input_len],
                &mut self.output,
                self.eof,
            );
            self.input_pos += read;
            self.output_pos = 0;
            self.output_len = written;

            if self.eof && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }
    }
}
