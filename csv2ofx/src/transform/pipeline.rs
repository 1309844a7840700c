//! High-level pipeline API for CSV to OFX conversion.
//!
//! The pipeline walks through a fixed sequence of states:
//!
//! ```text
//! Initializing → SkippingHeader → StreamingRows → Finalizing → Done
//! ```
//!
//! Rows are read as bytes and decoded one at a time. Only the columns the
//! format reads are interpreted as text, so stray non-UTF-8 bytes elsewhere
//! (the header row included) never fail a run. Nothing is written until
//! every row has been decoded, so a malformed row aborts the run with no
//! output.
//!
//! # Example
//!
//! ```rust
//! use csv2ofx::logs::Diagnostics;
//! use csv2ofx::transform::{convert, example_format};
//!
//! let input = "dato;rentedato;tekst;ut;inn\n01.02.2024;31.01.2024;Rema 1000;149,90;\n";
//! let mut output = Vec::new();
//! let mut diagnostics = Diagnostics::new(Vec::new());
//!
//! let statement = convert(input.as_bytes(), &mut output, &mut diagnostics, &example_format()).unwrap();
//! assert_eq!(statement.transactions.len(), 1);
//! ```

use std::fmt;
use std::io::{Read, Write};

use tracing::{info, trace};

use crate::error::{ConvertError, ConvertResult};
use crate::logs::Diagnostics;
use crate::models::{PayerIdentity, Statement};
use crate::ofx::{OfxWriter, StatementWriter};
use crate::parser::row_reader;
use crate::transform::dsl::{FormatSpec, LossyRecord, RecordDecoder};

/// Rows discarded before decoding starts. `skip-header` is not consulted.
const HEADER_ROWS: usize = 1;

/// Immutable configuration for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions<'a> {
    /// Selected input dialect.
    pub format: &'a FormatSpec,

    /// Account and bank written into the statement.
    pub payer: PayerIdentity,
}

impl<'a> ConvertOptions<'a> {
    pub fn new(format: &'a FormatSpec) -> Self {
        Self {
            format,
            payer: PayerIdentity::default(),
        }
    }

    pub fn with_payer(mut self, payer: PayerIdentity) -> Self {
        self.payer = payer;
        self
    }
}

/// Pipeline lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initializing,
    SkippingHeader,
    StreamingRows,
    Finalizing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::SkippingHeader => "skipping-header",
            Self::StreamingRows => "streaming-rows",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Streaming CSV → statement → serializer driver.
///
/// `run` consumes the pipeline, so a finished pipeline cannot be restarted.
#[derive(Debug)]
pub struct ConversionPipeline<'a> {
    options: ConvertOptions<'a>,
    state: PipelineState,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(options: ConvertOptions<'a>) -> Self {
        Self {
            options,
            state: PipelineState::Initializing,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn options(&self) -> &ConvertOptions<'a> {
        &self.options
    }

    fn advance(&mut self, next: PipelineState) {
        trace!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }

    /// Convert `input` and write the serialized statement to `output`.
    ///
    /// The statement summary goes to `diagnostics`. Returns the statement
    /// that was written.
    pub fn run<R, W, L>(
        mut self,
        input: R,
        output: &mut W,
        diagnostics: &mut Diagnostics<L>,
        serializer: &dyn StatementWriter,
    ) -> ConvertResult<Statement>
    where
        R: Read,
        W: Write,
        L: Write,
    {
        let format = self.options.format;
        info!(format = %format.name, delimiter = ?format.delimiter(), "conversion started");
        let mut reader = row_reader(input, format)?;
        let decoder = RecordDecoder::new(format);
        let mut record = csv::ByteRecord::new();

        self.advance(PipelineState::SkippingHeader);
        for _ in 0..HEADER_ROWS {
            if !reader.read_byte_record(&mut record)? {
                break;
            }
        }

        self.advance(PipelineState::StreamingRows);
        let mut transactions = Vec::new();
        while reader.read_byte_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line());
            let tx = decoder
                .decode(&LossyRecord::new(&record))
                .map_err(|e| ConvertError::MalformedRow {
                    line,
                    field: e.field,
                    source: e.source,
                })?;
            trace!(line, record = %tx, "row decoded");
            transactions.push(tx);
        }

        self.advance(PipelineState::Finalizing);
        let statement = Statement {
            currency: format.currency().to_string(),
            payer: self.options.payer.clone(),
            transactions,
        };
        diagnostics.info(&statement);

        serializer.write_statement(&statement, output)?;
        output.flush()?;

        self.advance(PipelineState::Done);
        info!(transactions = statement.transactions.len(), "conversion finished");
        Ok(statement)
    }
}

/// Convert with the default payer identity and the OFX writer.
pub fn convert<R, W, L>(
    input: R,
    output: &mut W,
    diagnostics: &mut Diagnostics<L>,
    format: &FormatSpec,
) -> ConvertResult<Statement>
where
    R: Read,
    W: Write,
    L: Write,
{
    ConversionPipeline::new(ConvertOptions::new(format)).run(
        input,
        output,
        diagnostics,
        &OfxWriter::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::transform::dsl::{example_format, FieldRule, FieldSpec};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::io;

    /// Records the statement it receives instead of rendering it.
    #[derive(Default)]
    struct Capture(RefCell<Option<Statement>>);

    impl StatementWriter for Capture {
        fn write_statement(&self, statement: &Statement, out: &mut dyn Write) -> io::Result<()> {
            *self.0.borrow_mut() = Some(statement.clone());
            out.write_all(b"captured")
        }
    }

    fn comma_format() -> FormatSpec {
        FormatSpec {
            name: "simple".to_string(),
            curdef: "SEK".to_string(),
            skip_header: 0,
            skip_footer: 0,
            comma: ",".to_string(),
            encoding: None,
            fields: FieldSpec {
                trntype: FieldRule::leaf(0),
                dtposted: FieldRule::leaf(1).with_date_format("%d.%m.%Y"),
                dtuser: FieldRule::leaf(1).with_date_format("%d.%m.%Y"),
                trnamt: FieldRule::leaf(2),
                memo: FieldRule::leaf(0),
                ftid: FieldRule::leaf(0),
            },
        }
    }

    fn run_capture(
        format: &FormatSpec,
        input: impl AsRef<[u8]>,
    ) -> (ConvertResult<Statement>, Capture, Vec<u8>) {
        let capture = Capture::default();
        let mut output = Vec::new();
        let mut diagnostics = Diagnostics::new(Vec::new());
        let result = ConversionPipeline::new(ConvertOptions::new(format)).run(
            input.as_ref(),
            &mut output,
            &mut diagnostics,
            &capture,
        );
        (result, capture, output)
    }

    #[test]
    fn test_end_to_end_single_row() {
        let format = comma_format();
        let input = "type,date,amount\nVARE,05.03.2024,\"123,45\"\n";
        let (result, capture, output) = run_capture(&format, input);

        let statement = result.unwrap();
        assert_eq!(output, b"captured");

        let handed = capture.0.borrow().clone().unwrap();
        assert_eq!(handed, statement);
        assert_eq!(handed.currency, "SEK");
        assert_eq!(handed.payer, PayerIdentity::default());
        assert_eq!(handed.transactions.len(), 1);

        let tx = &handed.transactions[0];
        assert_eq!(tx.amount, 123.45);
        assert_eq!(
            tx.posted_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(tx.memo, "VARE");
    }

    #[test]
    fn test_only_one_header_row_skipped() {
        let mut format = comma_format();
        format.skip_header = 3;
        let input = "h\nA,01.01.2024,1\nB,02.01.2024,2\n";
        let (result, _, _) = run_capture(&format, input);

        let memos: Vec<_> = result
            .unwrap()
            .transactions
            .into_iter()
            .map(|t| t.memo)
            .collect();
        assert_eq!(memos, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_input() {
        let (result, capture, _) = run_capture(&comma_format(), "");
        assert!(result.unwrap().transactions.is_empty());
        assert!(capture.0.borrow().is_some());
    }

    #[test]
    fn test_malformed_row_aborts_without_output() {
        let format = comma_format();
        let input = "h\nA,01.01.2024,1\nB,02.01.2024\n";
        let (result, capture, output) = run_capture(&format, input);

        match result {
            Err(ConvertError::MalformedRow { line, field, source }) => {
                assert_eq!(line, 3);
                assert_eq!(field, "trnamt");
                assert_eq!(source, FieldError::MalformedRow { index: 2, len: 2 });
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
        assert!(capture.0.borrow().is_none());
        assert!(output.is_empty());
    }

    #[test]
    fn test_bad_tokens_use_defaults() {
        let format = comma_format();
        let input = "h\nA,someday,abc\n";
        let (result, _, _) = run_capture(&format, input);

        let tx = &result.unwrap().transactions[0];
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.posted_date, None);
        assert_eq!(tx.user_date, None);
    }

    #[test]
    fn test_latin1_header_is_skipped() {
        let format = comma_format();
        let input: &[u8] = b"Type,Dato,Bel\xf8p\nVARE,01.02.2024,\"10,00\"\n";
        let (result, _, _) = run_capture(&format, input);

        let statement = result.unwrap();
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].amount, 10.0);
    }

    #[test]
    fn test_latin1_in_unread_column() {
        let mut format = comma_format();
        format.comma = ";".to_string();
        let input: &[u8] = b"h\nKiwi;01.02.2024;10,00;K\xf8b\n";
        let (result, _, _) = run_capture(&format, input);

        let tx = &result.unwrap().transactions[0];
        assert_eq!(tx.memo, "Kiwi");
        assert_eq!(tx.amount, 10.0);
    }

    #[test]
    fn test_latin1_in_read_column_is_replaced() {
        let format = comma_format();
        let input: &[u8] = b"h\nBl\xe5b\xe6r,01.02.2024,1\n";
        let (result, _, _) = run_capture(&format, input);

        assert_eq!(result.unwrap().transactions[0].memo, "Bl\u{fffd}b\u{fffd}r");
    }

    #[test]
    fn test_summary_written_to_diagnostics() {
        let format = example_format();
        let input = "header\n01.02.2024;31.01.2024;Kiwi;10,00;\n";
        let mut output = Vec::new();
        let mut diagnostics = Diagnostics::new(Vec::new());

        convert(input.as_bytes(), &mut output, &mut diagnostics, &format).unwrap();

        let log = String::from_utf8(diagnostics.into_inner()).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("Kiwi"));
        assert!(String::from_utf8(output).unwrap().contains("<TRNAMT>-10.00"));
    }

    #[test]
    fn test_custom_payer() {
        let format = comma_format();
        let payer = PayerIdentity {
            account: "12345678903".to_string(),
            bank: "DNB".to_string(),
        };
        let mut output = Vec::new();
        let mut diagnostics = Diagnostics::new(io::sink());
        let statement = ConversionPipeline::new(ConvertOptions::new(&format).with_payer(payer.clone()))
            .run(&b"h\n"[..], &mut output, &mut diagnostics, &OfxWriter::new())
            .unwrap();

        assert_eq!(statement.payer, payer);
        assert!(String::from_utf8(output).unwrap().contains("<ACCTID>12345678903"));
    }

    #[test]
    fn test_initial_state() {
        let format = comma_format();
        let pipeline = ConversionPipeline::new(ConvertOptions::new(&format));
        assert_eq!(pipeline.state(), PipelineState::Initializing);
        assert_eq!(pipeline.options().format.name, "simple");
    }
}
