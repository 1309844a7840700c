//! OFX output.
//!
//! [`StatementWriter`] is the seam between the conversion pipeline and the
//! output format. [`OfxWriter`] renders OFX 1.02 (SGML) bank statements.
//!
//! Output depends only on the statement: the server timestamp is the latest
//! posted date and transaction ids are derived from position, so identical
//! input produces identical bytes.

use std::io::{self, Write};

use chrono::NaiveDateTime;

use crate::models::{round_cents, Statement, TransactionRecord};

/// Rendered in place of an empty date.
const ZERO_DATE: &str = "00010101000000";

const OFX_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Renders a statement to an output stream.
pub trait StatementWriter {
    fn write_statement(&self, statement: &Statement, out: &mut dyn Write) -> io::Result<()>;
}

/// OFX 1.02 SGML writer.
#[derive(Debug, Clone)]
pub struct OfxWriter {
    /// `ACCTTYPE` of the payer account.
    pub account_type: String,
}

impl Default for OfxWriter {
    fn default() -> Self {
        Self {
            account_type: "CHECKING".to_string(),
        }
    }
}

impl OfxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render to a string.
    pub fn render(&self, statement: &Statement) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_statement(statement, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_header(out: &mut dyn Write) -> io::Result<()> {
        for line in [
            "OFXHEADER:100",
            "DATA:OFXSGML",
            "VERSION:102",
            "SECURITY:NONE",
            "ENCODING:UTF-8",
            "CHARSET:NONE",
            "COMPRESSION:NONE",
            "OLDFILEUID:NONE",
            "NEWFILEUID:NONE",
            "",
        ] {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn write_status(out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "<STATUS>")?;
        writeln!(out, "<CODE>0")?;
        writeln!(out, "<SEVERITY>INFO")?;
        writeln!(out, "</STATUS>")
    }

    fn write_transaction(out: &mut dyn Write, seq: usize, tx: &TransactionRecord) -> io::Result<()> {
        let posted = ofx_date(tx.posted_date);
        writeln!(out, "<STMTTRN>")?;
        writeln!(out, "<TRNTYPE>{}", tx.kind().as_ofx())?;
        writeln!(out, "<DTPOSTED>{}", posted)?;
        if let Some(user) = tx.user_date {
            writeln!(out, "<DTUSER>{}", user.format(OFX_DATE_FORMAT))?;
        }
        writeln!(out, "<TRNAMT>{}", ofx_amount(tx.amount))?;
        writeln!(out, "<FITID>{}-{}", &posted[..8], seq)?;
        if !tx.memo.is_empty() {
            writeln!(out, "<MEMO>{}", escape(&tx.memo))?;
        }
        writeln!(out, "</STMTTRN>")
    }
}

impl StatementWriter for OfxWriter {
    fn write_statement(&self, statement: &Statement, out: &mut dyn Write) -> io::Result<()> {
        let range = statement.posted_range();
        let start = ofx_date(range.map(|(lo, _)| lo));
        let end = ofx_date(range.map(|(_, hi)| hi));

        Self::write_header(out)?;
        writeln!(out, "<OFX>")?;

        writeln!(out, "<SIGNONMSGSRSV1>")?;
        writeln!(out, "<SONRS>")?;
        Self::write_status(out)?;
        writeln!(out, "<DTSERVER>{}", end)?;
        writeln!(out, "<LANGUAGE>ENG")?;
        writeln!(out, "</SONRS>")?;
        writeln!(out, "</SIGNONMSGSRSV1>")?;

        writeln!(out, "<BANKMSGSRSV1>")?;
        writeln!(out, "<STMTTRNRS>")?;
        writeln!(out, "<TRNUID>0")?;
        Self::write_status(out)?;
        writeln!(out, "<STMTRS>")?;
        writeln!(out, "<CURDEF>{}", escape(&statement.currency))?;
        writeln!(out, "<BANKACCTFROM>")?;
        writeln!(out, "<BANKID>{}", escape(&statement.payer.bank))?;
        writeln!(out, "<ACCTID>{}", escape(&statement.payer.account))?;
        writeln!(out, "<ACCTTYPE>{}", self.account_type)?;
        writeln!(out, "</BANKACCTFROM>")?;

        writeln!(out, "<BANKTRANLIST>")?;
        writeln!(out, "<DTSTART>{}", start)?;
        writeln!(out, "<DTEND>{}", end)?;
        for (i, tx) in statement.transactions.iter().enumerate() {
            Self::write_transaction(out, i + 1, tx)?;
        }
        writeln!(out, "</BANKTRANLIST>")?;

        // The export carries no balance; the net movement stands in for it.
        writeln!(out, "<LEDGERBAL>")?;
        writeln!(out, "<BALAMT>{}", ofx_amount(statement.total()))?;
        writeln!(out, "<DTASOF>{}", end)?;
        writeln!(out, "</LEDGERBAL>")?;

        writeln!(out, "</STMTRS>")?;
        writeln!(out, "</STMTTRNRS>")?;
        writeln!(out, "</BANKMSGSRSV1>")?;
        writeln!(out, "</OFX>")
    }
}

fn ofx_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format(OFX_DATE_FORMAT).to_string())
        .unwrap_or_else(|| ZERO_DATE.to_string())
}

fn ofx_amount(amount: f64) -> String {
    format!("{:.2}", round_cents(amount))
}

/// Escape SGML markup characters and fold line breaks.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' | '\n' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}
