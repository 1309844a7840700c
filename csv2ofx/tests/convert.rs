//! End-to-end conversion through the public API.

use csv2ofx::{
    convert, example_format, CatalogError, ConversionPipeline, ConvertError, ConvertOptions,
    Diagnostics, FieldError, OfxWriter, PayerIdentity, SpecCatalog,
};

const CATALOG: &str = include_str!("../specs.json");

fn catalog() -> SpecCatalog {
    SpecCatalog::from_json(CATALOG).unwrap()
}

fn run(format: &str, input: &[u8]) -> Result<(String, String), ConvertError> {
    let catalog = catalog();
    let format = catalog.find_format(format)?;
    let mut output = Vec::new();
    let mut diagnostics = Diagnostics::new(Vec::new());
    convert(input, &mut output, &mut diagnostics, format)?;
    Ok((
        String::from_utf8(output).unwrap(),
        String::from_utf8(diagnostics.into_inner()).unwrap(),
    ))
}

#[test]
fn test_shipped_catalog_loads() {
    let catalog = catalog();
    assert_eq!(catalog.names(), vec!["spv-kreditt", "sbanken"]);
}

#[test]
fn test_spv_kreditt_export() {
    // windows-1252: "Kjøp" and "Lønn"
    let input: &[u8] = b"Dato;Rentedato;Tekst;Ut;Inn\n\
        03.02.2024;02.02.2024;Kj\xf8p Rema;249,50;\n\
        25.02.2024;25.02.2024;L\xf8nn;;32000,00\n";
    let (ofx, log) = run("spv-kreditt", input).unwrap();

    assert_eq!(ofx.matches("<STMTTRN>").count(), 2);
    assert!(ofx.contains("<TRNTYPE>DEBIT\n<DTPOSTED>20240203000000\n<DTUSER>20240202000000\n<TRNAMT>-249.50\n"));
    assert!(ofx.contains("<TRNTYPE>CREDIT\n<DTPOSTED>20240225000000\n"));
    assert!(ofx.contains("<MEMO>Kjøp Rema\n"));
    assert!(ofx.contains("<MEMO>Lønn\n"));
    assert!(ofx.contains("<DTSTART>20240203000000\n<DTEND>20240225000000\n"));
    assert!(ofx.contains("<BALAMT>31750.50\n"));
    assert!(ofx.find("Kjøp").unwrap() < ofx.find("Lønn").unwrap());

    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("transactions=2"));
}

#[test]
fn test_identical_input_identical_output() {
    let input: &[u8] = b"h\n01.03.2024;01.03.2024;Kiwi;12,00;\n";
    let (first, _) = run("spv-kreditt", input).unwrap();
    let (second, _) = run("spv-kreditt", input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_format_uses_first() {
    let input: &[u8] = b"h\n01.03.2024;01.03.2024;Kiwi;12,00;\n";
    let (fallback, _) = run("no-such-bank", input).unwrap();
    let (named, _) = run("spv-kreditt", input).unwrap();
    assert_eq!(fallback, named);
}

#[test]
fn test_short_row_aborts_run() {
    let input: &[u8] = b"h\n01.03.2024;01.03.2024;Kiwi;12,00;\n01.03.2024;x\n";
    match run("spv-kreditt", input) {
        Err(ConvertError::MalformedRow { line, source, .. }) => {
            assert_eq!(line, 3);
            assert!(matches!(source, FieldError::MalformedRow { len: 2, .. }));
        }
        other => panic!("expected MalformedRow, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_catalog_fails_lookup() {
    let catalog = SpecCatalog::from_json(r#"{"format": []}"#).unwrap();
    assert!(matches!(catalog.find_format("spv-kreditt"), Err(CatalogError::Empty)));
}

#[test]
fn test_tab_delimited_with_payer() {
    let catalog = catalog();
    let format = catalog.find_format("sbanken").unwrap();
    let input = "Bokført\tRentedato\tArkivref\tType\tKonto\tTekst\tUt\tInn\n\
        04.01.2024\t04.01.2024\t42\tVARE\t\tSpotify\t119,00\t\n";

    let payer = PayerIdentity {
        account: "97100000000".to_string(),
        bank: "Sbanken".to_string(),
    };
    let mut output = Vec::new();
    let mut diagnostics = Diagnostics::new(std::io::sink());
    let statement = ConversionPipeline::new(ConvertOptions::new(format).with_payer(payer))
        .run(input.as_bytes(), &mut output, &mut diagnostics, &OfxWriter::new())
        .unwrap();

    assert_eq!(statement.transactions.len(), 1);
    assert_eq!(statement.transactions[0].amount, -119.0);
    assert_eq!(statement.transactions[0].memo, "Spotify");
    assert!(String::from_utf8(output).unwrap().contains("<ACCTID>97100000000\n"));
}

#[test]
fn test_non_utf8_outside_read_columns() {
    let format = example_format();
    assert!(format.encoding.is_none());
    // Latin-1 "ø" in the header and in the unread sixth column.
    let input: &[u8] = b"Dato;Rentedato;Tekst;Ut;Inn;Bel\xf8p\n\
        01.02.2024;01.02.2024;Kiwi;10,00;;K\xf8b\n";

    let mut output = Vec::new();
    let mut diagnostics = Diagnostics::new(std::io::sink());
    let statement = convert(input, &mut output, &mut diagnostics, &format).unwrap();

    assert_eq!(statement.transactions.len(), 1);
    assert_eq!(statement.transactions[0].memo, "Kiwi");
    assert!(String::from_utf8(output).unwrap().contains("<TRNAMT>-10.00\n"));
}
