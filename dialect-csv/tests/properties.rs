//! Property tests for the reader and writer working together, plus
//! interoperability checks against the `csv` crate.

use std::io::Cursor;

use dialect_csv::{CsvReader, CsvWriter, Dialect, EnclosingMode, Row};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// =============================================================================
// Helpers
// =============================================================================

fn encode_all(writer: &CsvWriter, rows: &[Row]) -> Vec<u8> {
    rows.iter().flat_map(|row| writer.encode_row(row)).collect()
}

fn decode_all(dialect: Dialect, bytes: Vec<u8>) -> Vec<Row> {
    let mut reader = CsvReader::new(dialect);
    reader.open_source(Cursor::new(bytes)).unwrap();
    reader.get_rows().unwrap()
}

fn count_all(dialect: Dialect, bytes: Vec<u8>) -> usize {
    let mut reader = CsvReader::new(dialect);
    reader.open_source(Cursor::new(bytes)).unwrap();
    reader.count().unwrap()
}

/// Rows of 1 to 4 fields drawn from `pattern`.
fn rows(pattern: &'static str) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(prop::collection::vec(pattern, 1..5), 1..6)
}

/// Rows where some are made only of empty fields.
fn rows_with_blanks() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (any::<bool>(), prop::collection::vec("[a-z]{1,4}", 1..4)),
        1..8,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(blank, row)| if blank { vec![String::new(); row.len()] } else { row })
            .collect()
    })
}

fn parse_with_csv_crate(bytes: &[u8]) -> Vec<Row> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes)
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn write_with_csv_crate(rows: &[Row]) -> Vec<u8> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn round_trip_plain_fields(rows in rows("[a-zA-Z0-9 éà_.-]{0,12}")) {
        let dialect = Dialect::unix();
        let bytes = encode_all(&CsvWriter::new(dialect.clone()), &rows);
        prop_assert_eq!(decode_all(dialect, bytes), rows);
    }

    #[test]
    fn round_trip_cp1252(rows in rows("[a-zA-Z0-9 éèàçùÉ]{0,10}")) {
        let dialect = Dialect::excel();
        let bytes = encode_all(&CsvWriter::new(dialect.clone()), &rows);
        prop_assert_eq!(decode_all(dialect, bytes), rows);
    }

    #[test]
    fn round_trip_special_characters_with_doubling(rows in rows("[a-z ,;\"\n]{0,8}")) {
        let dialect = Dialect::unix();
        let bytes = encode_all(&CsvWriter::new(dialect.clone()), &rows);
        prop_assert_eq!(decode_all(dialect, bytes), rows);
    }

    #[test]
    fn round_trip_special_characters_with_escape(rows in rows("[a-z ,\"\n]{0,8}")) {
        let dialect = Dialect::unix().with_escape_double(false);
        let bytes = encode_all(&CsvWriter::new(dialect.clone()), &rows);
        prop_assert_eq!(decode_all(dialect, bytes), rows);
    }

    #[test]
    fn enclose_all_wraps_every_field(fields in prop::collection::vec("[a-z0-9.]{0,6}", 1..6)) {
        let writer = CsvWriter::new(Dialect::unix().with_enclosing_mode(EnclosingMode::All));
        let expected = fields
            .iter()
            .map(|field| format!("\"{}\"", field))
            .collect::<Vec<_>>()
            .join(",")
            + "\n";
        prop_assert_eq!(String::from_utf8(writer.encode_row(&fields)).unwrap(), expected);
    }

    #[test]
    fn non_numeric_leaves_numbers_bare(
        number in "[0-9]{1,5}(\\.[0-9]{1,3})?",
        word in "[a-z]{1,6}",
    ) {
        let writer = CsvWriter::new(Dialect::unix().with_enclosing_mode(EnclosingMode::NonNumeric));
        let line = String::from_utf8(writer.encode_row([&number, &word])).unwrap();
        prop_assert_eq!(line, format!("{},\"{}\"\n", number, word));
    }

    #[test]
    fn skip_empty_lines_drops_blank_rows(rows in rows_with_blanks()) {
        let writer = CsvWriter::new(Dialect::unix());
        let bytes = encode_all(&writer, &rows);
        let non_blank: Vec<Row> = rows
            .iter()
            .filter(|row| row.iter().any(|field| !field.is_empty()))
            .cloned()
            .collect();

        let skipping = Dialect::unix().with_skip_empty_lines(true);
        prop_assert_eq!(decode_all(skipping.clone(), bytes.clone()), non_blank.clone());
        prop_assert_eq!(count_all(skipping, bytes.clone()), non_blank.len());
        prop_assert_eq!(count_all(Dialect::unix(), bytes), rows.len());
    }

    #[test]
    fn trimmed_fields_have_no_outer_whitespace(rows in rows("[ \t]{0,2}[a-z]{0,4}[ \t]{0,2}")) {
        let trimming = Dialect::unix().with_trim_fields(true);
        let bytes = encode_all(&CsvWriter::new(trimming.clone()), &rows);

        let expected: Vec<Row> = rows
            .iter()
            .map(|row| row.iter().map(|field| field.trim().to_string()).collect())
            .collect();
        prop_assert_eq!(decode_all(Dialect::unix(), bytes.clone()), expected.clone());
        prop_assert_eq!(decode_all(trimming, bytes), expected);
    }

    #[test]
    fn writer_output_parses_with_csv_crate(rows in rows("[a-z ,\"\n]{1,8}")) {
        let bytes = encode_all(&CsvWriter::new(Dialect::unix()), &rows);
        prop_assert_eq!(parse_with_csv_crate(&bytes), rows);
    }

    #[test]
    fn reader_accepts_csv_crate_output(rows in rows("[a-z ,\"\n]{1,8}")) {
        let bytes = write_with_csv_crate(&rows);
        prop_assert_eq!(decode_all(Dialect::unix(), bytes), rows);
    }
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn bom_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bom.csv");
    let dialect = Dialect::unix().with_use_bom(true);

    let mut writer = CsvWriter::new(dialect.clone());
    writer.open(&path).unwrap();
    writer
        .write_rows([["nom", "prénom", "age"], ["Martin", "Durand", "28"]])
        .unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
    assert_eq!(bytes.windows(3).filter(|w| *w == b"\xEF\xBB\xBF").count(), 1);

    let mut reader = CsvReader::new(dialect);
    reader.open(&path).unwrap();
    assert_eq!(
        reader.get_rows().unwrap(),
        vec![vec!["nom", "prénom", "age"], vec!["Martin", "Durand", "28"]]
    );
}

#[test]
fn excel_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("excel.csv");
    let rows = [
        ["nom", "prénom", "age"],
        ["Bousquet", "Inès", "32"],
        ["Morel", "Monique", "41"],
        ["Gauthier", "Aurélie", "24"],
    ];

    let mut writer = CsvWriter::new(Dialect::excel());
    writer.set_filename(&path);
    writer.write_rows(rows).unwrap();
    writer.close().unwrap();

    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"nom;pr\xE9nom;age\r\nBousquet;In\xE8s;32\r\nMorel;Monique;41\r\nGauthier;Aur\xE9lie;24\r\n"
    );

    let mut reader = CsvReader::new(Dialect::excel());
    reader.set_filename(&path);
    assert_eq!(reader.count().unwrap(), 4);
    assert_eq!(reader.get_rows().unwrap(), rows.map(|row| row.map(String::from).to_vec()).to_vec());
}
