//! I/O utilities for CSV reading, writing, encoding, and delimiter resolution.
//!
//! Every table the pipeline and the comparator touch flows through this
//! module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader/writer construction**: `open_csv_reader_from_path` reports an
//!   absent file as [`InputError::MissingInput`] so the jobs can abort before
//!   any output is written.
//! - **Quoting**: CSV output uses `QuoteStyle::Always` for round-trip safety.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::error::InputError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

/// Opens `path` for the table called `table`, mapping an absent file to
/// [`InputError::MissingInput`].
pub fn open_csv_reader_from_path(
    table: &str,
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(InputError::MissingInput {
                table: table.to_string(),
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Opening input file {path:?}"));
        }
    };
    let reader: Box<dyn Read> = Box::new(BufReader::new(file));
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    let writer: Box<dyn Write> = Box::new(BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    ));
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding).map(|names| {
        names
            .into_iter()
            .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
            .collect()
    })
}
