use panscan_core::{Dataset, ExtractionRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: empty identifier")]
    EmptyIdentifier { row: usize },
}

/// Raw row as found on disk; validated into an [`ExtractionRecord`].
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "PAN_NUMBER")]
    identifier: String,
    #[serde(rename = "FULL_NAME", default)]
    name: String,
    #[serde(rename = "Image", default)]
    source_image: String,
}

/// Write the dataset as CSV with the fixed three-column header.
///
/// The header is written even when the dataset is empty.
pub fn write_dataset_to<W: Write>(writer: W, dataset: &Dataset) -> Result<(), CsvError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(ExtractionRecord::COLUMNS)?;
    for record in dataset {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), CsvError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_dataset_to(file, dataset)
}

/// Read a dataset previously written by [`write_dataset`].
///
/// `PAN_NUMBER` and `FULL_NAME` are required columns; `Image` is optional.
pub fn read_dataset_from<R: Read>(reader: R) -> Result<Dataset, CsvError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for required in &ExtractionRecord::COLUMNS[..2] {
        if !headers.iter().any(|h| h == *required) {
            return Err(CsvError::MissingColumn(required.to_string()));
        }
    }

    let mut dataset = Dataset::new();
    for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let record = ExtractionRecord::new(row.identifier, row.name, row.source_image)
            .map_err(|_| CsvError::EmptyIdentifier { row: idx + 1 })?;
        dataset.push(record);
    }
    Ok(dataset)
}

pub fn read_dataset(path: &Path) -> Result<Dataset, CsvError> {
    read_dataset_from(File::open(path)?)
}
