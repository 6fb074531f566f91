use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Extraction record requires a non-empty identifier")]
    EmptyIdentifier,
}

/// One exported row: a validated identifier, a best-effort name and the
/// file name of the image it came from.
///
/// Field names match the column headers of the exported table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    #[serde(rename = "PAN_NUMBER")]
    identifier: String,
    #[serde(rename = "FULL_NAME")]
    name: String,
    #[serde(rename = "Image")]
    source_image: String,
}

impl ExtractionRecord {
    pub const COLUMNS: [&'static str; 3] = ["PAN_NUMBER", "FULL_NAME", "Image"];

    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        source_image: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(CoreError::EmptyIdentifier);
        }
        Ok(Self { identifier, name: name.into(), source_image: source_image.into() })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_image(&self) -> &str {
        &self.source_image
    }
}

/// Records in processing order. Duplicate identifiers are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<ExtractionRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ExtractionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExtractionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractionRecord> {
        self.records.iter()
    }
}

impl FromIterator<ExtractionRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = ExtractionRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ExtractionRecord;
    type IntoIter = std::slice::Iter<'a, ExtractionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_empty_identifier() {
        assert_eq!(
            ExtractionRecord::new("", "JOHN", "a.jpg").unwrap_err(),
            CoreError::EmptyIdentifier
        );
    }

    #[test]
    fn record_allows_empty_name() {
        let r = ExtractionRecord::new("ABCPE1234F", "", "a.jpg").unwrap();
        assert_eq!(r.identifier(), "ABCPE1234F");
        assert_eq!(r.name(), "");
        assert_eq!(r.source_image(), "a.jpg");
    }

    #[test]
    fn dataset_keeps_duplicates_in_order() {
        let mut ds = Dataset::new();
        ds.push(ExtractionRecord::new("ABCPE1234F", "A", "1.jpg").unwrap());
        ds.push(ExtractionRecord::new("ZZZZZ0000Z", "B", "2.jpg").unwrap());
        ds.push(ExtractionRecord::new("ABCPE1234F", "C", "3.jpg").unwrap());
        let images: Vec<_> = ds.iter().map(|r| r.source_image()).collect();
        assert_eq!(images, vec!["1.jpg", "2.jpg", "3.jpg"]);
        assert_eq!(ds.len(), 3);
    }
}
