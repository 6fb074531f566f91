pub mod annotation;
pub mod csv;
pub mod pairing;

pub use annotation::{parse_annotation_file, parse_annotation_line, AnnotationError, AnnotationLine};
pub use csv::{read_dataset, write_dataset, CsvError};
pub use pairing::{pair_dataset, ImageLabelPair, PairingError, ANNOTATION_EXTENSION, IMAGE_EXTENSIONS};
