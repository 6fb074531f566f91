pub mod denoise;
pub mod digest;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use digest::file_digest;
pub use extract::{is_plausible_name, normalize_name, validate_identifier, MIN_NAME_LEN};
pub use pipeline::{ExtractionPipeline, PipelineError, RunSummary};
pub use preprocess::{prepare_region, PreprocessError};
pub use recognizer::{
    initialize_backend, EngineInit, ExecutionMode, MockRecognizer, OcrBackend, OcrError,
    ScriptedRecognizer,
};
pub use types::{ExtractionContext, FieldState, ImageOutcome};
