use image::GrayImage;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Accelerated execution is not supported by this backend")]
    AccelerationUnavailable,
    #[error("No OCR engine compiled in; build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR backend.
///
/// Implementations accept a single-channel region and return the recognized
/// text as one string, lines joined in reading order; an empty string when
/// nothing is recognized. Backends are shared by every worker of a run.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, region: &GrayImage) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, region: &GrayImage) -> Result<String, OcrError> {
        (**self).recognize(region)
    }
}

/// Execution mode requested from a backend constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Accelerated,
    Cpu,
}

/// How the backend of a run ended up being constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInit {
    Accelerated,
    Fallback,
}

impl fmt::Display for EngineInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineInit::Accelerated => write!(f, "accelerated"),
            EngineInit::Fallback => write!(f, "cpu fallback"),
        }
    }
}

/// Build the run's backend once, preferring accelerated execution.
///
/// `build` is called with [`ExecutionMode::Accelerated`] first; if that fails it
/// is called exactly once more with [`ExecutionMode::Cpu`].
pub fn initialize_backend<R, F>(mut build: F) -> Result<(R, EngineInit), OcrError>
where
    F: FnMut(ExecutionMode) -> Result<R, OcrError>,
{
    match build(ExecutionMode::Accelerated) {
        Ok(backend) => Ok((backend, EngineInit::Accelerated)),
        Err(e) => {
            tracing::warn!("Accelerated OCR initialization failed, falling back to CPU: {e}");
            let backend = build(ExecutionMode::Cpu)?;
            Ok((backend, EngineInit::Fallback))
        }
    }
}

// ── Mock backends (always available, used for tests) ──────────────────────────

/// Returns a pre-set string for every region.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _region: &GrayImage) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

/// Returns queued responses in call order, then empty strings.
///
/// Only meaningful for sequential runs where call order is fixed.
pub struct ScriptedRecognizer {
    responses: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
        }
    }

    /// Queue an engine failure for the next call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().push_back(Err(message.into()));
    }

    pub fn push(&self, text: impl Into<String>) {
        self.lock().push_back(Ok(text.into()));
    }

    /// Responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        // A poisoned queue still holds valid data.
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OcrBackend for ScriptedRecognizer {
    fn recognize(&self, _region: &GrayImage) -> Result<String, OcrError> {
        match self.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(OcrError::Engine(message)),
            None => Ok(String::new()),
        }
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{ExecutionMode, OcrBackend, OcrError};
    use image::GrayImage;
    use leptess::LepTess;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// One loaded engine, shared by all workers. Calls are serialized.
    pub struct TesseractRecognizer {
        engine: Mutex<LepTess>,
    }

    impl TesseractRecognizer {
        /// Tesseract runs on the CPU only, so an accelerated request fails and
        /// the caller falls back.
        pub fn new(mode: ExecutionMode, data_path: Option<&str>, lang: &str) -> Result<Self, OcrError> {
            if mode == ExecutionMode::Accelerated {
                return Err(OcrError::AccelerationUnavailable);
            }
            let engine = LepTess::new(data_path, lang).map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(Self { engine: Mutex::new(engine) })
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, region: &GrayImage) -> Result<String, OcrError> {
            let mut png = Vec::new();
            region
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;

            let mut lt = self
                .engine
                .lock()
                .map_err(|_| OcrError::Engine("engine lock poisoned".to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;

            Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
        }
    }
}

/// Construct the default engine for `mode`.
#[cfg(feature = "tesseract")]
pub fn default_backend(mode: ExecutionMode) -> Result<Box<dyn OcrBackend>, OcrError> {
    let backend = tesseract_backend::TesseractRecognizer::new(mode, None, "eng")?;
    Ok(Box::new(backend))
}

/// Construct the default engine for `mode`.
#[cfg(not(feature = "tesseract"))]
pub fn default_backend(_mode: ExecutionMode) -> Result<Box<dyn OcrBackend>, OcrError> {
    Err(OcrError::NotAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> GrayImage {
        GrayImage::new(4, 4)
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("INCOME TAX DEPARTMENT\nABCPE1234F");
        assert_eq!(r.recognize(&blank()).unwrap(), "INCOME TAX DEPARTMENT\nABCPE1234F");
    }

    #[test]
    fn scripted_returns_in_order_then_empty() {
        let r = ScriptedRecognizer::new(["first", "second"]);
        assert_eq!(r.recognize(&blank()).unwrap(), "first");
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.recognize(&blank()).unwrap(), "second");
        assert_eq!(r.recognize(&blank()).unwrap(), "");
    }

    #[test]
    fn scripted_can_fail() {
        let r = ScriptedRecognizer::new(Vec::<String>::new());
        r.push_error("model crashed");
        assert!(matches!(r.recognize(&blank()), Err(OcrError::Engine(m)) if m == "model crashed"));
    }

    #[test]
    fn initialization_prefers_accelerated() {
        let mut calls = Vec::new();
        let (_, init) = initialize_backend(|mode| {
            calls.push(mode);
            Ok(MockRecognizer::new(""))
        })
        .unwrap();
        assert_eq!(init, EngineInit::Accelerated);
        assert_eq!(calls, vec![ExecutionMode::Accelerated]);
    }

    #[test]
    fn initialization_falls_back_once() {
        let mut calls = Vec::new();
        let (_, init) = initialize_backend(|mode| {
            calls.push(mode);
            match mode {
                ExecutionMode::Accelerated => Err(OcrError::AccelerationUnavailable),
                ExecutionMode::Cpu => Ok(MockRecognizer::new("")),
            }
        })
        .unwrap();
        assert_eq!(init, EngineInit::Fallback);
        assert_eq!(calls, vec![ExecutionMode::Accelerated, ExecutionMode::Cpu]);
    }

    #[test]
    fn initialization_error_when_both_modes_fail() {
        let result = initialize_backend(|_| -> Result<MockRecognizer, OcrError> { Err(OcrError::NotAvailable) });
        assert!(matches!(result, Err(OcrError::NotAvailable)));
    }

    #[cfg(feature = "tesseract")]
    #[test]
    fn tesseract_engine_is_shareable_and_cpu_only() {
        use tesseract_backend::TesseractRecognizer;

        fn shared<T: OcrBackend + 'static>() {}
        shared::<TesseractRecognizer>();

        assert!(matches!(
            TesseractRecognizer::new(ExecutionMode::Accelerated, None, "eng"),
            Err(OcrError::AccelerationUnavailable)
        ));
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn default_backend_requires_feature() {
        assert!(matches!(default_backend(ExecutionMode::Cpu), Err(OcrError::NotAvailable)));
    }
}
