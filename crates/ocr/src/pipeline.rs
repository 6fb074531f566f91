use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use panscan_core::{CoreError, Dataset, ExtractionRecord, RegionKind};
use panscan_import::{
    pair_dataset, parse_annotation_file, write_dataset, AnnotationError, CsvError, ImageLabelPair,
    PairingError,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::digest::file_digest;
use crate::extract::{is_plausible_name, normalize_name, validate_identifier};
use crate::preprocess::{self, prepare_region, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{ExtractionContext, ImageOutcome};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode failed: {0}")]
    Decode(#[from] PreprocessError),
    #[error("Failed to read annotations {path}: {source}")]
    AnnotationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed annotations in {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: AnnotationError,
    },
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Record(#[from] CoreError),
    #[error(transparent)]
    Pairing(#[from] PairingError),
    #[error("Export failed: {0}")]
    Export(#[from] CsvError),
    #[error("Worker pool closed")]
    PoolClosed(#[from] tokio::sync::AcquireError),
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pairs_found: usize,
    pub exported: usize,
    /// Images processed without finding a valid identifier.
    pub skipped: usize,
    /// Images that could not be processed at all.
    pub failed: usize,
    pub output_path: Option<PathBuf>,
    /// Hex SHA-256 of the exported table.
    pub output_digest: Option<String>,
}

/// Orchestrates: pair → per image (decode → parse annotations → per region
/// project → preprocess → OCR → validate) → export.
pub struct ExtractionPipeline<R: OcrBackend> {
    recognizer: R,
    debug_dir: PathBuf,
}

impl<R: OcrBackend + 'static> ExtractionPipeline<R> {
    pub fn new(recognizer: R, debug_dir: PathBuf) -> Self {
        Self { recognizer, debug_dir }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Process one image. Any error means the whole image is skipped.
    pub fn process_pair(&self, pair: &ImageLabelPair) -> Result<Option<ExtractionRecord>, PipelineError> {
        let image = preprocess::load_rgb(&pair.image_path)?;

        let content = std::fs::read_to_string(&pair.label_path).map_err(|source| {
            PipelineError::AnnotationRead { path: pair.label_path.clone(), source }
        })?;
        // Parse everything up front: one bad line rejects the image before any OCR runs.
        let regions = parse_annotation_file(&content).map_err(|source| PipelineError::AnnotationParse {
            path: pair.label_path.clone(),
            source,
        })?;

        let file_name = pair.image_file_name();
        let mut ctx = ExtractionContext::new();

        for region in regions {
            if ctx.is_complete() {
                break;
            }
            if !ctx.is_pending(region.kind) {
                continue;
            }

            let pixels = region.bbox.project(image.width(), image.height());
            let Some(processed) = prepare_region(&image, pixels) else {
                tracing::debug!("{file_name}: degenerate {} region skipped", region.kind);
                continue;
            };

            let text = self.recognizer.recognize(&processed)?;
            let accepted = match region.kind {
                RegionKind::Identifier => validate_identifier(&text),
                RegionKind::Name => Some(normalize_name(&text)).filter(|n| is_plausible_name(n)),
            };

            if let Some(value) = accepted {
                ctx.accept(region.kind, value);
                self.save_debug(region.kind, &file_name, &processed);
            }
        }

        Ok(ctx.into_record(&file_name)?)
    }

    /// Process one image and report the result; never fails.
    pub fn process_outcome(&self, pair: &ImageLabelPair) -> ImageOutcome {
        let file_name = pair.image_file_name();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process_pair(pair)));
        match result {
            Ok(Ok(Some(record))) => {
                tracing::info!(
                    "[SUCCESS] {file_name} -> identifier: {}, name: {}",
                    record.identifier(),
                    record.name()
                );
                ImageOutcome::Extracted(record)
            }
            Ok(Ok(None)) => {
                tracing::info!("[SKIP] {file_name} -> valid identifier not found");
                ImageOutcome::NoIdentifier
            }
            Ok(Err(e)) => {
                tracing::warn!("Error processing {}: {e}", pair.image_path.display());
                ImageOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!("Error processing {}: worker panicked", pair.image_path.display());
                ImageOutcome::Failed("worker panicked".to_string())
            }
        }
    }

    /// Process all pairs on at most `workers` blocking threads.
    ///
    /// Outcomes are returned in the order of `pairs` whatever the worker count.
    pub async fn process_all(
        self: &Arc<Self>,
        pairs: &[ImageLabelPair],
        workers: usize,
    ) -> Result<Vec<ImageOutcome>, PipelineError> {
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, pair) in pairs.iter().cloned().enumerate() {
            let permit = Arc::clone(&permits).acquire_owned().await?;
            let pipeline = Arc::clone(self);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (idx, pipeline.process_outcome(&pair))
            });
        }

        let mut slots: Vec<Option<ImageOutcome>> = vec![None; pairs.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, outcome) = joined?;
            slots[idx] = Some(outcome);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Full run: pair, extract, export, summarize.
    ///
    /// A missing images directory is reported and ends the run without
    /// writing anything. The table is only written when at least one record
    /// was extracted. Failure to write the export is an error.
    pub async fn run(
        self: &Arc<Self>,
        images_dir: &Path,
        labels_dir: &Path,
        output_csv: &Path,
        workers: usize,
    ) -> Result<RunSummary, PipelineError> {
        let pairs = match pair_dataset(images_dir, labels_dir) {
            Ok(pairs) => pairs,
            Err(PairingError::DirectoryNotFound(dir)) => {
                tracing::error!("Image directory '{}' not found", dir.display());
                return Ok(RunSummary::default());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Found {} image-label pairs", pairs.len());

        tokio::fs::create_dir_all(&self.debug_dir).await?;

        let outcomes = self.process_all(&pairs, workers).await?;

        let mut summary = RunSummary { pairs_found: pairs.len(), ..RunSummary::default() };
        let mut dataset = Dataset::new();
        for outcome in outcomes {
            match outcome {
                ImageOutcome::Extracted(record) => dataset.push(record),
                ImageOutcome::NoIdentifier => summary.skipped += 1,
                ImageOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary.exported = dataset.len();

        // An empty run leaves any earlier export in place.
        if dataset.is_empty() {
            tracing::warn!("No valid data extracted");
        } else {
            write_dataset(output_csv, &dataset)?;
            summary.output_digest = Some(file_digest(output_csv)?);
            summary.output_path = Some(output_csv.to_path_buf());
            tracing::info!("Extraction complete. Results saved to {}", output_csv.display());
        }
        tracing::info!("Total processed: {}", summary.pairs_found);
        tracing::info!("Total valid extracted: {}", summary.exported);

        Ok(summary)
    }

    fn save_debug(&self, kind: RegionKind, file_name: &str, region: &GrayImage) {
        let path = self.debug_dir.join(format!("{}_{file_name}", kind.debug_prefix()));
        if let Err(e) = preprocess::save_debug_region(region, &path) {
            tracing::warn!("Could not write debug region {}: {e}", path.display());
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
