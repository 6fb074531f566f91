use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];
pub const ANNOTATION_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Image directory '{0}' not found")]
    DirectoryNotFound(PathBuf),
    #[error("Failed to list '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An image together with the annotation file that shares its base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLabelPair {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

impl ImageLabelPair {
    /// File name of the image, used as the record's source and in debug names.
    pub fn image_file_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Pair every image in `images_dir` with `<stem>.txt` in `labels_dir`.
///
/// Images without an annotation file are dropped silently. Pairs are returned
/// in file-name order.
pub fn pair_dataset(images_dir: &Path, labels_dir: &Path) -> Result<Vec<ImageLabelPair>, PairingError> {
    if !images_dir.is_dir() {
        return Err(PairingError::DirectoryNotFound(images_dir.to_path_buf()));
    }

    let entries = fs::read_dir(images_dir)
        .map_err(|source| PairingError::Io { path: images_dir.to_path_buf(), source })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PairingError::Io { path: images_dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut pairs = Vec::with_capacity(images.len());
    for image_path in images {
        let Some(stem) = image_path.file_stem() else {
            continue;
        };
        let mut label_name = stem.to_os_string();
        label_name.push(".");
        label_name.push(ANNOTATION_EXTENSION);
        let label_path = labels_dir.join(label_name);
        if label_path.is_file() {
            pairs.push(ImageLabelPair { image_path, label_path });
        } else {
            tracing::debug!("No annotation for {}", image_path.display());
        }
    }

    Ok(pairs)
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    IMAGE_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed))
}
