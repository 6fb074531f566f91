//! Reader for per-image annotation files.
//!
//! Every line is `<class_code> <cx> <cy> <w> <h>`: an integer class
//! code followed by a center-based box normalized to the image size.

use panscan_core::{AnnotatedRegion, NormalizedBox, RegionKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("annotation line {line}: {message}")]
pub struct AnnotationError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationLine {
    pub class_code: i64,
    pub bbox: NormalizedBox,
}

impl AnnotationLine {
    /// The region this line describes, or `None` for class codes the
    /// extractor does not use.
    pub fn region(&self) -> Option<AnnotatedRegion> {
        RegionKind::from_class_code(self.class_code).map(|kind| AnnotatedRegion { kind, bbox: self.bbox })
    }
}

/// Parse one line. A blank line has no fields and is rejected like any
/// other short line.
pub fn parse_annotation_line(line: &str, line_num: usize) -> Result<AnnotationLine, AnnotationError> {
    // At most 6 tokens are collected; a sixth one is already an error.
    let tokens: Vec<&str> = line.split_whitespace().take(6).collect();
    if tokens.len() < 5 {
        return Err(AnnotationError {
            line: line_num,
            message: format!("expected 5 fields, found {}", tokens.len()),
        });
    }
    if tokens.len() > 5 {
        return Err(AnnotationError {
            line: line_num,
            message: "expected 5 fields, found more than 5".to_string(),
        });
    }

    let class_code = tokens[0].parse::<i64>().map_err(|_| AnnotationError {
        line: line_num,
        message: format!("invalid class code '{}'", tokens[0]),
    })?;

    let cx = parse_coord(tokens[1], "center_x", line_num)?;
    let cy = parse_coord(tokens[2], "center_y", line_num)?;
    let w = parse_coord(tokens[3], "width", line_num)?;
    let h = parse_coord(tokens[4], "height", line_num)?;

    Ok(AnnotationLine { class_code, bbox: NormalizedBox::new(cx, cy, w, h) })
}

fn parse_coord(token: &str, field: &str, line_num: usize) -> Result<f64, AnnotationError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AnnotationError {
            line: line_num,
            message: format!("invalid {field} '{token}'"),
        }),
    }
}

/// Parse a whole annotation file into the regions the extractor cares about,
/// in file order. Any malformed line, blank ones included, fails the whole
/// file. A single trailing newline does not form a line.
pub fn parse_annotation_file(content: &str) -> Result<Vec<AnnotatedRegion>, AnnotationError> {
    let mut regions = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        regions.extend(parse_annotation_line(line, idx + 1)?.region());
    }
    Ok(regions)
}
