use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use panscan_core::PixelRegion;
use std::path::Path;
use thiserror::Error;

use crate::denoise::{nl_means, NlMeansParams};

/// Regions shorter than this are upscaled before recognition.
pub const MIN_REGION_HEIGHT: u32 = 50;
pub const UPSCALE_FACTOR: u32 = 2;
/// Contrast gain applied after denoising (no brightness offset).
pub const CONTRAST_ALPHA: f32 = 1.5;

pub const DENOISE: NlMeansParams = NlMeansParams { h: 10.0, template_window: 7, search_window: 21 };

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
}

/// Decode an image file into RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, PreprocessError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Crop `region` out of `image` and prepare it for recognition.
///
/// `None` (a degenerate region) stays `None`.
pub fn prepare_region(image: &RgbImage, region: Option<PixelRegion>) -> Option<GrayImage> {
    let region = region?;
    let crop = imageops::crop_imm(image, region.x_min, region.y_min, region.width(), region.height()).to_image();
    Some(normalize(&crop))
}

/// Luminance → upscale small crops → denoise → contrast stretch.
fn normalize(region: &RgbImage) -> GrayImage {
    let mut gray = luminance(region);

    if gray.height() < MIN_REGION_HEIGHT {
        gray = imageops::resize(
            &gray,
            gray.width() * UPSCALE_FACTOR,
            gray.height() * UPSCALE_FACTOR,
            FilterType::CatmullRom,
        );
    }

    let denoised = nl_means(&gray, DENOISE);
    stretch_contrast(&denoised, CONTRAST_ALPHA)
}

/// ITU-R BT.601 luma, the weighting document scanners and most OCR tooling use.
fn luminance(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let v = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// `clamp(alpha * v, 0, 255)` per pixel, rounded to nearest.
fn stretch_contrast(img: &GrayImage, alpha: f32) -> GrayImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p[0] = (alpha * f32::from(p[0])).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Persist a processed region next to its siblings for manual inspection.
pub fn save_debug_region(region: &GrayImage, path: &Path) -> Result<(), PreprocessError> {
    DynamicImage::ImageLuma8(region.clone()).save(path)?;
    Ok(())
}
