//! Non-local means denoising for single-channel images.
//!
//! Every output pixel is a weighted mean of the pixels in its search window,
//! weighted by how similar the template patch around each candidate is to the
//! template patch around the pixel itself:
//!
//! `w = exp(-d² / h²)` with `d²` the mean squared difference over the
//! template. Patch distances for one search offset are
//! computed for the whole image at once with a summed-area table, which keeps
//! the cost at O(pixels × search window area).
//!
//! Borders are handled by reflecting the image without repeating the edge pixel.

use image::{GrayImage, Luma};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlMeansParams {
    /// Filter strength. Larger values remove more noise and more detail.
    pub h: f32,
    /// Side of the square patch compared between pixels. Must be odd.
    pub template_window: u32,
    /// Side of the square window searched for similar patches. Must be odd.
    pub search_window: u32,
}

impl Default for NlMeansParams {
    fn default() -> Self {
        Self { h: 10.0, template_window: 7, search_window: 21 }
    }
}

pub fn nl_means(src: &GrayImage, params: NlMeansParams) -> GrayImage {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return src.clone();
    }

    let t = (params.template_window / 2) as i64;
    let s = (params.search_window / 2) as i64;
    let pad = s + t;
    let w = width as i64;
    let h = height as i64;

    let padded = Padded::new(src, pad);

    // Template neighbourhoods of all output pixels span a (w + 2t) × (h + 2t) area.
    let area_w = (w + 2 * t) as usize;
    let area_h = (h + 2 * t) as usize;
    let patch_len = (2 * t + 1) as usize;
    let patch_area = (patch_len * patch_len) as f64;
    let inv_h2 = 1.0 / (f64::from(params.h) * f64::from(params.h)).max(f64::MIN_POSITIVE);

    let n = (w * h) as usize;
    let mut weight_sum = vec![0.0f64; n];
    let mut value_sum = vec![0.0f64; n];
    let mut integral = vec![0u64; (area_w + 1) * (area_h + 1)];
    let stride = area_w + 1;

    for dy in -s..=s {
        for dx in -s..=s {
            // Summed-area table of squared differences for this offset.
            for ay in 0..area_h {
                let py = ay as i64 + pad - t;
                let mut row_sum = 0u64;
                for ax in 0..area_w {
                    let px = ax as i64 + pad - t;
                    let a = i64::from(padded.get(px, py));
                    let b = i64::from(padded.get(px + dx, py + dy));
                    let d = (a - b).unsigned_abs();
                    row_sum += d * d;
                    integral[(ay + 1) * stride + ax + 1] = integral[ay * stride + ax + 1] + row_sum;
                }
            }

            for y in 0..h as usize {
                for x in 0..w as usize {
                    let (x0, y0, x1, y1) = (x, y, x + patch_len, y + patch_len);
                    let ssd = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                        - integral[y0 * stride + x1]
                        - integral[y1 * stride + x0];
                    let dist = ssd as f64 / patch_area;
                    let weight = (-dist * inv_h2).exp();
                    let candidate = padded.get(x as i64 + pad + dx, y as i64 + pad + dy);
                    let idx = y * w as usize + x;
                    weight_sum[idx] += weight;
                    value_sum[idx] += weight * f64::from(candidate);
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let idx = (y * width + x) as usize;
        // The zero offset always contributes weight 1, so the sum is never 0.
        let v = value_sum[idx] / weight_sum[idx];
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Image padded by `pad` pixels on every side with reflect-101 borders.
struct Padded {
    data: Vec<u8>,
    width: usize,
}

impl Padded {
    fn new(src: &GrayImage, pad: i64) -> Self {
        let (w, h) = (src.width() as i64, src.height() as i64);
        let pw = w + 2 * pad;
        let ph = h + 2 * pad;
        let mut data = Vec::with_capacity((pw * ph) as usize);
        for y in 0..ph {
            let sy = reflect101(y - pad, h);
            for x in 0..pw {
                let sx = reflect101(x - pad, w);
                data.push(src.get_pixel(sx as u32, sy as u32)[0]);
            }
        }
        Self { data, width: pw as usize }
    }

    #[inline]
    fn get(&self, x: i64, y: i64) -> u8 {
        self.data[y as usize * self.width + x as usize]
    }
}

/// Map `i` into `0..len` by mirroring around the edge pixels (`dcb|abcd|cba`).
fn reflect101(mut i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    i = i.rem_euclid(period);
    if i >= len {
        period - i
    } else {
        i
    }
}
