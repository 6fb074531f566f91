use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation class code for the identifier field.
pub const CLASS_CODE_IDENTIFIER: i64 = 2;
/// Annotation class code for the name field.
pub const CLASS_CODE_NAME: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Identifier,
    Name,
}

impl RegionKind {
    /// Maps an annotation class code to a region kind. Unknown codes map to `None`.
    pub fn from_class_code(code: i64) -> Option<Self> {
        match code {
            CLASS_CODE_IDENTIFIER => Some(RegionKind::Identifier),
            CLASS_CODE_NAME => Some(RegionKind::Name),
            _ => None,
        }
    }

    /// Prefix used when persisting debug copies of accepted regions.
    pub fn debug_prefix(self) -> &'static str {
        match self {
            RegionKind::Identifier => "identifier",
            RegionKind::Name => "name",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Identifier => write!(f, "Identifier"),
            RegionKind::Name => write!(f, "Name"),
        }
    }
}

/// Center-based box expressed as fractions of the image width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self { center_x, center_y, width, height }
    }

    /// Project into pixel space for an image of `image_width` × `image_height`.
    ///
    /// Out-of-range boxes are clamped to the image. Returns `None` when the
    /// clamped rectangle has no area.
    pub fn project(&self, image_width: u32, image_height: u32) -> Option<PixelRegion> {
        let w = i64::from(image_width);
        let h = i64::from(image_height);

        let left = round_px((self.center_x - self.width / 2.0) * w as f64);
        let top = round_px((self.center_y - self.height / 2.0) * h as f64);
        let box_w = round_px(self.width * w as f64);
        let box_h = round_px(self.height * h as f64);

        let x_min = left.max(0);
        let y_min = top.max(0);
        // The far corner is taken from the clamped origin, then clamped to the image.
        let x_max = x_min.saturating_add(box_w).min(w);
        let y_max = y_min.saturating_add(box_h).min(h);

        if x_max <= x_min || y_max <= y_min {
            return None;
        }

        Some(PixelRegion {
            x_min: x_min as u32,
            y_min: y_min as u32,
            x_max: x_max as u32,
            y_max: y_max as u32,
        })
    }
}

fn round_px(v: f64) -> i64 {
    // NaN collapses to 0; `as` saturates infinities.
    v.round() as i64
}

/// One parsed annotation line that maps to a known region kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRegion {
    pub kind: RegionKind,
    pub bbox: NormalizedBox,
}

/// Axis-aligned pixel rectangle with exclusive max corner.
///
/// Only produced by [`NormalizedBox::project`], so `x_max > x_min` and
/// `y_max > y_min` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl PixelRegion {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_map_to_kinds() {
        assert_eq!(RegionKind::from_class_code(2), Some(RegionKind::Identifier));
        assert_eq!(RegionKind::from_class_code(0), Some(RegionKind::Name));
        assert_eq!(RegionKind::from_class_code(1), None);
        assert_eq!(RegionKind::from_class_code(-3), None);
    }

    #[test]
    fn project_centered_box() {
        let r = NormalizedBox::new(0.5, 0.5, 0.5, 0.5).project(200, 100).unwrap();
        assert_eq!(r, PixelRegion { x_min: 50, y_min: 25, x_max: 150, y_max: 75 });
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
    }

    #[test]
    fn project_rounds_to_nearest_pixel() {
        // left edge 3.33 -> 3, width 2.6 -> 3
        let r = NormalizedBox::new(0.463, 0.5, 0.26, 1.0).project(10, 10).unwrap();
        assert_eq!(r.x_min, 3);
        assert_eq!(r.x_max, 6);
    }

    #[test]
    fn project_clamps_negative_origin() {
        let r = NormalizedBox::new(0.0, 0.0, 0.4, 0.4).project(100, 100).unwrap();
        assert_eq!(r.x_min, 0);
        assert_eq!(r.y_min, 0);
        assert_eq!(r.x_max, 40);
        assert_eq!(r.y_max, 40);
    }

    #[test]
    fn project_clamps_far_corner() {
        let r = NormalizedBox::new(0.95, 0.95, 0.5, 0.5).project(100, 100).unwrap();
        assert_eq!(r.x_max, 100);
        assert_eq!(r.y_max, 100);
        assert_eq!(r.x_min, 70);
    }

    #[test]
    fn zero_sized_box_is_empty() {
        assert!(NormalizedBox::new(0.5, 0.5, 0.0, 0.3).project(640, 480).is_none());
        assert!(NormalizedBox::new(0.5, 0.5, 0.3, 0.0).project(640, 480).is_none());
    }

    #[test]
    fn box_outside_image_is_empty() {
        assert!(NormalizedBox::new(1.8, 0.5, 0.2, 0.2).project(640, 480).is_none());
        assert!(NormalizedBox::new(0.5, -0.9, 0.2, 0.2).project(640, 480).is_none());
    }

    #[test]
    fn non_finite_box_does_not_panic() {
        let r = NormalizedBox::new(f64::NAN, 0.5, 0.2, 0.2).project(10, 10).unwrap();
        assert_eq!((r.x_min, r.x_max), (0, 2));
        let r = NormalizedBox::new(0.5, 0.5, f64::INFINITY, 0.2).project(10, 10).unwrap();
        assert_eq!((r.x_min, r.x_max), (0, 10));
    }

    #[test]
    fn projection_always_inside_image() {
        let sizes = [(1u32, 1u32), (7, 3), (640, 480), (1023, 2047)];
        let steps = [-0.5, -0.01, 0.0, 0.1, 0.33, 0.5, 0.77, 0.999, 1.0, 1.4];
        for &(w, h) in &sizes {
            for &cx in &steps {
                for &cy in &steps {
                    for &bw in &steps {
                        for &bh in &steps {
                            if let Some(r) = NormalizedBox::new(cx, cy, bw, bh).project(w, h) {
                                assert!(r.x_min < r.x_max && r.x_max <= w, "{r:?} in {w}x{h}");
                                assert!(r.y_min < r.y_max && r.y_max <= h, "{r:?} in {w}x{h}");
                            }
                        }
                    }
                }
            }
        }
    }
}
