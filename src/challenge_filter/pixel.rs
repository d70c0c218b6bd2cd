//! Pixel and shape heuristics shared by the challenge filters
//!
//! Colour thresholds use the 8-bit HSV convention (H in 0..=180, S and V in
//! 0..=255) so the filter constants read the same as the calibrated values.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::point::Point;

/// Inclusive HSV bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// RGB -> 8-bit HSV (hue halved into 0..=180)
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { 255.0 * diff / max } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        max as u8,
    ]
}

/// Number of pixels whose HSV value falls inside `range`
pub fn count_in_hsv_range(image: &RgbImage, range: &HsvRange) -> usize {
    image
        .pixels()
        .filter(|p| range.contains(rgb_to_hsv(p.0)))
        .count()
}

/// Luma with the 0.299 / 0.587 / 0.114 weighting
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0.map(f32::from);
        Luma([(0.299 * r + 0.587 * g + 0.114 * b).round() as u8])
    })
}

/// Whether any external contour approximates to a quadrilateral larger than `min_area`.
///
/// The image is framed with a 1-pixel zero border first, so regions touching
/// the image edge are still traced as outer borders.
pub fn has_large_quadrilateral(binary: &GrayImage, epsilon_ratio: f64, min_area: f64) -> bool {
    let padded = pad_with_zeros(binary);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .any(|contour| {
            if contour.points.len() < 4 {
                return false;
            }
            let points: Vec<Point<i32>> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();

            let area = contour_area(&points);
            if area <= min_area {
                return false;
            }
            let epsilon = epsilon_ratio * arc_length(&points, true);
            if epsilon <= 0.0 {
                return false;
            }
            let approx = approximate_polygon_dp(&points, epsilon, true);
            let quad = approx.len() == 4;
            if quad {
                tracing::debug!(area = area, "Rectangle contour found");
            }
            quad
        })
}

/// Copy of `image` inside a 1-pixel border of zeros
fn pad_with_zeros(image: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(image.width() + 2, image.height() + 2);
    for (x, y, p) in image.enumerate_pixels() {
        padded.put_pixel(x + 1, y + 1, *p);
    }
    padded
}
