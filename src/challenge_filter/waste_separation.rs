//! Waste separation: a person with a waste item, and a bin-like rectangle in view

use super::pixel::{has_large_quadrilateral, to_gray};
use super::{Activity, ActivityFilter, LabelGate};
use image::RgbImage;
use imageproc::contrast::{threshold, ThresholdType};

const GATE: LabelGate = LabelGate {
    subject: &["person"],
    context: &["bottle", "cup", "bowl", "banana", "apple", "orange"],
};

/// Gray level above which a pixel is foreground
const BINARY_THRESHOLD: u8 = 100;
/// Polygon approximation tolerance as a fraction of the contour perimeter
const APPROX_EPSILON_RATIO: f64 = 0.02;
/// Contour area needed (strictly more than)
const MIN_BIN_AREA: f64 = 5000.0;

pub struct WasteSeparationFilter;

impl ActivityFilter for WasteSeparationFilter {
    fn activity(&self) -> Activity {
        Activity::WasteSeparation
    }

    fn label_gate(&self) -> &LabelGate {
        &GATE
    }

    fn heuristic(&self, image: &RgbImage) -> bool {
        let binary = threshold(&to_gray(image), BINARY_THRESHOLD, ThresholdType::Binary);
        has_large_quadrilateral(&binary, APPROX_EPSILON_RATIO, MIN_BIN_AREA)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::frame_classifier::Detection;

    fn labels() -> Vec<Detection> {
        vec![Detection::new("person", 0.9), Detection::new("banana", 0.6)]
    }

    #[test]
    fn test_large_rectangle() {
        let image = bright_rectangle(200, 200, (40, 40, 100, 80));
        assert!(WasteSeparationFilter.evaluate(&image, &labels()));
    }

    #[test]
    fn test_bin_against_left_edge() {
        let image = bright_rectangle(200, 200, (0, 50, 120, 100));
        assert!(WasteSeparationFilter.evaluate(&image, &labels()));
    }

    #[test]
    fn test_fully_bright_frame() {
        let image = solid(200, 200, [230, 230, 230]);
        assert!(WasteSeparationFilter.evaluate(&image, &labels()));
    }

    #[test]
    fn test_gray_at_threshold_is_background() {
        // Luma 100 is not strictly above the threshold
        let image = solid(200, 200, [100, 100, 100]);
        assert!(!WasteSeparationFilter.evaluate(&image, &labels()));
    }

    #[test]
    fn test_small_rectangle() {
        let image = bright_rectangle(200, 200, (40, 40, 30, 30));
        assert!(!WasteSeparationFilter.evaluate(&image, &labels()));
    }

    #[test]
    fn test_dark_frame() {
        assert!(!WasteSeparationFilter.evaluate(&solid(200, 200, [10, 10, 10]), &labels()));
    }

    #[test]
    fn test_without_waste_item() {
        let image = bright_rectangle(200, 200, (40, 40, 100, 80));
        let detections = vec![Detection::new("person", 0.9), Detection::new("laptop", 0.9)];
        assert!(!WasteSeparationFilter.evaluate(&image, &detections));
    }
}
