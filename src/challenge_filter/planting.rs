//! Planting: a person next to a plant, with visible soil

use super::pixel::{count_in_hsv_range, HsvRange};
use super::{Activity, ActivityFilter, LabelGate};
use image::RgbImage;

const GATE: LabelGate = LabelGate {
    subject: &["person"],
    context: &["pottedplant", "vase"],
};

/// Brown soil mask
const SOIL_RANGE: HsvRange = HsvRange::new([10, 100, 20], [20, 255, 200]);

/// Soil pixels needed (strictly more than)
const MIN_SOIL_PIXELS: usize = 1000;

pub struct PlantingFilter;

impl ActivityFilter for PlantingFilter {
    fn activity(&self) -> Activity {
        Activity::Planting
    }

    fn label_gate(&self) -> &LabelGate {
        &GATE
    }

    fn heuristic(&self, image: &RgbImage) -> bool {
        let soil = count_in_hsv_range(image, &SOIL_RANGE);
        tracing::debug!(soil_pixels = soil, "Planting soil check");
        soil > MIN_SOIL_PIXELS
    }
}
