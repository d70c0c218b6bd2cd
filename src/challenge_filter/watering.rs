//! Watering: a person holding a container, with visible water

use super::pixel::{count_in_hsv_range, HsvRange};
use super::{Activity, ActivityFilter, LabelGate};
use image::RgbImage;

const GATE: LabelGate = LabelGate {
    subject: &["person"],
    context: &["bottle", "cup"],
};

/// Blue water mask
const WATER_RANGE: HsvRange = HsvRange::new([90, 50, 50], [130, 255, 255]);

/// Water pixels needed (strictly more than)
const MIN_WATER_PIXELS: usize = 500;

pub struct WateringFilter;

impl ActivityFilter for WateringFilter {
    fn activity(&self) -> Activity {
        Activity::Watering
    }

    fn label_gate(&self) -> &LabelGate {
        &GATE
    }

    fn heuristic(&self, image: &RgbImage) -> bool {
        let water = count_in_hsv_range(image, &WATER_RANGE);
        tracing::debug!(water_pixels = water, "Watering colour check");
        water > MIN_WATER_PIXELS
    }
}
