//! ChallengeFilter - per-activity single-frame signals
//!
//! ## Responsibilities
//!
//! - Decide, for one frame, whether an activity's signature is present
//! - Gate on label presence (subject + context) before any pixel work
//! - Run the activity's pixel/shape heuristic over the full image
//!
//! Filters are stateless: identical (image, detections) always yield the
//! same answer, and they may run concurrently.

mod pixel;
mod planting;
mod waste_separation;
mod watering;

pub use pixel::{count_in_hsv_range, rgb_to_hsv, HsvRange};
pub use planting::PlantingFilter;
pub use waste_separation::WasteSeparationFilter;
pub use watering::WateringFilter;

use crate::frame_classifier::{ClassifiedFrame, Detection};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracked challenge activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Planting,
    Watering,
    WasteSeparation,
}

impl Activity {
    /// Evaluation order
    pub const ALL: [Activity; 3] = [
        Activity::Planting,
        Activity::Watering,
        Activity::WasteSeparation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Planting => "planting",
            Activity::Watering => "watering",
            Activity::WasteSeparation => "waste_separation",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One boolean per activity (candidates or verdicts)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFlags {
    pub planting: bool,
    pub watering: bool,
    pub waste_separation: bool,
}

impl ActivityFlags {
    pub fn from_fn(mut f: impl FnMut(Activity) -> bool) -> Self {
        Self {
            planting: f(Activity::Planting),
            watering: f(Activity::Watering),
            waste_separation: f(Activity::WasteSeparation),
        }
    }

    pub fn get(&self, activity: Activity) -> bool {
        match activity {
            Activity::Planting => self.planting,
            Activity::Watering => self.watering,
            Activity::WasteSeparation => self.waste_separation,
        }
    }

    pub fn set(&mut self, activity: Activity, value: bool) {
        match activity {
            Activity::Planting => self.planting = value,
            Activity::Watering => self.watering = value,
            Activity::WasteSeparation => self.waste_separation = value,
        }
    }
}

/// Required labels: at least one subject and at least one context label
#[derive(Debug, Clone, Copy)]
pub struct LabelGate {
    pub subject: &'static [&'static str],
    pub context: &'static [&'static str],
}

impl LabelGate {
    pub fn has_subject(&self, detections: &[Detection]) -> bool {
        detections
            .iter()
            .any(|d| self.subject.contains(&d.label.as_str()))
    }

    pub fn has_context(&self, detections: &[Detection]) -> bool {
        detections
            .iter()
            .any(|d| self.context.contains(&d.label.as_str()))
    }

    pub fn admits(&self, detections: &[Detection]) -> bool {
        self.has_subject(detections) && self.has_context(detections)
    }
}

/// Single-frame activity filter
pub trait ActivityFilter: Send + Sync {
    fn activity(&self) -> Activity;

    fn label_gate(&self) -> &LabelGate;

    /// Material-evidence check over the whole image
    fn heuristic(&self, image: &RgbImage) -> bool;

    /// Label gate, then heuristic. The heuristic never runs when the gate fails.
    fn evaluate(&self, image: &RgbImage, detections: &[Detection]) -> bool {
        let gate = self.label_gate();
        if !gate.admits(detections) {
            tracing::trace!(
                activity = %self.activity(),
                has_subject = gate.has_subject(detections),
                has_context = gate.has_context(detections),
                "Label gate closed"
            );
            return false;
        }
        let hit = self.heuristic(image);
        tracing::debug!(activity = %self.activity(), candidate = hit, "Heuristic evaluated");
        hit
    }
}

/// The three challenge filters, evaluated in [`Activity::ALL`] order
pub struct ChallengeFilterSet {
    filters: Vec<Box<dyn ActivityFilter>>,
}

impl ChallengeFilterSet {
    pub fn new(filters: Vec<Box<dyn ActivityFilter>>) -> Self {
        Self { filters }
    }

    /// Planting, watering and waste separation with their calibrated constants
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(PlantingFilter),
            Box::new(WateringFilter),
            Box::new(WasteSeparationFilter),
        ])
    }

    /// Per-activity candidates for one frame. Activities without a filter are `false`.
    pub fn evaluate(&self, frame: &ClassifiedFrame) -> ActivityFlags {
        let mut flags = ActivityFlags::default();
        for filter in &self.filters {
            let hit = filter.evaluate(&frame.image, &frame.detections);
            flags.set(filter.activity(), hit);
        }
        flags
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.filters.iter().map(|f| f.activity()).collect()
    }
}

impl Default for ChallengeFilterSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use image::{Rgb, RgbImage};

    /// Brown "soil": HSV ~ (15, 204, 150)
    pub const SOIL: [u8; 3] = [150, 90, 30];
    /// Blue "water": HSV ~ (115, 217, 200)
    pub const WATER: [u8; 3] = [30, 60, 200];

    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    /// Dark background with one bright rectangle
    pub fn bright_rectangle(width: u32, height: u32, rect: (u32, u32, u32, u32)) -> RgbImage {
        let (x0, y0, w, h) = rect;
        RgbImage::from_fn(width, height, |x, y| {
            if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                Rgb([230, 230, 230])
            } else {
                Rgb([10, 10, 10])
            }
        })
    }
}
