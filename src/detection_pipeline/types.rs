//! Detection pipeline data types

use crate::challenge_filter::ActivityFlags;
use crate::frame_classifier::Detection;
use serde::{Deserialize, Serialize};

/// Result record sent to clients by both transports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub planting_detected: bool,
    pub watering_detected: bool,
    pub waste_separation_detected: bool,
    pub detected_objects: Vec<Detection>,
    pub test_mode: bool,
}

impl DetectionResult {
    pub fn new(verdicts: ActivityFlags, detected_objects: Vec<Detection>, test_mode: bool) -> Self {
        Self {
            planting_detected: verdicts.planting,
            watering_detected: verdicts.watering,
            waste_separation_detected: verdicts.waste_separation,
            detected_objects,
            test_mode,
        }
    }
}

/// Single-frame outcome before any temporal smoothing
#[derive(Debug, Clone)]
pub struct FrameEvaluation {
    /// Per-activity candidates for this frame
    pub candidates: ActivityFlags,
    /// Confident detections (empty when inference failed)
    pub detections: Vec<Detection>,
    /// Error code when the classifier failed and the frame degraded to `false`
    pub degraded: Option<&'static str>,
}

impl FrameEvaluation {
    /// Fail-safe evaluation: nothing detected
    pub fn not_detected(reason: &'static str) -> Self {
        Self {
            candidates: ActivityFlags::default(),
            detections: Vec::new(),
            degraded: Some(reason),
        }
    }
}
