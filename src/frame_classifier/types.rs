//! Frame classifier data types

use image::RgbImage;
use serde::{Deserialize, Serialize, Serializer};

/// Only detections strictly above this confidence reach filters and clients
pub const MIN_CONFIDENCE: f32 = 0.5;

/// One labelled object found in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label (COCO-style, e.g. "person", "pottedplant")
    #[serde(rename = "class", alias = "label")]
    pub label: String,
    /// Confidence in [0, 1]; rounded to two decimals on the wire
    #[serde(alias = "conf", serialize_with = "serialize_rounded")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Passes the fixed confidence policy
    pub fn is_confident(&self) -> bool {
        self.confidence > MIN_CONFIDENCE
    }
}

fn serialize_rounded<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    let rounded = (f64::from(*value) * 100.0).round() / 100.0;
    serializer.serialize_f64(rounded)
}

/// Decoded frame plus its confident detections
#[derive(Debug, Clone)]
pub struct ClassifiedFrame {
    pub image: RgbImage,
    pub detections: Vec<Detection>,
}

/// Detector response body.
/// Accepts either a bare array or `{"detections": [...]}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DetectorResponse {
    Bare(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

impl DetectorResponse {
    pub fn into_detections(self) -> Vec<Detection> {
        match self {
            DetectorResponse::Bare(detections) => detections,
            DetectorResponse::Wrapped { detections } => detections,
        }
    }
}
