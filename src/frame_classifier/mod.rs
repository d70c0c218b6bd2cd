//! FrameClassifier - Object Detector Adapter
//!
//! ## Responsibilities
//!
//! - Decode raw frame bytes into an RGB image
//! - Run the injected object detector with a bounded timeout
//! - Apply the fixed confidence policy (> 0.5)
//!
//! The detector itself is an external collaborator behind [`ObjectDetector`];
//! swapping it does not touch filters, consensus or sessions.

mod http_detector;
mod types;

pub use http_detector::HttpDetector;
pub use types::*;

use crate::error::{Error, Result};
use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;

/// Object detector backend
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Detect objects in a frame.
    ///
    /// `encoded` is the frame as received from the client, `image` the decoded pixels.
    async fn detect(&self, encoded: &[u8], image: &RgbImage) -> Result<Vec<Detection>>;

    /// Backend reachability
    async fn health_check(&self) -> bool {
        true
    }
}

/// Decode + detect + confidence policy
pub struct FrameClassifier {
    detector: Arc<dyn ObjectDetector>,
    timeout: Duration,
}

impl FrameClassifier {
    pub fn new(detector: Arc<dyn ObjectDetector>, timeout: Duration) -> Self {
        Self { detector, timeout }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub async fn detector_healthy(&self) -> bool {
        self.detector.health_check().await
    }

    /// Classify one frame.
    ///
    /// Fails with `Decode` for unreadable bytes, `Inference` when the detector
    /// errors and `InferenceTimeout` when it does not answer in time.
    pub async fn classify(&self, frame: Vec<u8>) -> Result<ClassifiedFrame> {
        let (frame, image) = tokio::task::spawn_blocking(move || {
            decode_frame(&frame).map(|image| (frame, image))
        })
        .await
        .map_err(|e| Error::Internal(format!("decode task failed: {}", e)))??;

        let detections =
            match tokio::time::timeout(self.timeout, self.detector.detect(&frame, &image)).await {
                Ok(Ok(detections)) => detections,
                Ok(Err(e)) if e.is_inference_failure() => return Err(e),
                Ok(Err(e)) => return Err(Error::Inference(e.to_string())),
                Err(_) => {
                    tracing::warn!(
                        detector = self.detector.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Detector timed out"
                    );
                    return Err(Error::InferenceTimeout(self.timeout.as_millis() as u64));
                }
            };

        let total = detections.len();
        let detections: Vec<Detection> = detections
            .into_iter()
            .filter(Detection::is_confident)
            .collect();

        tracing::debug!(
            detector = self.detector.name(),
            total = total,
            confident = detections.len(),
            width = image.width(),
            height = image.height(),
            "Frame classified"
        );

        Ok(ClassifiedFrame { image, detections })
    }
}

/// Decode encoded image bytes (JPEG, PNG, ...) into RGB
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(Error::Decode("empty frame".to_string()));
    }
    let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(image.to_rgb8())
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_classify_filters_low_confidence() {
        let detector = Arc::new(FixedDetector::new(vec![
            Detection::new("person", 0.9),
            Detection::new("cup", 0.5),
            Detection::new("bottle", 0.2),
        ]));
        let classifier = FrameClassifier::new(detector, Duration::from_secs(1));

        let frame = classifier
            .classify(png_frame(8, 8, [0, 0, 255]))
            .await
            .unwrap();
        assert_eq!(frame.detections, vec![Detection::new("person", 0.9)]);
        assert_eq!(frame.image.dimensions(), (8, 8));
    }

    #[tokio::test]
    async fn test_classify_rejects_garbage() {
        let detector = Arc::new(FixedDetector::empty());
        let classifier = FrameClassifier::new(detector.clone(), Duration::from_secs(1));

        let result = classifier.classify(b"not an image".to_vec()).await;
        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(detector.calls(), 0);
    }

    #[tokio::test]
    async fn test_classify_timeout() {
        let detector =
            Arc::new(FixedDetector::empty().with_delay(Duration::from_millis(200)));
        let classifier = FrameClassifier::new(detector, Duration::from_millis(20));

        let result = classifier.classify(png_frame(4, 4, [0, 0, 0])).await;
        assert!(matches!(result, Err(Error::InferenceTimeout(20))));
    }

    #[tokio::test]
    async fn test_classify_inference_error() {
        let classifier =
            FrameClassifier::new(Arc::new(FixedDetector::failing()), Duration::from_secs(1));

        let result = classifier.classify(png_frame(4, 4, [0, 0, 0])).await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode_frame(&[]), Err(Error::Decode(_))));
    }
}
