//! DetectionPipeline - classify -> filter -> (consensus)
//!
//! ## Responsibilities
//!
//! - Run one frame through the classifier and the challenge filters
//! - Degrade classifier failures to a `false` candidate for every activity
//! - Produce the single-shot result (candidate = verdict, no window)
//! - Fold an evaluation into a session's windows for the streaming path
//!
//! The pipeline holds no per-client state, so one instance is shared by
//! every session and by the HTTP endpoint.

mod types;

pub use types::*;

use crate::challenge_filter::ChallengeFilterSet;
use crate::consensus_tracker::{ActivityWindows, ConsensusPolicy};
use crate::error::{Error, Result};
use crate::frame_classifier::FrameClassifier;
use std::sync::Arc;

pub struct DetectionPipeline {
    classifier: FrameClassifier,
    filters: Arc<ChallengeFilterSet>,
    policy: ConsensusPolicy,
}

impl DetectionPipeline {
    pub fn new(
        classifier: FrameClassifier,
        filters: ChallengeFilterSet,
        policy: ConsensusPolicy,
    ) -> Self {
        Self {
            classifier,
            filters: Arc::new(filters),
            policy,
        }
    }

    pub fn classifier(&self) -> &FrameClassifier {
        &self.classifier
    }

    /// Fresh, empty windows for a new session
    pub fn new_windows(&self) -> ActivityWindows {
        ActivityWindows::new(self.policy)
    }

    /// Evaluate one frame without touching any window.
    ///
    /// Only `Decode` (and internal task failures) surface as errors; classifier
    /// failures become an all-`false` evaluation.
    pub async fn evaluate_frame(&self, frame: Vec<u8>) -> Result<FrameEvaluation> {
        let classified = match self.classifier.classify(frame).await {
            Ok(classified) => classified,
            Err(e) if e.is_inference_failure() => {
                tracing::warn!(error = %e, "Classifier failed, treating frame as not detected");
                return Ok(FrameEvaluation::not_detected(e.code()));
            }
            Err(e) => return Err(e),
        };

        let filters = self.filters.clone();
        let (candidates, detections) = tokio::task::spawn_blocking(move || {
            let candidates = filters.evaluate(&classified);
            (candidates, classified.detections)
        })
        .await
        .map_err(|e| Error::Internal(format!("filter task failed: {}", e)))?;

        Ok(FrameEvaluation {
            candidates,
            detections,
            degraded: None,
        })
    }

    /// Stateless single-frame result: the candidate is the verdict
    pub async fn detect_single(&self, frame: Vec<u8>, test_mode: bool) -> Result<DetectionResult> {
        let evaluation = self.evaluate_frame(frame).await?;
        Ok(DetectionResult::new(
            evaluation.candidates,
            evaluation.detections,
            test_mode,
        ))
    }

    /// Fold an evaluation into a session's windows and build the streaming result
    pub fn apply(evaluation: FrameEvaluation, windows: &mut ActivityWindows) -> DetectionResult {
        let verdicts = windows.observe_all(evaluation.candidates);
        DetectionResult::new(verdicts, evaluation.detections, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge_filter::testing::{SOIL, WATER};
    use crate::frame_classifier::testing::{png_frame, FixedDetector};
    use crate::frame_classifier::Detection;
    use std::time::Duration;

    fn pipeline(detector: FixedDetector) -> DetectionPipeline {
        DetectionPipeline::new(
            FrameClassifier::new(Arc::new(detector), Duration::from_millis(100)),
            ChallengeFilterSet::standard(),
            ConsensusPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_single_shot_watering() {
        let pipeline = pipeline(FixedDetector::new(vec![
            Detection::new("person", 0.9),
            Detection::new("bottle", 0.8),
        ]));

        let result = pipeline
            .detect_single(png_frame(32, 32, WATER), true)
            .await
            .unwrap();
        assert!(result.watering_detected);
        assert!(!result.planting_detected);
        assert!(result.test_mode);
        assert_eq!(result.detected_objects.len(), 2);
    }

    #[tokio::test]
    async fn test_single_shot_is_idempotent() {
        let pipeline = pipeline(FixedDetector::new(vec![
            Detection::new("person", 0.9),
            Detection::new("pottedplant", 0.8),
        ]));
        let frame = png_frame(40, 40, SOIL);

        let first = pipeline.detect_single(frame.clone(), true).await.unwrap();
        let second = pipeline.detect_single(frame, true).await.unwrap();
        assert!(first.planting_detected);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_streaming_needs_six_frames() {
        let pipeline = pipeline(FixedDetector::new(vec![
            Detection::new("person", 0.9),
            Detection::new("pottedplant", 0.8),
        ]));
        let mut windows = pipeline.new_windows();

        let mut verdicts = Vec::new();
        for _ in 0..10 {
            let evaluation = pipeline
                .evaluate_frame(png_frame(40, 40, SOIL))
                .await
                .unwrap();
            assert!(evaluation.candidates.planting);
            verdicts.push(DetectionPipeline::apply(evaluation, &mut windows).planting_detected);
        }
        assert_eq!(verdicts.iter().position(|v| *v), Some(5));
        assert!(verdicts[5..].iter().all(|v| *v));
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_false_observation() {
        let pipeline = pipeline(
            FixedDetector::new(vec![
                Detection::new("person", 0.9),
                Detection::new("pottedplant", 0.8),
            ])
            .with_delay(Duration::from_millis(500)),
        );
        let mut windows = pipeline.new_windows();

        let evaluation = pipeline
            .evaluate_frame(png_frame(40, 40, SOIL))
            .await
            .unwrap();
        assert_eq!(evaluation.degraded, Some("INFERENCE_TIMEOUT"));

        let result = DetectionPipeline::apply(evaluation, &mut windows);
        assert!(!result.planting_detected);
        assert_eq!(windows.window(crate::challenge_filter::Activity::Planting).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_surfaces() {
        let pipeline = pipeline(FixedDetector::empty());
        let result = pipeline.detect_single(vec![0xde, 0xad], false).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_result_wire_shape() {
        let result = DetectionResult::new(
            crate::challenge_filter::ActivityFlags {
                planting: true,
                watering: false,
                waste_separation: false,
            },
            vec![Detection::new("person", 0.876)],
            true,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["planting_detected"], true);
        assert_eq!(json["watering_detected"], false);
        assert_eq!(json["waste_separation_detected"], false);
        assert_eq!(json["detected_objects"][0]["class"], "person");
        assert_eq!(json["detected_objects"][0]["confidence"], 0.88);
        assert_eq!(json["test_mode"], true);
    }
}
