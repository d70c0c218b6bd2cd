//! HttpDetector - external inference server adapter
//!
//! Posts the raw frame as multipart to `{base_url}/v1/detect` and parses
//! the returned detection list.

use super::{Detection, DetectorResponse, ObjectDetector};
use crate::error::{Error, Result};
use async_trait::async_trait;
use image::RgbImage;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Remote object detector client
pub struct HttpDetector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetector {
    /// Create new detector client with a transport-level timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn detect(&self, encoded: &[u8], image: &RgbImage) -> Result<Vec<Detection>> {
        let url = format!("{}/v1/detect", self.base_url);

        let form = Form::new()
            .part(
                "file",
                Part::bytes(encoded.to_vec())
                    .file_name("frame.jpg")
                    .mime_str("image/jpeg")?,
            )
            .text("width", image.width().to_string())
            .text("height", image.height().to_string());

        let resp = self.client.post(&url).multipart(form).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "detector returned {} - {}",
                status, body
            )));
        }

        let parsed: DetectorResponse = resp
            .json()
            .await
            .map_err(|e| Error::Inference(format!("invalid detector response: {}", e)))?;

        Ok(parsed.into_detections())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/healthz", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Detector health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let detector =
            HttpDetector::with_timeout("http://localhost:9000/", Duration::from_secs(1)).unwrap();
        assert_eq!(detector.base_url(), "http://localhost:9000");
        assert_eq!(detector.name(), "http");
    }

    #[tokio::test]
    async fn test_unreachable_detector_is_inference_failure() {
        let detector =
            HttpDetector::with_timeout("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let image = RgbImage::new(2, 2);

        let err = detector.detect(&[1, 2, 3], &image).await.unwrap_err();
        assert!(err.is_inference_failure());
        assert!(!detector.health_check().await);
    }
}
