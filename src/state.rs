//! Application state
//!
//! Holds all shared components and state

use crate::consensus_tracker::{ConsensusPolicy, DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::detection_pipeline::DetectionPipeline;
use crate::error::{Error, Result};
use crate::session_hub::{SessionHub, DEFAULT_QUEUE_DEPTH};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Object detector base URL
    pub detector_url: String,
    /// Per-frame classification budget
    pub classify_timeout: Duration,
    /// Frames buffered per session before the oldest is dropped
    pub frame_queue_depth: usize,
    /// Consensus window size (W)
    pub consensus_window: usize,
    /// Consensus threshold (T)
    pub consensus_threshold: usize,
    /// Upload cap for /detect
    pub max_upload_bytes: usize,
    /// Test client page directory
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8000),
            detector_url: std::env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            classify_timeout: Duration::from_millis(env_or("CLASSIFY_TIMEOUT_MS", 5000)),
            frame_queue_depth: env_or("FRAME_QUEUE_DEPTH", DEFAULT_QUEUE_DEPTH),
            consensus_window: env_or("CONSENSUS_WINDOW", DEFAULT_WINDOW),
            consensus_threshold: env_or("CONSENSUS_THRESHOLD", DEFAULT_THRESHOLD),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
        }
    }
}

impl AppConfig {
    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if !(self.detector_url.starts_with("http://") || self.detector_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "DETECTOR_URL must be an http(s) URL, got {:?}",
                self.detector_url
            )));
        }
        if self.classify_timeout.is_zero() {
            return Err(Error::Config("CLASSIFY_TIMEOUT_MS must be > 0".to_string()));
        }
        if self.consensus_threshold > self.consensus_window {
            tracing::warn!(
                window = self.consensus_window,
                threshold = self.consensus_threshold,
                "Consensus threshold exceeds window, clamping"
            );
        }
        Ok(())
    }

    /// Consensus policy with window/threshold clamped to sane bounds
    pub fn consensus_policy(&self) -> ConsensusPolicy {
        ConsensusPolicy::new(self.consensus_window, self.consensus_threshold)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// DetectionPipeline (shared, stateless)
    pub pipeline: Arc<DetectionPipeline>,
    /// SessionHub (WebSocket sessions)
    pub sessions: Arc<SessionHub>,
    /// Process start, for uptime
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: DetectionPipeline) -> Self {
        let pipeline = Arc::new(pipeline);
        let sessions = Arc::new(SessionHub::new(pipeline.clone(), config.frame_queue_depth));
        Self {
            config,
            pipeline,
            sessions,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_sec(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            detector_url: "http://localhost:9000".to_string(),
            classify_timeout: Duration::from_millis(100),
            frame_queue_depth: 2,
            consensus_window: 10,
            consensus_threshold: 6,
            max_upload_bytes: 1024,
            static_dir: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.detector_url = "localhost:9000".to_string();
        assert!(matches!(bad.validate(), Err(Error::Config(_))));

        let mut bad = config();
        bad.classify_timeout = Duration::ZERO;
        assert!(matches!(bad.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_policy_clamped() {
        let mut cfg = config();
        cfg.consensus_threshold = 50;
        let policy = cfg.consensus_policy();
        assert_eq!(policy.window, 10);
        assert_eq!(policy.threshold, 10);
    }
}
