//! Eco Challenge Detection Server Library
//!
//! Turns a live stream of camera frames into stable, debounced
//! "activity detected" signals for planting, watering and waste separation.
//!
//! ## Architecture (6 Components)
//!
//! 1. FrameClassifier - Frame decoding + object detector adapter
//! 2. ChallengeFilter - Per-activity label gate + pixel heuristic
//! 3. ConsensusTracker - Rolling-window majority vote per activity
//! 4. DetectionPipeline - classify -> filter -> consensus glue
//! 5. SessionHub - WebSocket sessions, commands, per-session windows
//! 6. WebAPI - WebSocket and single-shot HTTP endpoints
//!
//! ## Design Principles
//!
//! - Sessions never share windows
//! - Only booleans enter the consensus windows
//! - The detector is injected, never global

pub mod challenge_filter;
pub mod consensus_tracker;
pub mod detection_pipeline;
pub mod error;
pub mod frame_classifier;
pub mod models;
pub mod session_hub;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
