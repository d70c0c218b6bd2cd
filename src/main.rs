//! Eco Challenge Detection Server
//!
//! Main entry point for the server application.

use eco_challenge_server::{
    challenge_filter::ChallengeFilterSet,
    detection_pipeline::DetectionPipeline,
    frame_classifier::{FrameClassifier, HttpDetector},
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eco_challenge_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Eco Challenge server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    config.validate()?;
    let policy = config.consensus_policy();
    tracing::info!(
        detector_url = %config.detector_url,
        classify_timeout_ms = config.classify_timeout.as_millis() as u64,
        frame_queue_depth = config.frame_queue_depth,
        consensus_window = policy.window,
        consensus_threshold = policy.threshold,
        "Configuration loaded"
    );

    // Initialize components
    let detector = Arc::new(HttpDetector::with_timeout(
        config.detector_url.clone(),
        config.classify_timeout,
    )?);
    let detector_base_url = detector.base_url().to_string();
    let classifier = FrameClassifier::new(detector, config.classify_timeout);
    tracing::info!(
        detector = classifier.detector_name(),
        base_url = %detector_base_url,
        "FrameClassifier initialized"
    );

    if !classifier.detector_healthy().await {
        tracing::warn!(
            detector_url = %config.detector_url,
            "Detector not reachable yet, frames will be reported as not detected until it is"
        );
    }

    let filters = ChallengeFilterSet::standard();
    tracing::info!(activities = ?filters.activities(), "ChallengeFilterSet initialized");

    let pipeline = DetectionPipeline::new(classifier, filters, policy);

    // Create application state
    let state = AppState::new(config, pipeline);

    let app = web_api::build_app(state.clone());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
