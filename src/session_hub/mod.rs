//! SessionHub - WebSocket session management
//!
//! ## Responsibilities
//!
//! - Session registry (one entry per live connection)
//! - Per-session consensus windows, never shared between sessions
//! - Inbound demultiplexing: commands, chat messages, frames
//! - Per-session frame serialization (one worker, bounded drop-oldest queue)
//! - Server notice fan-out
//!
//! Outbound traffic goes through an unbounded channel per session; the
//! transport drains it into the socket.

mod frame_queue;
mod types;

pub use frame_queue::FrameQueue;
pub use types::*;

use crate::consensus_tracker::ActivityWindows;
use crate::detection_pipeline::{DetectionPipeline, DetectionResult};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default frame queue depth per session
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

/// Mutable per-session state shared with the worker
struct SessionState {
    windows: Mutex<ActivityWindows>,
    queue: FrameQueue,
    closed: AtomicBool,
    test_mode: AtomicBool,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
}

impl SessionState {
    fn new(windows: ActivityWindows, queue_depth: usize) -> Self {
        Self {
            windows: Mutex::new(windows),
            queue: FrameQueue::new(queue_depth),
            closed: AtomicBool::new(false),
            test_mode: AtomicBool::new(false),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    fn windows(&self) -> MutexGuard<'_, ActivityWindows> {
        self.windows.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.queue.close();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn test_mode(&self) -> bool {
        self.test_mode.load(Ordering::SeqCst)
    }
}

/// Session identity plus the handles needed to talk to it
#[derive(Clone)]
struct SessionHandle {
    id: Uuid,
    client_id: Option<String>,
    kind: SessionKind,
    connected_at: DateTime<Utc>,
    tx: mpsc::UnboundedSender<String>,
    state: Arc<SessionState>,
}

impl SessionHandle {
    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            client_id: self.client_id.clone(),
            kind: self.kind,
            connected_at: self.connected_at,
            test_mode: self.state.test_mode(),
            frames_processed: self.state.frames_processed.load(Ordering::Relaxed),
            frames_dropped: self.state.frames_dropped.load(Ordering::Relaxed),
            queued_frames: self.state.queue.len(),
            windows: self.state.windows().snapshot(),
        }
    }
}

/// Registered session
struct SessionEntry {
    handle: SessionHandle,
    worker: Option<JoinHandle<()>>,
}

/// SessionHub instance
pub struct SessionHub {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    session_count: AtomicU64,
    pipeline: Arc<DetectionPipeline>,
    queue_depth: usize,
}

impl SessionHub {
    /// Create new SessionHub
    pub fn new(pipeline: Arc<DetectionPipeline>, queue_depth: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_count: AtomicU64::new(0),
            pipeline,
            queue_depth,
        }
    }

    /// Register a new session with empty windows
    pub async fn register(
        &self,
        kind: SessionKind,
        client_id: Option<String>,
    ) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(SessionState::new(
            self.pipeline.new_windows(),
            self.queue_depth,
        ));

        let worker = match kind {
            SessionKind::Video => Some(tokio::spawn(run_worker(
                id,
                state.clone(),
                self.pipeline.clone(),
                tx.clone(),
            ))),
            SessionKind::Chat => None,
        };

        let entry = SessionEntry {
            handle: SessionHandle {
                id,
                client_id: client_id.clone(),
                kind,
                connected_at: Utc::now(),
                tx,
                state,
            },
            worker,
        };

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id, entry);
        }

        self.session_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            session_id = %id,
            client_id = ?client_id,
            kind = ?kind,
            "Session registered"
        );

        (id, rx)
    }

    /// Drop a session, its windows and any in-flight frame. Idempotent.
    pub async fn unregister(&self, id: &Uuid) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        if let Some(entry) = removed {
            let state = &entry.handle.state;
            state.close();
            if let Some(worker) = entry.worker {
                worker.abort();
            }
            self.session_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(
                session_id = %id,
                frames_processed = state.frames_processed.load(Ordering::Relaxed),
                frames_dropped = state.frames_dropped.load(Ordering::Relaxed),
                "Session unregistered"
            );
        }
    }

    /// Route one inbound message.
    ///
    /// Commands and chat are answered immediately; frames are queued for the
    /// session worker. Fails with `NotFound` for an unknown session and with
    /// `Connection` when the session's outbound channel is gone.
    pub async fn dispatch(&self, id: &Uuid, message: InboundMessage) -> Result<()> {
        let session = self.handle(id).await?;

        let reply = match message {
            InboundMessage::Text(text) => Some(self.handle_text(&session, text)),
            InboundMessage::Binary(frame) => self.handle_frame(&session, frame),
        };

        if let Some(reply) = reply {
            session
                .tx
                .send(reply)
                .map_err(|_| Error::Connection(format!("session {} outbound closed", id)))?;
        }
        Ok(())
    }

    /// Broadcast a notice to every session. Returns the number of deliveries.
    pub async fn broadcast(&self, notice: HubNotice) -> usize {
        let json = match serde_json::to_string(&notice) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notice");
                return 0;
            }
        };

        let sessions = self.sessions.read().await;
        tracing::info!(session_count = sessions.len(), "Broadcasting notice");

        let mut delivered = 0;
        for entry in sessions.values() {
            let session = &entry.handle;
            match session.tx.send(json.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(session_id = %session.id, error = %e, "Failed to send notice")
                }
            }
        }
        delivered
    }

    /// Send a notice to every session opened under `client_id`
    pub async fn send_to_client(&self, client_id: &str, notice: HubNotice) -> usize {
        let json = match serde_json::to_string(&notice) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notice");
                return 0;
            }
        };

        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for entry in sessions.values() {
            let session = &entry.handle;
            if session.client_id.as_deref() != Some(client_id) {
                continue;
            }
            match session.tx.send(json.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(session_id = %session.id, error = %e, "Failed to send notice")
                }
            }
        }
        delivered
    }

    /// Snapshot of one session
    pub async fn session(&self, id: &Uuid) -> Option<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|entry| entry.handle.info())
    }

    /// Snapshot of every live session
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos: Vec<SessionInfo> = sessions.values().map(|entry| entry.handle.info()).collect();
        infos.sort_by_key(|i| i.connected_at);
        infos
    }

    /// Get session count
    pub fn session_count(&self) -> u64 {
        self.session_count.load(Ordering::Relaxed)
    }

    // ========================================
    // Internal Methods
    // ========================================

    async fn handle(&self, id: &Uuid) -> Result<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))
    }

    fn handle_text(&self, session: &SessionHandle, text: String) -> String {
        let parsed = ClientMessage::parse(&text);
        tracing::debug!(session_id = %session.id, message = ?parsed, "Text message");

        match (session.kind, parsed) {
            (_, ClientMessage::Chat(original)) => to_json(&ChatReply::new(original)),
            (SessionKind::Chat, _) => format!("Server received: {}", text),
            (SessionKind::Video, ClientMessage::Command(command)) => {
                self.handle_command(session, command)
            }
            (SessionKind::Video, ClientMessage::Unrecognized(raw)) => {
                let err = Error::Protocol("expected a JSON command or message".to_string());
                let mut reply = err.to_reply();
                reply["echo"] = json!(format!("Echo: {}", raw));
                reply.to_string()
            }
        }
    }

    fn handle_command(&self, session: &SessionHandle, command: Command) -> String {
        let reply = match command {
            Command::Ping => json!({ "status": "pong" }),
            Command::TestMode(enabled) => {
                session.state.test_mode.store(enabled, Ordering::SeqCst);
                tracing::info!(session_id = %session.id, enabled = enabled, "Test mode toggled");
                json!({ "status": "test_mode", "enabled": enabled })
            }
            Command::Status => json!({ "status": "session", "session": session.info() }),
            Command::Reset => {
                session.state.windows().clear();
                tracing::info!(session_id = %session.id, "Windows reset");
                json!({ "status": "reset" })
            }
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "Unknown command");
                json!({ "status": "unknown_command" })
            }
        };
        reply.to_string()
    }

    fn handle_frame(&self, session: &SessionHandle, frame: Vec<u8>) -> Option<String> {
        if session.kind == SessionKind::Chat {
            let err = Error::Protocol("binary frames are not accepted on the text channel".to_string());
            return Some(err.to_reply().to_string());
        }

        let size = frame.len();
        if session.state.queue.push(frame).is_some() {
            let dropped = session.state.frames_dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(
                session_id = %session.id,
                frames_dropped = dropped,
                "Frame queue full, dropped oldest frame"
            );
        }
        tracing::trace!(session_id = %session.id, size = size, "Frame queued");
        None
    }
}

/// Session worker: one frame at a time, in arrival order
async fn run_worker(
    id: Uuid,
    state: Arc<SessionState>,
    pipeline: Arc<DetectionPipeline>,
    tx: mpsc::UnboundedSender<String>,
) {
    while let Some(frame) = state.queue.pop().await {
        let evaluation = pipeline.evaluate_frame(frame).await;

        if state.is_closed() {
            tracing::debug!(session_id = %id, "Session closed mid-pipeline, result discarded");
            break;
        }

        let reply = match evaluation {
            Ok(evaluation) => {
                let result = if state.test_mode() {
                    DetectionResult::new(evaluation.candidates, evaluation.detections, true)
                } else {
                    let mut windows = state.windows();
                    DetectionPipeline::apply(evaluation, &mut windows)
                };
                state.frames_processed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    session_id = %id,
                    planting = result.planting_detected,
                    watering = result.watering_detected,
                    waste_separation = result.waste_separation_detected,
                    "Frame processed"
                );
                to_json(&result)
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Frame rejected");
                e.to_reply().to_string()
            }
        };

        if tx.send(reply).is_err() {
            break;
        }
    }
    tracing::debug!(session_id = %id, "Session worker stopped");
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize reply");
        Error::from(e).to_reply().to_string()
    })
}
