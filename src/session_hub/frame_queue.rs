//! Bounded per-session frame queue
//!
//! One consumer (the session worker), many producers. When full, the oldest
//! queued frame is dropped so the worker always moves toward the newest one.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct FrameQueue {
    frames: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
    depth: usize,
    closed: AtomicBool,
}

impl FrameQueue {
    /// Depth is at least 1
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(depth)),
            notify: Notify::new(),
            depth,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a frame. Returns the evicted frame when the queue was full.
    pub fn push(&self, frame: Vec<u8>) -> Option<Vec<u8>> {
        let dropped = {
            let mut frames = self.frames.lock().unwrap_or_else(|p| p.into_inner());
            let dropped = if frames.len() >= self.depth {
                frames.pop_front()
            } else {
                None
            };
            frames.push_back(frame);
            dropped
        };
        self.notify.notify_one();
        dropped
    }

    /// Next frame in arrival order; `None` once closed
    pub async fn pop(&self) -> Option<Vec<u8>> {
        loop {
            if self.is_closed() {
                return None;
            }
            if let Some(frame) = self.try_pop() {
                return Some(frame);
            }
            self.notify.notified().await;
        }
    }

    fn try_pop(&self) -> Option<Vec<u8>> {
        self.frames
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
    }

    /// Stop the consumer and discard pending frames
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.frames
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
