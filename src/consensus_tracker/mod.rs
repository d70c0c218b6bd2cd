//! ConsensusTracker - Temporal debouncing of per-frame candidates
//!
//! ## Responsibilities
//!
//! - Keep a bounded FIFO of the most recent candidates per activity
//! - Turn the window into a verdict: at least `threshold` of the last
//!   `window` observations were `true`
//!
//! State is in-memory only; a new owner always starts from an empty window.

use crate::challenge_filter::{Activity, ActivityFlags};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Default window length
pub const DEFAULT_WINDOW: usize = 10;
/// Default number of `true` observations needed for a positive verdict
pub const DEFAULT_THRESHOLD: usize = 6;

/// Window length and majority threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusPolicy {
    pub window: usize,
    pub threshold: usize,
}

impl ConsensusPolicy {
    /// Window is at least 1; threshold is clamped into `1..=window`
    pub fn new(window: usize, threshold: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            threshold: threshold.clamp(1, window),
        }
    }
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_THRESHOLD)
    }
}

/// Descriptive window state, derived from the current length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Empty,
    Filling,
    Full,
}

/// Bounded FIFO of boolean observations
#[derive(Debug, Clone)]
pub struct ConsensusWindow {
    observations: VecDeque<bool>,
    policy: ConsensusPolicy,
}

impl ConsensusWindow {
    pub fn new(policy: ConsensusPolicy) -> Self {
        Self {
            observations: VecDeque::with_capacity(policy.window + 1),
            policy,
        }
    }

    /// Append a candidate, evict the oldest when over capacity, return the verdict
    pub fn observe(&mut self, candidate: bool) -> bool {
        self.observations.push_back(candidate);
        while self.observations.len() > self.policy.window {
            self.observations.pop_front();
        }
        self.verdict()
    }

    pub fn verdict(&self) -> bool {
        self.true_count() >= self.policy.threshold
    }

    pub fn true_count(&self) -> usize {
        self.observations.iter().filter(|o| **o).count()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn state(&self) -> WindowState {
        match self.len() {
            0 => WindowState::Empty,
            n if n < self.policy.window => WindowState::Filling,
            _ => WindowState::Full,
        }
    }

    pub fn clear(&mut self) {
        self.observations.clear();
    }
}

/// Window summary for status replies
#[derive(Debug, Clone, Serialize)]
pub struct WindowSnapshot {
    pub state: WindowState,
    pub len: usize,
    pub true_count: usize,
    pub verdict: bool,
}

impl From<&ConsensusWindow> for WindowSnapshot {
    fn from(window: &ConsensusWindow) -> Self {
        Self {
            state: window.state(),
            len: window.len(),
            true_count: window.true_count(),
            verdict: window.verdict(),
        }
    }
}

/// One consensus window per activity, owned by a single session
#[derive(Debug, Clone)]
pub struct ActivityWindows {
    windows: HashMap<Activity, ConsensusWindow>,
}

impl ActivityWindows {
    pub fn new(policy: ConsensusPolicy) -> Self {
        let windows = Activity::ALL
            .iter()
            .map(|a| (*a, ConsensusWindow::new(policy)))
            .collect();
        Self { windows }
    }

    /// Feed every activity's candidate into its own window
    pub fn observe_all(&mut self, candidates: ActivityFlags) -> ActivityFlags {
        ActivityFlags::from_fn(|activity| self.observe(activity, candidates.get(activity)))
    }

    pub fn observe(&mut self, activity: Activity, candidate: bool) -> bool {
        self.windows
            .get_mut(&activity)
            .map(|w| w.observe(candidate))
            .unwrap_or(false)
    }

    pub fn window(&self, activity: Activity) -> Option<&ConsensusWindow> {
        self.windows.get(&activity)
    }

    pub fn snapshot(&self) -> HashMap<Activity, WindowSnapshot> {
        self.windows
            .iter()
            .map(|(a, w)| (*a, WindowSnapshot::from(w)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.windows.values_mut().for_each(ConsensusWindow::clear);
    }
}

impl Default for ActivityWindows {
    fn default() -> Self {
        Self::new(ConsensusPolicy::default())
    }
}
