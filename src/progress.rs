//! Build-progress observability.
//!
//! A knowledge-base build over hundreds of chunks can take minutes; the
//! [`ProgressTracker`] makes it observable without affecting correctness.
//! The tracker is an explicitly passed, cloneable handle: independent
//! pipelines (and tests) get independent trackers instead of sharing
//! process-global state. Snapshots are cheap copies; the tracker never
//! blocks the pipeline it instruments.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Retained log lines; older lines are dropped first.
const LOG_CAPACITY: usize = 256;

/// Phases of a knowledge-base build.
///
/// A build walks `LoadingDocuments → Chunking → Embedding → Saving →
/// Complete`; `Error` is reachable from any non-terminal phase and is
/// terminal until the next build restarts the machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildPhase {
    #[default]
    Idle,
    LoadingDocuments,
    Chunking,
    Embedding,
    Saving,
    Complete,
    Error,
}

impl BuildPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildPhase::Complete | BuildPhase::Error)
    }
}

/// Read-only snapshot of an in-flight or most-recent build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildProgress {
    pub phase: BuildPhase,
    /// Items finished within the current phase.
    pub done: usize,
    /// Items expected within the current phase.
    pub total: usize,
    /// Most recent status lines, oldest first.
    pub logs: Vec<String>,
    /// Terminal error message, when `phase` is [`BuildPhase::Error`].
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct ProgressState {
    phase: BuildPhase,
    done: usize,
    total: usize,
    logs: VecDeque<String>,
    error: Option<String>,
}

/// Shared handle onto one build's progress state.
///
/// Cloning produces another handle onto the same state. State is retained
/// after completion for inspection until the next build calls
/// [`start_build`](Self::start_build).
#[derive(Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressState>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all state and enters [`BuildPhase::LoadingDocuments`].
    pub fn start_build(&self) {
        let mut state = self.inner.lock();
        *state = ProgressState {
            phase: BuildPhase::LoadingDocuments,
            ..ProgressState::default()
        };
    }

    /// Enters `phase` with `total` expected items, resetting `done` to zero.
    ///
    /// Ignored once the build has failed; the error state is terminal until
    /// the next [`start_build`](Self::start_build).
    pub fn begin_phase(&self, phase: BuildPhase, total: usize) {
        let mut state = self.inner.lock();
        if state.phase == BuildPhase::Error {
            return;
        }
        state.phase = phase;
        state.done = 0;
        state.total = total;
    }

    /// Marks one item of the current phase finished.
    pub fn advance(&self) {
        self.advance_by(1);
    }

    pub fn advance_by(&self, items: usize) {
        let mut state = self.inner.lock();
        state.done = (state.done + items).min(state.total);
    }

    /// Appends a short status line; the oldest lines beyond the retention
    /// bound are dropped.
    pub fn add_log(&self, line: impl Into<String>) {
        let mut state = self.inner.lock();
        if state.logs.len() == LOG_CAPACITY {
            state.logs.pop_front();
        }
        state.logs.push_back(line.into());
    }

    /// Transitions to [`BuildPhase::Error`] with a terminal message.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.inner.lock();
        state.phase = BuildPhase::Error;
        state.error = Some(message.into());
    }

    /// Transitions to [`BuildPhase::Complete`], unless the build already
    /// failed.
    pub fn complete(&self) {
        let mut state = self.inner.lock();
        if state.phase != BuildPhase::Error {
            state.phase = BuildPhase::Complete;
        }
    }

    /// Current phase, without copying the full snapshot.
    pub fn phase(&self) -> BuildPhase {
        self.inner.lock().phase
    }

    /// Cheap copy of the current state.
    pub fn snapshot(&self) -> BuildProgress {
        let state = self.inner.lock();
        BuildProgress {
            phase: state.phase,
            done: state.done,
            total: state.total,
            logs: state.logs.iter().cloned().collect(),
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let tracker = ProgressTracker::new();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.phase, BuildPhase::Idle);
        assert_eq!((snapshot.done, snapshot.total), (0, 0));
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn phase_entry_resets_counters() {
        let tracker = ProgressTracker::new();
        tracker.start_build();
        tracker.begin_phase(BuildPhase::Chunking, 4);
        tracker.advance();
        tracker.advance();
        assert_eq!(tracker.snapshot().done, 2);

        tracker.begin_phase(BuildPhase::Embedding, 10);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.phase, BuildPhase::Embedding);
        assert_eq!((snapshot.done, snapshot.total), (0, 10));
    }

    #[test]
    fn advance_never_exceeds_total() {
        let tracker = ProgressTracker::new();
        tracker.begin_phase(BuildPhase::Embedding, 2);
        tracker.advance_by(5);
        assert_eq!(tracker.snapshot().done, 2);
    }

    #[test]
    fn error_is_terminal_until_the_next_build() {
        let tracker = ProgressTracker::new();
        tracker.start_build();
        tracker.fail("provider unreachable");
        tracker.begin_phase(BuildPhase::Embedding, 10);
        tracker.complete();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.phase, BuildPhase::Error);
        assert!(snapshot.phase.is_terminal());
        assert_eq!(snapshot.error.as_deref(), Some("provider unreachable"));

        tracker.start_build();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.phase, BuildPhase::LoadingDocuments);
        assert!(!snapshot.phase.is_terminal());
        assert!(snapshot.error.is_none());
        assert!(snapshot.logs.is_empty());
    }

    #[test]
    fn log_retention_is_bounded() {
        let tracker = ProgressTracker::new();
        for i in 0..(LOG_CAPACITY + 10) {
            tracker.add_log(format!("line {i}"));
        }
        let logs = tracker.snapshot().logs;
        assert_eq!(logs.len(), LOG_CAPACITY);
        assert_eq!(logs.first().map(String::as_str), Some("line 10"));
    }

    #[test]
    fn clones_share_state() {
        let tracker = ProgressTracker::new();
        let other = tracker.clone();
        tracker.begin_phase(BuildPhase::Saving, 1);
        assert_eq!(other.phase(), BuildPhase::Saving);
    }
}
