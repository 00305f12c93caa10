//! Build phases and the state machine that orders them.

use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One stage of a build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildPhase {
    Init,
    Resolve,
    Bundle,
    TransformAssets,
    Emit,
}

impl BuildPhase {
    /// Every phase in execution order.
    pub const ALL: [BuildPhase; 5] = [
        BuildPhase::Init,
        BuildPhase::Resolve,
        BuildPhase::Bundle,
        BuildPhase::TransformAssets,
        BuildPhase::Emit,
    ];

    /// The phase that follows this one, `None` after `Emit`.
    pub fn next(self) -> Option<BuildPhase> {
        match self {
            BuildPhase::Init => Some(BuildPhase::Resolve),
            BuildPhase::Resolve => Some(BuildPhase::Bundle),
            BuildPhase::Bundle => Some(BuildPhase::TransformAssets),
            BuildPhase::TransformAssets => Some(BuildPhase::Emit),
            BuildPhase::Emit => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildPhase::Init => "init",
            BuildPhase::Resolve => "resolve",
            BuildPhase::Bundle => "bundle",
            BuildPhase::TransformAssets => "transformAssets",
            BuildPhase::Emit => "emit",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a build run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// No phase entered yet
    Pending,
    /// Inside a phase
    Running(BuildPhase),
    /// Between phases, after the given one finished
    Finished(BuildPhase),
    /// Terminal: every phase finished
    Complete,
    /// Terminal: a phase failed
    Failed(BuildPhase),
}

impl PhaseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseState::Complete | PhaseState::Failed(_))
    }
}

/// An illegal phase transition was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot enter phase '{requested}' from state {state:?}")]
pub struct PhaseOrderError {
    pub requested: BuildPhase,
    pub state: PhaseState,
}

/// How long one phase took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub phase: BuildPhase,
    pub duration: Duration,
}

/// Enforces `init → resolve → bundle → transformAssets → emit`.
///
/// Phases are entered exactly once, in order. After `Complete` or
/// `Failed` every further transition is rejected.
#[derive(Debug)]
pub struct PhaseTracker {
    state: PhaseState,
    started: Option<Instant>,
    timings: Vec<PhaseTiming>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self { state: PhaseState::Pending, started: None, timings: Vec::new() }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Phase currently running, if any.
    pub fn current(&self) -> Option<BuildPhase> {
        match self.state {
            PhaseState::Running(phase) => Some(phase),
            _ => None,
        }
    }

    /// Start `phase`. It must directly follow the last finished phase.
    pub fn enter(&mut self, phase: BuildPhase) -> Result<(), PhaseOrderError> {
        let expected = match self.state {
            PhaseState::Pending => Some(BuildPhase::Init),
            PhaseState::Finished(prev) => prev.next(),
            _ => None,
        };
        if expected != Some(phase) {
            return Err(PhaseOrderError { requested: phase, state: self.state });
        }
        self.state = PhaseState::Running(phase);
        self.started = Some(Instant::now());
        Ok(())
    }

    /// Finish the running phase. Finishing `Emit` completes the run.
    pub fn finish(&mut self) -> Result<BuildPhase, PhaseOrderError> {
        let PhaseState::Running(phase) = self.state else {
            return Err(PhaseOrderError { requested: BuildPhase::Emit, state: self.state });
        };
        self.record_timing(phase);
        self.state = if phase == BuildPhase::Emit {
            PhaseState::Complete
        } else {
            PhaseState::Finished(phase)
        };
        Ok(phase)
    }

    /// Move to the terminal failed state, blaming the running phase.
    pub fn fail(&mut self) -> PhaseState {
        let phase = match self.state {
            PhaseState::Running(phase) => {
                self.record_timing(phase);
                phase
            }
            PhaseState::Finished(phase) | PhaseState::Failed(phase) => phase,
            PhaseState::Pending => BuildPhase::Init,
            PhaseState::Complete => BuildPhase::Emit,
        };
        self.state = PhaseState::Failed(phase);
        self.state
    }

    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }

    fn record_timing(&mut self, phase: BuildPhase) {
        let duration = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
        self.timings.push(PhaseTiming { phase, duration });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = BuildPhase::Init;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen, BuildPhase::ALL.to_vec());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(BuildPhase::TransformAssets.to_string(), "transformAssets");
        assert_eq!(BuildPhase::Init.as_str(), "init");
    }

    #[test]
    fn test_tracker_full_run() {
        let mut tracker = PhaseTracker::new();
        for phase in BuildPhase::ALL {
            tracker.enter(phase).unwrap();
            assert_eq!(tracker.current(), Some(phase));
            assert_eq!(tracker.finish().unwrap(), phase);
        }
        assert_eq!(tracker.state(), PhaseState::Complete);
        assert_eq!(tracker.timings().len(), 5);
    }

    #[test]
    fn test_tracker_rejects_skipping() {
        let mut tracker = PhaseTracker::new();
        let err = tracker.enter(BuildPhase::Bundle).unwrap_err();
        assert_eq!(err.requested, BuildPhase::Bundle);
        assert_eq!(err.state, PhaseState::Pending);
    }

    #[test]
    fn test_tracker_rejects_reentry() {
        let mut tracker = PhaseTracker::new();
        tracker.enter(BuildPhase::Init).unwrap();
        tracker.finish().unwrap();
        assert!(tracker.enter(BuildPhase::Init).is_err());
    }

    #[test]
    fn test_tracker_failed_is_terminal() {
        let mut tracker = PhaseTracker::new();
        tracker.enter(BuildPhase::Init).unwrap();
        tracker.finish().unwrap();
        tracker.enter(BuildPhase::Resolve).unwrap();
        assert_eq!(tracker.fail(), PhaseState::Failed(BuildPhase::Resolve));
        assert!(tracker.state().is_terminal());
        assert!(tracker.enter(BuildPhase::Bundle).is_err());
    }
}
