//! Machine model.
//!
//! A machine couples a capability set (which operation types it can
//! process) with a committed-interval timeline. It answers the
//! non-committing best-finish-time query used for urgency estimation and
//! accepts commitments found by the same gap search.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use super::operation::{CapabilitySet, OpType};
use super::timeline::{Interval, Timeline};

/// Static machine definition, received already parsed (no file I/O here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Human-readable machine name.
    pub name: String,
    /// Operation types this machine can process.
    pub capabilities: CapabilitySet,
}

impl MachineSpec {
    /// Creates a spec with an empty capability set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: CapabilitySet::empty(),
        }
    }

    /// Adds one capability.
    pub fn with_capability(mut self, op_type: OpType) -> Self {
        self.capabilities.insert(op_type);
        self
    }

    /// Adds several capabilities.
    pub fn with_capabilities(mut self, types: &[OpType]) -> Self {
        for &t in types {
            self.capabilities.insert(t);
        }
        self
    }
}

/// A machine with mutable episode state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    spec: MachineSpec,
    timeline: Timeline,
}

impl Machine {
    /// Creates a fresh machine from its spec.
    pub fn from_spec(spec: &MachineSpec) -> Self {
        Self {
            spec: spec.clone(),
            timeline: Timeline::new(),
        }
    }

    /// Machine name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Capability set.
    pub fn capabilities(&self) -> CapabilitySet {
        self.spec.capabilities
    }

    /// Whether this machine can process the given operation type.
    #[inline]
    pub fn can_process(&self, op_type: OpType) -> bool {
        self.spec.capabilities.contains(op_type)
    }

    /// Committed timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Hypothetical earliest finish for a candidate operation, without
    /// committing anything.
    ///
    /// Returns `None` when the machine lacks the capability; otherwise
    /// the finish of the greedy first-fit placement.
    pub fn best_finish_time(
        &self,
        earliest_start: i64,
        duration: i64,
        op_type: OpType,
    ) -> Option<i64> {
        if !self.can_process(op_type) {
            return None;
        }
        Some(self.timeline.earliest_fit(earliest_start, duration) + duration)
    }

    /// Commits an interval onto the timeline.
    ///
    /// The caller guarantees `start` came from [`Timeline::earliest_fit`]
    /// with no intervening mutation; an overlap here is an invariant
    /// violation and returns the conflicting interval.
    pub fn commit(&mut self, start: i64, duration: i64) -> Result<(), Interval> {
        self.timeline.insert(Interval::new(start, duration))
    }

    /// Finish tick of the last committed operation, 0 when idle.
    pub fn last_finish_time(&self) -> i64 {
        self.timeline.last_finish()
    }

    /// Idle ticks between first start and last finish.
    pub fn idle_time(&self) -> i64 {
        self.timeline.idle_time()
    }

    /// Busy ticks committed so far.
    pub fn busy_time(&self) -> i64 {
        self.timeline.total_duration()
    }

    /// Utilization against a shared denominator (the global last finish
    /// time). 0 when the denominator is not yet positive.
    pub fn utilization(&self, global_last_finish: i64) -> f64 {
        if global_last_finish <= 0 {
            return 0.0;
        }
        self.busy_time() as f64 / global_last_finish as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_machine(types: &[OpType]) -> Machine {
        Machine::from_spec(&MachineSpec::new("M1").with_capabilities(types))
    }

    #[test]
    fn test_spec_builder() {
        let spec = MachineSpec::new("CNC-1")
            .with_capability(OpType::A)
            .with_capabilities(&[OpType::B, OpType::C]);
        assert_eq!(spec.name, "CNC-1");
        assert_eq!(spec.capabilities.len(), 3);
    }

    #[test]
    fn test_best_finish_requires_capability() {
        let m = make_machine(&[OpType::A]);
        assert_eq!(m.best_finish_time(0, 10, OpType::A), Some(10));
        assert_eq!(m.best_finish_time(0, 10, OpType::B), None);
    }

    #[test]
    fn test_best_finish_after_commit() {
        let mut m = make_machine(&[OpType::A]);
        m.commit(0, 10).unwrap();
        // Machine busy [0, 10) → next placement finishes at 20.
        assert_eq!(m.best_finish_time(0, 10, OpType::A), Some(20));
        // A later earliest-start pushes the estimate out.
        assert_eq!(m.best_finish_time(30, 10, OpType::A), Some(40));
    }

    #[test]
    fn test_best_finish_does_not_commit() {
        let m = make_machine(&[OpType::A]);
        let _ = m.best_finish_time(0, 10, OpType::A);
        assert!(m.timeline().is_empty());
    }

    #[test]
    fn test_commit_rejects_overlap() {
        let mut m = make_machine(&[OpType::A]);
        m.commit(0, 10).unwrap();
        assert!(m.commit(5, 10).is_err());
        assert_eq!(m.timeline().len(), 1);
    }

    #[test]
    fn test_utilization_shared_denominator() {
        let mut m = make_machine(&[OpType::A]);
        m.commit(0, 50).unwrap();
        assert!((m.utilization(100) - 0.5).abs() < 1e-10);
        assert!((m.utilization(0) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_idle_and_busy_time() {
        let mut m = make_machine(&[OpType::A]);
        m.commit(0, 10).unwrap();
        m.commit(30, 10).unwrap();
        assert_eq!(m.busy_time(), 20);
        assert_eq!(m.idle_time(), 20);
        assert_eq!(m.last_finish_time(), 40);
    }
}
