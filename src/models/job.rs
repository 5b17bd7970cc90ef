//! Job template, instance, and group models.
//!
//! A job template is the fixed definition of an operation sequence plus
//! one deadline per intended repeat. Each repeat becomes a job instance
//! that owns its own copy of the operation queue — no instance can ever
//! observe another's mutations. A job group gathers all instances of one
//! template and keeps them in dispatch-priority order.
//!
//! # Dispatch Priority
//!
//! Incomplete instances sort before complete ones; among peers, higher
//! estimated tardiness wins, with the instance index as the final
//! ascending tie-break. The order is rebuilt on demand after every batch
//! of urgency mutations rather than maintained incrementally, so ordering
//! keys are never mutated inside a live priority structure.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::operation::{Operation, OperationSpec};

/// Fixed definition of a job: operation sequence, identity tag, and one
/// deadline per intended repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Template name.
    pub name: String,
    /// Color/identity tag carried into the commit log for rendering.
    pub color: String,
    /// Ordered operation specs.
    pub operations: Vec<OperationSpec>,
    /// Deadlines indexed by repeat number.
    pub deadlines: Vec<i64>,
}

impl JobTemplate {
    /// Creates an empty template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: String::new(),
            operations: Vec::new(),
            deadlines: Vec::new(),
        }
    }

    /// Sets the color tag.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Appends an operation spec.
    pub fn with_operation(mut self, spec: OperationSpec) -> Self {
        self.operations.push(spec);
        self
    }

    /// Sets the per-repeat deadlines.
    pub fn with_deadlines(mut self, deadlines: Vec<i64>) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Sum of all operation durations.
    pub fn total_duration(&self) -> i64 {
        self.operations.iter().map(|op| op.duration).sum()
    }

    /// Number of operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

/// One concrete repeat of a job template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInstance {
    /// Repeat number within the group.
    pub index: usize,
    /// Deadline for this repeat.
    pub deadline: i64,
    /// This instance's own copy of the operation queue.
    pub operations: Vec<Operation>,
    /// Signed lateness of the last operation once complete.
    pub tardiness: i64,
    /// `max(0, tardiness)` once complete.
    pub time_exceeded: i64,
    /// Forward-looking urgency score; frozen at `tardiness` once done.
    pub estimated_tardiness: i64,
    /// Whether every operation has been committed.
    pub done: bool,
}

impl JobInstance {
    /// Instantiates a repeat with a value-semantics copy of the
    /// template's operations.
    pub fn instantiate(template: &JobTemplate, index: usize, deadline: i64) -> Self {
        Self {
            index,
            deadline,
            operations: template.operations.iter().map(Operation::from_spec).collect(),
            tardiness: 0,
            time_exceeded: 0,
            estimated_tardiness: 0,
            done: false,
        }
    }

    /// Total processing duration of all operations.
    pub fn total_duration(&self) -> i64 {
        self.operations.iter().map(|op| op.duration).sum()
    }

    /// Index of the first operation without a finish time.
    pub fn first_unfinished(&self) -> Option<usize> {
        self.operations.iter().position(|op| !op.is_committed())
    }

    /// Sum of durations of the unfinished operations after the earliest
    /// unfinished one. This is the remaining work the deadline must still
    /// absorb once the current operation is placed.
    pub fn remaining_duration_after_current(&self) -> i64 {
        self.operations
            .iter()
            .filter(|op| !op.is_committed())
            .skip(1)
            .map(|op| op.duration)
            .sum()
    }

    /// Refreshes completion state. Once every operation is committed the
    /// tardiness fields freeze and the instance sorts after all
    /// incomplete peers. Idempotent.
    pub fn refresh_completion(&mut self) {
        if self.operations.iter().any(|op| !op.is_committed()) {
            return;
        }
        let last_finish = self
            .operations
            .last()
            .and_then(|op| op.finish)
            .unwrap_or(0);
        self.tardiness = last_finish - self.deadline;
        self.time_exceeded = self.tardiness.max(0);
        self.estimated_tardiness = self.tardiness;
        self.done = true;
    }

    /// Dispatch ordering: `Less` means this instance dispatches first.
    pub fn dispatch_order(&self, other: &Self) -> Ordering {
        match (self.done, other.done) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => other
                .estimated_tardiness
                .cmp(&self.estimated_tardiness)
                .then(self.index.cmp(&other.index)),
        }
    }
}

/// All repeat-instances of one template, in dispatch-priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGroup {
    /// The shared template (operation specs, color, deadlines).
    pub template: JobTemplate,
    /// Instances, sorted by dispatch priority after each rebuild.
    pub instances: Vec<JobInstance>,
}

impl JobGroup {
    /// Instantiates `repeats` instances, each with its own deadline and
    /// its own operation queue.
    pub fn new(template: &JobTemplate, repeats: usize) -> Self {
        let instances = (0..repeats)
            .map(|i| {
                let deadline = template.deadlines.get(i).copied().unwrap_or(0);
                JobInstance::instantiate(template, i, deadline)
            })
            .collect();
        Self {
            template: template.clone(),
            instances,
        }
    }

    /// Rebuilds the dispatch-priority order. Call after any batch of
    /// mutations to tardiness or completion state.
    pub fn rebuild_priority(&mut self) {
        self.instances.sort_by(JobInstance::dispatch_order);
    }

    /// Whether every instance has finished all its operations.
    pub fn all_done(&self) -> bool {
        self.instances.iter().all(|j| j.done)
    }

    /// Number of instances still incomplete.
    pub fn remaining(&self) -> usize {
        self.instances.iter().filter(|j| !j.done).count()
    }

    /// Highest-priority instance (valid after [`rebuild_priority`]).
    ///
    /// [`rebuild_priority`]: JobGroup::rebuild_priority
    pub fn head(&self) -> Option<&JobInstance> {
        self.instances.first()
    }

    /// Position in `instances` of the repeat with the given index.
    pub fn position_of(&self, repeat_index: usize) -> Option<usize> {
        self.instances.iter().position(|j| j.index == repeat_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operation::{OpType, OperationSpec};

    fn make_template(durations: &[i64], deadlines: &[i64]) -> JobTemplate {
        let mut template = JobTemplate::new("Job1")
            .with_color("tab:blue")
            .with_deadlines(deadlines.to_vec());
        for (i, &d) in durations.iter().enumerate() {
            let mut spec = OperationSpec::new(OpType::A, d);
            if i > 0 {
                spec = spec.with_predecessor(i - 1);
            }
            template = template.with_operation(spec);
        }
        template
    }

    #[test]
    fn test_template_totals() {
        let t = make_template(&[100, 200, 300], &[1000]);
        assert_eq!(t.total_duration(), 600);
        assert_eq!(t.operation_count(), 3);
    }

    #[test]
    fn test_instances_are_independent_copies() {
        let t = make_template(&[100, 200], &[500, 500]);
        let mut group = JobGroup::new(&t, 2);
        group.instances[0].operations[0].commit(0, 0);
        assert!(group.instances[0].operations[0].is_committed());
        assert!(!group.instances[1].operations[0].is_committed());
    }

    #[test]
    fn test_first_unfinished_advances() {
        let t = make_template(&[100, 200], &[500]);
        let mut job = JobInstance::instantiate(&t, 0, 500);
        assert_eq!(job.first_unfinished(), Some(0));
        job.operations[0].commit(0, 0);
        assert_eq!(job.first_unfinished(), Some(1));
        job.operations[1].commit(0, 100);
        assert_eq!(job.first_unfinished(), None);
    }

    #[test]
    fn test_remaining_duration_excludes_current() {
        let t = make_template(&[100, 200, 300], &[1000]);
        let mut job = JobInstance::instantiate(&t, 0, 1000);
        assert_eq!(job.remaining_duration_after_current(), 500);
        job.operations[0].commit(0, 0);
        assert_eq!(job.remaining_duration_after_current(), 300);
    }

    #[test]
    fn test_refresh_completion_freezes_tardiness() {
        let t = make_template(&[100], &[50]);
        let mut job = JobInstance::instantiate(&t, 0, 50);
        job.refresh_completion();
        assert!(!job.done);

        job.operations[0].commit(0, 0);
        job.refresh_completion();
        assert!(job.done);
        assert_eq!(job.tardiness, 50); // Finished at 100, deadline 50.
        assert_eq!(job.time_exceeded, 50);
        assert_eq!(job.estimated_tardiness, 50);
    }

    #[test]
    fn test_early_finish_negative_tardiness() {
        let t = make_template(&[100], &[500]);
        let mut job = JobInstance::instantiate(&t, 0, 500);
        job.operations[0].commit(0, 0);
        job.refresh_completion();
        assert_eq!(job.tardiness, -400);
        assert_eq!(job.time_exceeded, 0);
    }

    #[test]
    fn test_dispatch_order_urgency_first() {
        let t = make_template(&[100], &[500, 500]);
        let mut relaxed = JobInstance::instantiate(&t, 0, 500);
        let mut urgent = JobInstance::instantiate(&t, 1, 500);
        relaxed.estimated_tardiness = -50;
        urgent.estimated_tardiness = 200;
        assert_eq!(urgent.dispatch_order(&relaxed), Ordering::Less);
        assert_eq!(relaxed.dispatch_order(&urgent), Ordering::Greater);
    }

    #[test]
    fn test_dispatch_order_done_sorts_last() {
        let t = make_template(&[100], &[500, 500]);
        let mut finished = JobInstance::instantiate(&t, 0, 500);
        finished.done = true;
        finished.estimated_tardiness = 10_000;
        let pending = JobInstance::instantiate(&t, 1, 500);
        assert_eq!(pending.dispatch_order(&finished), Ordering::Less);
    }

    #[test]
    fn test_dispatch_order_index_tie_break() {
        let t = make_template(&[100], &[500, 500]);
        let a = JobInstance::instantiate(&t, 0, 500);
        let b = JobInstance::instantiate(&t, 1, 500);
        assert_eq!(a.dispatch_order(&b), Ordering::Less);
    }

    #[test]
    fn test_group_rebuild_and_head() {
        let t = make_template(&[100], &[500, 500, 500]);
        let mut group = JobGroup::new(&t, 3);
        group.instances[0].estimated_tardiness = 5;
        group.instances[1].estimated_tardiness = 80;
        group.instances[2].estimated_tardiness = 30;
        group.rebuild_priority();
        assert_eq!(group.head().unwrap().index, 1);
        assert_eq!(group.position_of(1), Some(0));
        assert_eq!(group.remaining(), 3);
        assert!(!group.all_done());
    }

    #[test]
    fn test_group_uses_per_repeat_deadlines() {
        let t = make_template(&[100], &[300, 700]);
        let group = JobGroup::new(&t, 2);
        assert_eq!(group.instances[0].deadline, 300);
        assert_eq!(group.instances[1].deadline, 700);
    }

    #[test]
    fn test_empty_group_is_done() {
        let t = make_template(&[100], &[]);
        let group = JobGroup::new(&t, 0);
        assert!(group.all_done());
        assert_eq!(group.remaining(), 0);
        assert!(group.head().is_none());
    }
}
