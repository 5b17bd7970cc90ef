//! Engine error taxonomy.
//!
//! Only hard failures live here. A masked-but-in-range action is a normal
//! negative-reward outcome, not an error, and saturation (no action can
//! ever be legal again) is a terminal condition reported by `is_done`.

use thiserror::Error;

/// Hard failures surfaced by the scheduler core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The action addresses a machine or job-group index that does not
    /// exist. Rejected before any state mutation.
    #[error(
        "action ({machine}, {job_group}) is out of range for \
         {machine_count} machines and {group_count} job groups"
    )]
    InvalidAction {
        /// Requested machine index.
        machine: usize,
        /// Requested job-group index.
        job_group: usize,
        /// Number of machines in the episode.
        machine_count: usize,
        /// Number of job groups in the episode.
        group_count: usize,
    },

    /// The legality mask approved an action but the dispatch state no
    /// longer holds a buffered operation for the group. Capability always
    /// implies a feasible placement (append-after-last), so this is a
    /// modelling invariant violation, never a recoverable condition.
    #[error("job group {job_group} has no buffered operation despite a legal mask entry")]
    InfeasiblePlacement {
        /// Machine index of the failed action.
        machine: usize,
        /// Job-group index of the failed action.
        job_group: usize,
    },

    /// A commit would overlap an interval already on the machine's
    /// timeline. The window search immediately precedes every commit, so
    /// this indicates state corruption.
    #[error("commit [{start}, {finish}) overlaps an existing interval on machine {machine}")]
    OverlappingCommit {
        /// Machine index.
        machine: usize,
        /// Start tick of the rejected interval.
        start: i64,
        /// Finish tick of the rejected interval.
        finish: i64,
    },
}
