//! Observation and diagnostic snapshots.
//!
//! The observation is the fixed-shape numeric view the environment
//! wrapper flattens into tensors; the episode info is the richer
//! diagnostic view. Both are pure functions of committed state: repeated
//! queries without an intervening commit return identical values.
//!
//! Raw tick quantities are scaled down by [`TIME_SCALE`] using floor
//! division, and empty slots carry a `-1` sentinel, matching the numeric
//! conventions the downstream policy was trained against.
//!
//! [`TIME_SCALE`]: super::cost::TIME_SCALE

use serde::{Deserialize, Serialize};

use super::cost::CostBreakdown;
use super::dispatch::BufferSlot;
use crate::models::OpType;

/// One entry of the commit-order log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOperation {
    /// 1-based commit order across the whole episode.
    pub sequence: usize,
    /// Job-group index.
    pub group: usize,
    /// Repeat index within the group.
    pub repeat: usize,
    /// Operation index within the instance.
    pub operation: usize,
    /// Operation type.
    pub op_type: OpType,
    /// Machine the operation was committed to.
    pub machine: usize,
    /// Committed start tick.
    pub start: i64,
    /// Committed finish tick.
    pub finish: i64,
    /// Template color tag, for downstream rendering.
    pub color: String,
}

/// Structured numeric snapshot of the episode state.
///
/// Group-indexed vectors have one entry per job group; machine-indexed
/// vectors one per machine. `-1` marks an empty buffer slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Machine-major flattened legality mask.
    pub action_mask: Vec<bool>,
    /// Per group: `[duration / TIME_SCALE, type index]` per operation
    /// slot, padded with `[-1, -1]` to the widest template.
    pub job_details: Vec<Vec<[i64; 2]>>,
    /// Repeat count drawn for each group this episode.
    pub current_repeats: Vec<usize>,
    /// Per group: template duration / TIME_SCALE.
    pub total_durations: Vec<i64>,
    /// Per group: instances not yet complete.
    pub remaining_repeats: Vec<usize>,
    /// Per machine: last committed finish / TIME_SCALE.
    pub last_finish_time_per_machine: Vec<i64>,
    /// Per machine: fixed-width busy bitmap over the horizon.
    pub occupancy: Vec<Vec<bool>>,
    /// Per group: mean of scaled actual tardiness over instances.
    pub mean_tardiness_per_group: Vec<f64>,
    /// Per group: population std of scaled actual tardiness.
    pub std_tardiness_per_group: Vec<f64>,
    /// Per group: mean of scaled estimated tardiness.
    pub mean_estimated_tardiness_per_group: Vec<f64>,
    /// Per group: population std of scaled estimated tardiness.
    pub std_estimated_tardiness_per_group: Vec<f64>,
    /// Per group: buffered repeat index, or −1.
    pub buffered_repeat: Vec<i64>,
    /// Per group: buffered operation index, or −1.
    pub buffered_operation: Vec<i64>,
    /// Per group: buffered operation's earliest start / TIME_SCALE, or −1.
    pub buffered_earliest_start: Vec<i64>,
    /// Per group: buffered instance's deadline / TIME_SCALE, or −1.
    pub buffered_deadline: Vec<i64>,
    /// The four cost rates (deadline, hole, processing, makespan).
    pub cost_rates: [f64; 4],
    /// The four live cost totals in the same order.
    pub costs: [f64; 4],
}

/// Diagnostic snapshot: full per-instance and per-machine detail plus the
/// commit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Finish tick of the last committed operation.
    pub finish_time: i64,
    /// Machine-major flattened legality mask.
    pub legal_actions: Vec<bool>,
    /// Current dispatch-buffer slots.
    pub dispatch_buffer: Vec<Option<BufferSlot>>,
    /// Per machine: busy time over the global last finish.
    pub machine_utilization: Vec<f64>,
    /// Per instance (group-major): deadline.
    pub deadlines: Vec<i64>,
    /// Per instance: signed tardiness (0 until complete).
    pub tardiness: Vec<i64>,
    /// Per instance: max(0, tardiness).
    pub time_exceeded: Vec<i64>,
    /// Per instance: current estimated tardiness.
    pub estimated_tardiness: Vec<i64>,
    /// Per group: instances not yet complete.
    pub remaining_repeats: Vec<usize>,
    /// Every committed operation in commit order.
    pub commit_log: Vec<CommittedOperation>,
    /// The four live cost totals.
    pub costs: CostBreakdown,
}

/// Mean and population standard deviation; `(0, 0)` for an empty slice.
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Floor division by the observation time scale. Floors (rather than
/// truncates) so negative tardiness scales consistently.
pub(crate) fn scale_down(ticks: i64, scale: i64) -> i64 {
    ticks.div_euclid(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_std_basic() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-10);
        assert!((std - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_mean_std_single_value() {
        let (mean, std) = mean_std(&[3.0]);
        assert!((mean - 3.0).abs() < 1e-10);
        assert!(std.abs() < 1e-10);
    }

    #[test]
    fn test_mean_std_empty() {
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_scale_down_floors_negatives() {
        assert_eq!(scale_down(250, 100), 2);
        assert_eq!(scale_down(-50, 100), -1);
        assert_eq!(scale_down(-200, 100), -2);
        assert_eq!(scale_down(0, 100), 0);
    }
}
