//! Cost and reward accounting.
//!
//! Four cost terms are recomputed from scratch at every query — never
//! cached across a mutation boundary — so the totals cannot drift from
//! committed state. Each is a monotone non-decreasing function of the
//! schedule as an episode progresses.
//!
//! | Term | Definition |
//! |------|-----------|
//! | Deadline | Σ over instances max(0, last finish − deadline) × rate |
//! | Hole | Σ over machines idle-between-commitments × rate |
//! | Processing | Σ over machines busy time × rate |
//! | Makespan | global last finish × rate |

use serde::{Deserialize, Serialize};

use crate::models::{JobGroup, Machine};

/// Observation time scale: raw ticks are divided by this when exposed in
/// observations, and the occupancy bitmap uses it as the bucket width.
pub const TIME_SCALE: i64 = 100;

/// Default number of occupancy-bitmap buckets per machine.
pub const HORIZON_BUCKETS: usize = 150;

/// Reward for an in-range but masked action. State is unchanged.
pub const ILLEGAL_ACTION_REWARD: f64 = -0.5;

/// Gross profit per duration tick when an instance completes.
pub(crate) const COMPLETION_PROFIT_FACTOR: i64 = 10;

/// Penalty per overrun tick when an instance completes.
pub(crate) const COMPLETION_OVERRUN_FACTOR: i64 = 5;

/// Per-time cost rates for the four cost terms plus the profit rate used
/// in the terminal reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// Cost per tick of deadline overrun.
    pub deadline: f64,
    /// Cost per tick of machine idle fragmentation.
    pub hole: f64,
    /// Cost per tick of machine busy time.
    pub processing: f64,
    /// Cost per tick of makespan.
    pub makespan: f64,
    /// Profit per tick of committed duration (terminal reward).
    pub profit: f64,
}

impl CostRates {
    /// Creates explicit rates.
    pub fn new(deadline: f64, hole: f64, processing: f64, makespan: f64, profit: f64) -> Self {
        Self {
            deadline,
            hole,
            processing,
            makespan,
            profit,
        }
    }

    /// Unit rates with a profit rate of 10, convenient for tests.
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, 10.0)
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self::unit()
    }
}

/// The four live cost totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Deadline-overrun cost.
    pub deadline: f64,
    /// Machine idle ("hole") cost.
    pub hole: f64,
    /// Machine busy ("processing") cost.
    pub processing: f64,
    /// Makespan cost.
    pub makespan: f64,
}

impl CostBreakdown {
    /// Sum of the four terms.
    pub fn total(&self) -> f64 {
        self.deadline + self.hole + self.processing + self.makespan
    }

    /// The four terms in declaration order, as exposed in observations.
    pub fn as_array(&self) -> [f64; 4] {
        [self.deadline, self.hole, self.processing, self.makespan]
    }
}

/// Computes all four cost terms from committed state.
pub fn compute_costs(
    machines: &[Machine],
    groups: &[JobGroup],
    last_finish: i64,
    rates: &CostRates,
) -> CostBreakdown {
    let overrun: i64 = groups
        .iter()
        .flat_map(|g| g.instances.iter())
        .map(|job| job.time_exceeded)
        .sum();
    let hole: i64 = machines.iter().map(Machine::idle_time).sum();
    let busy: i64 = machines.iter().map(Machine::busy_time).sum();

    CostBreakdown {
        deadline: overrun as f64 * rates.deadline,
        hole: hole as f64 * rates.hole,
        processing: busy as f64 * rates.processing,
        makespan: last_finish as f64 * rates.makespan,
    }
}

/// Gross profit of an episode: total intended committed duration times
/// the profit rate.
pub fn gross_profit(groups: &[JobGroup], rates: &CostRates) -> f64 {
    let total_duration: i64 = groups
        .iter()
        .map(|g| g.template.total_duration() * g.instances.len() as i64)
        .sum();
    total_duration as f64 * rates.profit
}

/// Terminal reward: net profit as a percentage of gross profit.
///
/// Returns 0 when gross profit is zero (empty episode).
pub fn final_reward(
    machines: &[Machine],
    groups: &[JobGroup],
    last_finish: i64,
    rates: &CostRates,
) -> f64 {
    let profit = gross_profit(groups, rates);
    if profit == 0.0 {
        return 0.0;
    }
    let cost = compute_costs(machines, groups, last_finish, rates).total();
    (profit - cost) / profit * 100.0
}
