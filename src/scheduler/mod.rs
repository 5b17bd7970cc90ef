//! Scheduling engine: dispatch, commit, cost, and observation.
//!
//! [`SchedulerCore`] owns one episode of state and advances it one
//! external action at a time. The submodules split the concerns:
//!
//! - [`dispatch`]: per-group candidate buffer and the legality mask
//! - [`core`]: episode state, the commit transition, urgency
//! - [`cost`]: the four cost terms and the reward constants
//! - [`observation`]: fixed-shape and diagnostic snapshots
//!
//! [`dispatch`]: self::dispatch
//! [`core`]: self::core
//! [`cost`]: self::cost
//! [`observation`]: self::observation

mod core;
mod cost;
mod dispatch;
mod observation;

pub use self::core::{Action, EngineConfig, SchedulerCore, StepOutcome};
pub use self::cost::{
    compute_costs, final_reward, gross_profit, CostBreakdown, CostRates, HORIZON_BUCKETS,
    ILLEGAL_ACTION_REWARD, TIME_SCALE,
};
pub use self::dispatch::{BufferSlot, DispatchBuffer, LegalityMask};
pub use self::observation::{CommittedOperation, EpisodeInfo, Observation};
