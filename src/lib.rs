//! Repeatable job-shop scheduling simulation engine.
//!
//! Simulates a shop floor where each job template is repeated several
//! times per episode, every repeat carries its own deadline, and an
//! external decision maker commits one operation per step onto a machine.
//! Placement is greedy first-fit over each machine's committed timeline;
//! candidate selection is urgency-driven (estimated tardiness); every
//! action is screened against a legality mask before any state mutation.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Machine`, `Timeline`, `JobTemplate`,
//!   `JobInstance`, `JobGroup`, `Operation`, `CapabilitySet`
//! - **`scheduler`**: The engine — `SchedulerCore`, dispatch buffer,
//!   legality mask, cost accounting, observation snapshots
//! - **`validation`**: Input integrity checks (duplicate names, empty
//!   capability sets, predecessor ordering, deadline shortfalls)
//! - **`sampling`**: Seeded per-episode repeat-count sampling
//! - **`error`**: Engine error taxonomy
//!
//! # Determinism
//!
//! Everything is single-threaded and deterministic: a fixed configuration
//! (and seed, when sampling repeats) plus a fixed action sequence always
//! reproduces the same schedule, costs, and rewards.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod error;
pub mod models;
pub mod sampling;
pub mod scheduler;
pub mod validation;

pub use error::EngineError;
pub use scheduler::{Action, EngineConfig, SchedulerCore, StepOutcome};
