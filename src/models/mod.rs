//! Scheduling domain models.
//!
//! Core data types for the repeatable job-shop: operation types and
//! capability bitsets, per-machine committed-interval timelines, machines,
//! and the job template / instance / group hierarchy.
//!
//! # Domain Mappings
//!
//! | jobshop-sim | Shop floor |
//! |-------------|-----------|
//! | JobTemplate | Product routing |
//! | JobInstance | One production order (repeat) |
//! | JobGroup | All orders of one product |
//! | Operation | Processing step |
//! | Machine | Workstation |

mod job;
mod machine;
mod operation;
mod timeline;

pub use job::{JobGroup, JobInstance, JobTemplate};
pub use machine::{Machine, MachineSpec};
pub use operation::{CapabilitySet, OpType, Operation, OperationSpec};
pub use timeline::{Interval, Timeline};
