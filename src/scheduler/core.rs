//! Scheduler core: episode state and the action commit loop.
//!
//! Owns all machines and job groups for one episode and executes external
//! `(machine, job-group)` actions one at a time. Each legal commit is one
//! atomic transition: place the buffered operation with the greedy window
//! search, recompute urgency for every group, refresh the dispatch
//! buffer, and rebuild the legality mask before control returns to the
//! caller. Everything is single-threaded and deterministic: a fixed
//! configuration and action sequence always reproduces the same schedule,
//! costs, and rewards.
//!
//! # Urgency
//!
//! Each incomplete instance's earliest pending operation is scored with
//! the mean best finish time over all capable machines, minus the implied
//! deadline for that operation (`deadline − remaining work after it`).
//! This front-loads slack consumption onto the earliest pending operation
//! so the dispatch head favors instances that are urgent now and cannot
//! dally later.

use serde::{Deserialize, Serialize};

use super::cost::{
    self, CostBreakdown, CostRates, COMPLETION_OVERRUN_FACTOR, COMPLETION_PROFIT_FACTOR,
    HORIZON_BUCKETS, ILLEGAL_ACTION_REWARD, TIME_SCALE,
};
use super::dispatch::{DispatchBuffer, LegalityMask};
use super::observation::{mean_std, scale_down, CommittedOperation, EpisodeInfo, Observation};
use crate::error::EngineError;
use crate::models::{JobGroup, JobInstance, Machine, JobTemplate, MachineSpec};
use crate::validation::{validate_config, ValidationError};

/// An external decision: commit the buffered operation of one job group
/// onto one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Machine index.
    pub machine: usize,
    /// Job-group index.
    pub job_group: usize,
}

impl Action {
    /// Creates an action.
    pub fn new(machine: usize, job_group: usize) -> Self {
        Self { machine, job_group }
    }
}

/// Result of a committed (or rejected) action.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The action was legal; one operation was placed.
    Committed {
        /// Step reward: completion bonus minus idle-fragmentation penalty.
        reward: f64,
        /// The commit-log entry for the placed operation.
        operation: CommittedOperation,
    },
    /// The action was in range but masked. State is unchanged.
    Rejected {
        /// Fixed negative reward.
        reward: f64,
    },
}

/// Static episode configuration: everything needed to (re)build state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Machine definitions.
    pub machines: Vec<MachineSpec>,
    /// Job templates.
    pub templates: Vec<JobTemplate>,
    /// Repeat count per template for this episode.
    pub repeats: Vec<usize>,
    /// Cost and profit rates.
    pub rates: CostRates,
    /// Occupancy-bitmap buckets per machine in observations.
    pub horizon_buckets: usize,
}

impl EngineConfig {
    /// Creates a configuration with default rates and horizon.
    pub fn new(machines: Vec<MachineSpec>, templates: Vec<JobTemplate>, repeats: Vec<usize>) -> Self {
        Self {
            machines,
            templates,
            repeats,
            rates: CostRates::default(),
            horizon_buckets: HORIZON_BUCKETS,
        }
    }

    /// Sets the cost rates.
    pub fn with_rates(mut self, rates: CostRates) -> Self {
        self.rates = rates;
        self
    }

    /// Sets the observation horizon in buckets.
    pub fn with_horizon(mut self, buckets: usize) -> Self {
        self.horizon_buckets = buckets;
        self
    }
}

/// The scheduling engine for one episode.
#[derive(Debug, Clone)]
pub struct SchedulerCore {
    config: EngineConfig,
    machines: Vec<Machine>,
    groups: Vec<JobGroup>,
    buffer: DispatchBuffer,
    mask: LegalityMask,
    commit_log: Vec<CommittedOperation>,
    last_finish_time: i64,
    steps: usize,
}

impl SchedulerCore {
    /// Validates the configuration and builds a ready engine.
    ///
    /// The returned engine is already reset; call [`reset`] again only to
    /// start a fresh episode with the same configuration.
    ///
    /// [`reset`]: SchedulerCore::reset
    pub fn new(config: EngineConfig) -> Result<Self, Vec<ValidationError>> {
        validate_config(&config.machines, &config.templates, &config.repeats)?;
        let machine_count = config.machines.len();
        let group_count = config.templates.len();
        let mut core = Self {
            config,
            machines: Vec::new(),
            groups: Vec::new(),
            buffer: DispatchBuffer::new(group_count),
            mask: LegalityMask::new(machine_count, group_count),
            commit_log: Vec::new(),
            last_finish_time: 0,
            steps: 0,
        };
        core.reset();
        Ok(core)
    }

    /// Rebuilds all mutable state from the stored configuration and
    /// returns the initial observation.
    pub fn reset(&mut self) -> Observation {
        self.machines = self.config.machines.iter().map(Machine::from_spec).collect();
        self.groups = self
            .config
            .templates
            .iter()
            .zip(&self.config.repeats)
            .map(|(template, &repeats)| JobGroup::new(template, repeats))
            .collect();
        self.buffer = DispatchBuffer::new(self.groups.len());
        self.mask = LegalityMask::new(self.machines.len(), self.groups.len());
        self.commit_log.clear();
        self.last_finish_time = 0;
        self.steps = 0;
        self.refresh_derived_state();
        self.get_observation()
    }

    /// Whether an action would currently be accepted. Out-of-range pairs
    /// are simply not legal; only [`commit`] escalates them to an error.
    ///
    /// [`commit`]: SchedulerCore::commit
    pub fn is_legal(&self, action: Action) -> bool {
        self.mask
            .get(action.machine, action.job_group)
            .unwrap_or(false)
    }

    /// Whether the episode is over: every instance's last operation is
    /// finished, or no action can ever be legal again (saturation).
    pub fn is_done(&self) -> bool {
        !self.mask.any() || self.groups.iter().all(JobGroup::all_done)
    }

    /// Executes one action.
    ///
    /// Out-of-range indices fail hard before any mutation. Masked
    /// actions return [`StepOutcome::Rejected`] with a fixed negative
    /// reward and leave state untouched. Legal actions commit exactly one
    /// operation and return the step reward.
    pub fn commit(&mut self, action: Action) -> Result<StepOutcome, EngineError> {
        let (m, g) = (action.machine, action.job_group);
        if m >= self.machines.len() || g >= self.groups.len() {
            return Err(EngineError::InvalidAction {
                machine: m,
                job_group: g,
                machine_count: self.machines.len(),
                group_count: self.groups.len(),
            });
        }

        self.steps += 1;
        if !self.mask.get(m, g).unwrap_or(false) {
            return Ok(StepOutcome::Rejected {
                reward: ILLEGAL_ACTION_REWARD,
            });
        }

        // The mask is rebuilt from the buffer after every mutation, so a
        // legal entry with an empty slot means corrupted dispatch state.
        let Some(slot) = self.buffer.slot(g) else {
            log::error!("legal mask approved job group {g} with an empty dispatch slot");
            return Err(EngineError::InfeasiblePlacement {
                machine: m,
                job_group: g,
            });
        };
        let Some(pos) = self.groups[g].position_of(slot.instance) else {
            log::error!(
                "dispatch buffer names missing repeat {} of job group {g}",
                slot.instance
            );
            return Err(EngineError::InfeasiblePlacement {
                machine: m,
                job_group: g,
            });
        };

        let op_idx = slot.operation;
        let (duration, op_type, mut earliest) = {
            let op = &self.groups[g].instances[pos].operations[op_idx];
            (op.duration, op.op_type, op.earliest_start)
        };
        // Predecessor links are canonical; the buffered operation is the
        // first unfinished one, so any predecessor is already committed.
        if let Some(pred) = self.groups[g].instances[pos].operations[op_idx].predecessor {
            if let Some(pred_finish) = self.groups[g].instances[pos].operations[pred].finish {
                earliest = earliest.max(pred_finish);
            }
        }

        let start = self.machines[m].timeline().earliest_fit(earliest, duration);
        let finish = start + duration;
        if self.machines[m].commit(start, duration).is_err() {
            log::error!("overlapping commit on machine {m}: [{start}, {finish})");
            return Err(EngineError::OverlappingCommit {
                machine: m,
                start,
                finish,
            });
        }

        {
            let job = &mut self.groups[g].instances[pos];
            job.operations[op_idx].commit(m, start);
            // Chain the finish into the next operation's earliest start;
            // validation guarantees this agrees with predecessor links.
            if let Some(next) = job.operations.get_mut(op_idx + 1) {
                next.earliest_start = finish;
            }
            job.refresh_completion();
        }

        let entry = CommittedOperation {
            sequence: self.commit_log.len() + 1,
            group: g,
            repeat: slot.instance,
            operation: op_idx,
            op_type,
            machine: m,
            start,
            finish,
            color: self.groups[g].template.color.clone(),
        };
        self.commit_log.push(entry.clone());
        self.last_finish_time = self.last_finish_time.max(finish);

        self.refresh_derived_state();
        let reward = self.step_reward(m, g, slot.instance);
        Ok(StepOutcome::Committed {
            reward,
            operation: entry,
        })
    }

    /// One atomic post-mutation pass: urgency, buffer, mask.
    fn refresh_derived_state(&mut self) {
        self.recompute_urgency();
        self.buffer.refresh(&self.groups);
        self.mask.rebuild(&self.machines, &self.groups, &self.buffer);
    }

    /// Re-estimates tardiness for every incomplete instance and rebuilds
    /// each group's priority order. Completed instances freeze at their
    /// actual tardiness and sort last.
    fn recompute_urgency(&mut self) {
        let machines = &self.machines;
        for group in &mut self.groups {
            for job in &mut group.instances {
                job.refresh_completion();
                if job.done {
                    continue;
                }
                let Some(op_idx) = job.first_unfinished() else {
                    continue;
                };
                let (earliest, duration, op_type) = {
                    let op = &job.operations[op_idx];
                    (op.earliest_start, op.duration, op.op_type)
                };

                let mut sum = 0i64;
                let mut feasible = 0i64;
                for machine in machines {
                    if let Some(finish) = machine.best_finish_time(earliest, duration, op_type) {
                        sum += finish;
                        feasible += 1;
                    }
                }
                let mean_best_finish = if feasible > 0 { sum / feasible } else { 0 };

                let implied_deadline = job.deadline - job.remaining_duration_after_current();
                job.estimated_tardiness = mean_best_finish - implied_deadline;
            }
            group.rebuild_priority();
        }
    }

    /// Step reward for a just-committed action: completion bonus for the
    /// acting instance, normalized to its own duration, minus the acting
    /// machine's idle fragmentation.
    fn step_reward(&self, machine: usize, group: usize, repeat: usize) -> f64 {
        let mut reward = 0.0;
        if let Some(pos) = self.groups[group].position_of(repeat) {
            let job = &self.groups[group].instances[pos];
            if job.done {
                let profit = (job.total_duration() * COMPLETION_PROFIT_FACTOR) as f64;
                if profit > 0.0 {
                    let overrun = (job.time_exceeded * COMPLETION_OVERRUN_FACTOR) as f64;
                    reward += (profit - overrun) / profit;
                }
            }
        }
        reward -= (self.machines[machine].idle_time() / TIME_SCALE) as f64;
        reward
    }

    /// The four cost totals, recomputed from committed state.
    pub fn costs(&self) -> CostBreakdown {
        cost::compute_costs(&self.machines, &self.groups, self.last_finish_time, &self.config.rates)
    }

    /// Terminal reward: net profit as a percentage of gross profit.
    pub fn final_reward(&self) -> f64 {
        cost::final_reward(&self.machines, &self.groups, self.last_finish_time, &self.config.rates)
    }

    /// Structured numeric snapshot. Pure query: identical between commits.
    pub fn get_observation(&self) -> Observation {
        let widest = self
            .groups
            .iter()
            .map(|g| g.template.operation_count())
            .max()
            .unwrap_or(0);

        let mut job_details = Vec::with_capacity(self.groups.len());
        let mut total_durations = Vec::with_capacity(self.groups.len());
        let mut remaining_repeats = Vec::with_capacity(self.groups.len());
        let mut mean_tardiness = Vec::with_capacity(self.groups.len());
        let mut std_tardiness = Vec::with_capacity(self.groups.len());
        let mut mean_estimated = Vec::with_capacity(self.groups.len());
        let mut std_estimated = Vec::with_capacity(self.groups.len());
        let mut buffered_repeat = Vec::with_capacity(self.groups.len());
        let mut buffered_operation = Vec::with_capacity(self.groups.len());
        let mut buffered_earliest_start = Vec::with_capacity(self.groups.len());
        let mut buffered_deadline = Vec::with_capacity(self.groups.len());

        for (g_idx, group) in self.groups.iter().enumerate() {
            job_details.push(
                (0..widest)
                    .map(|i| match group.template.operations.get(i) {
                        Some(op) => [
                            scale_down(op.duration, TIME_SCALE),
                            op.op_type.index() as i64,
                        ],
                        None => [-1, -1],
                    })
                    .collect(),
            );
            total_durations.push(scale_down(group.template.total_duration(), TIME_SCALE));
            remaining_repeats.push(group.remaining());

            let actual: Vec<f64> = group
                .instances
                .iter()
                .map(|j| scale_down(j.tardiness, TIME_SCALE) as f64)
                .collect();
            let estimated: Vec<f64> = group
                .instances
                .iter()
                .map(|j| scale_down(j.estimated_tardiness, TIME_SCALE) as f64)
                .collect();
            let (mean_a, std_a) = mean_std(&actual);
            let (mean_e, std_e) = mean_std(&estimated);
            mean_tardiness.push(mean_a);
            std_tardiness.push(std_a);
            mean_estimated.push(mean_e);
            std_estimated.push(std_e);

            match self
                .buffer
                .slot(g_idx)
                .and_then(|slot| group.position_of(slot.instance).map(|pos| (slot, pos)))
            {
                Some((slot, pos)) => {
                    let job = &group.instances[pos];
                    buffered_repeat.push(slot.instance as i64);
                    buffered_operation.push(slot.operation as i64);
                    buffered_earliest_start.push(scale_down(
                        job.operations[slot.operation].earliest_start,
                        TIME_SCALE,
                    ));
                    buffered_deadline.push(scale_down(job.deadline, TIME_SCALE));
                }
                None => {
                    buffered_repeat.push(-1);
                    buffered_operation.push(-1);
                    buffered_earliest_start.push(-1);
                    buffered_deadline.push(-1);
                }
            }
        }

        let rates = &self.config.rates;
        Observation {
            action_mask: self.mask.flattened().to_vec(),
            job_details,
            current_repeats: self.config.repeats.clone(),
            total_durations,
            remaining_repeats,
            last_finish_time_per_machine: self
                .machines
                .iter()
                .map(|m| scale_down(m.last_finish_time(), TIME_SCALE))
                .collect(),
            occupancy: self
                .machines
                .iter()
                .map(|m| {
                    m.timeline()
                        .occupancy_bitmap(self.config.horizon_buckets, TIME_SCALE)
                })
                .collect(),
            mean_tardiness_per_group: mean_tardiness,
            std_tardiness_per_group: std_tardiness,
            mean_estimated_tardiness_per_group: mean_estimated,
            std_estimated_tardiness_per_group: std_estimated,
            buffered_repeat,
            buffered_operation,
            buffered_earliest_start,
            buffered_deadline,
            cost_rates: [rates.deadline, rates.hole, rates.processing, rates.makespan],
            costs: self.costs().as_array(),
        }
    }

    /// Diagnostic snapshot. Pure query: identical between commits.
    pub fn get_info(&self) -> EpisodeInfo {
        let mut deadlines = Vec::new();
        let mut tardiness = Vec::new();
        let mut time_exceeded = Vec::new();
        let mut estimated_tardiness = Vec::new();
        for group in &self.groups {
            let mut by_repeat: Vec<&JobInstance> = group.instances.iter().collect();
            by_repeat.sort_by_key(|j| j.index);
            for job in by_repeat {
                deadlines.push(job.deadline);
                tardiness.push(job.tardiness);
                time_exceeded.push(job.time_exceeded);
                estimated_tardiness.push(job.estimated_tardiness);
            }
        }

        EpisodeInfo {
            finish_time: self.last_finish_time,
            legal_actions: self.mask.flattened().to_vec(),
            dispatch_buffer: self.buffer.slots().to_vec(),
            machine_utilization: self
                .machines
                .iter()
                .map(|m| m.utilization(self.last_finish_time))
                .collect(),
            deadlines,
            tardiness,
            time_exceeded,
            estimated_tardiness,
            remaining_repeats: self.groups.iter().map(JobGroup::remaining).collect(),
            commit_log: self.commit_log.clone(),
            costs: self.costs(),
        }
    }

    /// Number of `commit` calls this episode (legal or rejected).
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Every committed operation in commit order.
    pub fn commit_log(&self) -> &[CommittedOperation] {
        &self.commit_log
    }

    /// Finish tick of the last committed operation.
    pub fn last_finish_time(&self) -> i64 {
        self.last_finish_time
    }

    /// Machines in index order.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Job groups in index order.
    pub fn groups(&self) -> &[JobGroup] {
        &self.groups
    }
}
