//! Dispatch buffer and legality mask.
//!
//! The dispatch buffer holds, per job group, the single operation
//! currently eligible for scheduling: the first unfinished operation of
//! the group's highest-priority instance. The legality mask is the
//! boolean feasibility table over (machine, job-group) pairs derived from
//! the buffer and machine capabilities; external actions are screened
//! against it before any state mutation.

use serde::{Deserialize, Serialize};

use crate::models::{JobGroup, Machine};

/// The dispatchable candidate of one job group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSlot {
    /// Repeat index of the buffered instance.
    pub instance: usize,
    /// Operation index within that instance.
    pub operation: usize,
}

/// One candidate slot per job group; `None` once a group is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchBuffer {
    slots: Vec<Option<BufferSlot>>,
}

impl DispatchBuffer {
    /// Creates an empty buffer for `groups` job groups.
    pub fn new(groups: usize) -> Self {
        Self {
            slots: vec![None; groups],
        }
    }

    /// The buffered candidate for a group.
    pub fn slot(&self, group: usize) -> Option<BufferSlot> {
        self.slots.get(group).copied().flatten()
    }

    /// All slots in group order.
    pub fn slots(&self) -> &[Option<BufferSlot>] {
        &self.slots
    }

    /// Number of group slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has no group slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Refills every slot from the groups' current priority order.
    ///
    /// For each group with at least one incomplete instance, records the
    /// head instance's first unfinished operation; exhausted groups clear
    /// to `None` and stay cleared. Groups must have been re-prioritized
    /// before this call.
    pub fn refresh(&mut self, groups: &[JobGroup]) {
        for (slot, group) in self.slots.iter_mut().zip(groups) {
            *slot = if group.all_done() {
                None
            } else {
                group.head().and_then(|job| {
                    job.first_unfinished().map(|operation| BufferSlot {
                        instance: job.index,
                        operation,
                    })
                })
            };
        }
    }
}

/// Boolean feasibility table over (machine, job-group) pairs.
///
/// Machine-major layout; `true` iff the group's buffered operation exists
/// and its type is within the machine's capability set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalityMask {
    machines: usize,
    groups: usize,
    mask: Vec<bool>,
}

impl LegalityMask {
    /// Creates an all-false mask.
    pub fn new(machines: usize, groups: usize) -> Self {
        Self {
            machines,
            groups,
            mask: vec![false; machines * groups],
        }
    }

    /// Number of machines.
    pub fn machine_count(&self) -> usize {
        self.machines
    }

    /// Number of job groups.
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Mask entry for a (machine, group) pair; `None` when out of range.
    pub fn get(&self, machine: usize, group: usize) -> Option<bool> {
        if machine < self.machines && group < self.groups {
            Some(self.mask[machine * self.groups + group])
        } else {
            None
        }
    }

    /// Whether any action is currently legal.
    pub fn any(&self) -> bool {
        self.mask.iter().any(|&legal| legal)
    }

    /// Machine-major flattened view, as exposed in observations.
    pub fn flattened(&self) -> &[bool] {
        &self.mask
    }

    /// Rebuilds every entry from the refreshed buffer and machine
    /// capabilities.
    pub fn rebuild(&mut self, machines: &[Machine], groups: &[JobGroup], buffer: &DispatchBuffer) {
        for (g_idx, group) in groups.iter().enumerate() {
            let buffered_type = buffer.slot(g_idx).and_then(|slot| {
                group
                    .position_of(slot.instance)
                    .map(|pos| group.instances[pos].operations[slot.operation].op_type)
            });
            for (m_idx, machine) in machines.iter().enumerate() {
                self.mask[m_idx * self.groups + g_idx] = match buffered_type {
                    Some(op_type) => machine.can_process(op_type),
                    None => false,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobTemplate, MachineSpec, OpType, OperationSpec};

    fn make_group(op_types: &[OpType], repeats: usize) -> JobGroup {
        let mut template = JobTemplate::new("J1").with_deadlines(vec![1000; repeats]);
        for (i, &t) in op_types.iter().enumerate() {
            let mut spec = OperationSpec::new(t, 100);
            if i > 0 {
                spec = spec.with_predecessor(i - 1);
            }
            template = template.with_operation(spec);
        }
        let mut group = JobGroup::new(&template, repeats);
        group.rebuild_priority();
        group
    }

    fn make_machine(types: &[OpType]) -> Machine {
        Machine::from_spec(&MachineSpec::new("M").with_capabilities(types))
    }

    #[test]
    fn test_refresh_points_at_first_unfinished() {
        let mut group = make_group(&[OpType::A, OpType::B], 1);
        let mut buffer = DispatchBuffer::new(1);
        buffer.refresh(&[group.clone()]);
        assert_eq!(
            buffer.slot(0),
            Some(BufferSlot {
                instance: 0,
                operation: 0
            })
        );

        group.instances[0].operations[0].commit(0, 0);
        buffer.refresh(&[group]);
        assert_eq!(
            buffer.slot(0),
            Some(BufferSlot {
                instance: 0,
                operation: 1
            })
        );
    }

    #[test]
    fn test_refresh_clears_exhausted_group() {
        let mut group = make_group(&[OpType::A], 1);
        group.instances[0].operations[0].commit(0, 0);
        group.instances[0].refresh_completion();
        let mut buffer = DispatchBuffer::new(1);
        buffer.refresh(&[group]);
        assert_eq!(buffer.slot(0), None);
    }

    #[test]
    fn test_refresh_tracks_priority_head() {
        let mut group = make_group(&[OpType::A], 2);
        group.instances[1].estimated_tardiness = 500;
        group.rebuild_priority();
        let mut buffer = DispatchBuffer::new(1);
        buffer.refresh(&[group]);
        assert_eq!(buffer.slot(0).unwrap().instance, 1);
    }

    #[test]
    fn test_mask_follows_capabilities() {
        let groups = vec![make_group(&[OpType::A], 1), make_group(&[OpType::B], 1)];
        let machines = vec![make_machine(&[OpType::A]), make_machine(&[OpType::A, OpType::B])];
        let mut buffer = DispatchBuffer::new(2);
        buffer.refresh(&groups);
        let mut mask = LegalityMask::new(2, 2);
        mask.rebuild(&machines, &groups, &buffer);

        assert_eq!(mask.get(0, 0), Some(true));
        assert_eq!(mask.get(0, 1), Some(false));
        assert_eq!(mask.get(1, 0), Some(true));
        assert_eq!(mask.get(1, 1), Some(true));
        assert!(mask.any());
    }

    #[test]
    fn test_mask_false_for_empty_slot() {
        let mut group = make_group(&[OpType::A], 1);
        group.instances[0].operations[0].commit(0, 0);
        group.instances[0].refresh_completion();
        let machines = vec![make_machine(&[OpType::A])];
        let mut buffer = DispatchBuffer::new(1);
        buffer.refresh(std::slice::from_ref(&group));
        let mut mask = LegalityMask::new(1, 1);
        mask.rebuild(&machines, &[group], &buffer);

        assert_eq!(mask.get(0, 0), Some(false));
        assert!(!mask.any());
    }

    #[test]
    fn test_mask_out_of_range_is_none() {
        let mask = LegalityMask::new(2, 3);
        assert_eq!(mask.get(2, 0), None);
        assert_eq!(mask.get(0, 3), None);
        assert_eq!(mask.flattened().len(), 6);
    }

    #[test]
    fn test_flattened_is_machine_major() {
        let groups = vec![make_group(&[OpType::A], 1), make_group(&[OpType::B], 1)];
        let machines = vec![make_machine(&[OpType::A]), make_machine(&[OpType::B])];
        let mut buffer = DispatchBuffer::new(2);
        buffer.refresh(&groups);
        let mut mask = LegalityMask::new(2, 2);
        mask.rebuild(&machines, &groups, &buffer);
        // Row 0 = machine 0 over groups, row 1 = machine 1.
        assert_eq!(mask.flattened(), &[true, false, false, true]);
    }
}
