//! Committed-interval timeline for a single machine.
//!
//! Maintains the set of `[start, finish)` intervals already committed to
//! one machine, sorted by start and pairwise non-overlapping. Supports
//! greedy first-fit gap search, idle-time accounting, and the fixed-width
//! occupancy bitmap used in observations.

use serde::{Deserialize, Serialize};

/// A half-open committed interval `[start, finish)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Start tick (inclusive).
    pub start: i64,
    /// Finish tick (exclusive).
    pub finish: i64,
}

impl Interval {
    /// Creates an interval from start and duration.
    pub fn new(start: i64, duration: i64) -> Self {
        Self {
            start,
            finish: start + duration,
        }
    }

    /// Interval length in ticks.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.finish - self.start
    }

    /// Whether two half-open intervals intersect.
    ///
    /// Zero-length intervals never overlap anything.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.finish && other.start < self.finish
    }

    /// Whether a tick falls inside `[start, finish)`.
    pub fn contains(&self, tick: i64) -> bool {
        self.start <= tick && tick < self.finish
    }
}

/// Ordered set of committed intervals for one machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    intervals: Vec<Interval>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed intervals, sorted by start.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of committed intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Earliest feasible start for an operation of `duration` ticks that
    /// must not begin before `earliest_start`.
    ///
    /// Greedy first-fit in time order: scans the open windows before the
    /// first interval, between consecutive intervals, and falls back to
    /// appending after the last interval. The fallback always succeeds,
    /// so placement on a capable machine is never infeasible.
    pub fn earliest_fit(&self, earliest_start: i64, duration: i64) -> i64 {
        let mut window_start = 0;
        for interval in &self.intervals {
            if interval.start > window_start {
                // Open window [window_start, interval.start).
                let candidate = window_start.max(earliest_start);
                if candidate + duration <= interval.start {
                    return candidate;
                }
            }
            window_start = window_start.max(interval.finish);
        }
        window_start.max(earliest_start)
    }

    /// Inserts a committed interval, keeping the set sorted.
    ///
    /// Returns the conflicting interval if the insertion would overlap an
    /// existing commitment. The caller must have run the gap search with
    /// no intervening mutation, so a conflict is an invariant violation.
    pub fn insert(&mut self, interval: Interval) -> Result<(), Interval> {
        let position = self
            .intervals
            .partition_point(|existing| existing.start < interval.start);
        if position > 0 && self.intervals[position - 1].overlaps(&interval) {
            return Err(self.intervals[position - 1]);
        }
        if let Some(next) = self.intervals.get(position) {
            if next.overlaps(&interval) {
                return Err(*next);
            }
        }
        self.intervals.insert(position, interval);
        Ok(())
    }

    /// Finish tick of the last committed interval, 0 when empty.
    pub fn last_finish(&self) -> i64 {
        self.intervals.last().map_or(0, |i| i.finish)
    }

    /// Start tick of the first committed interval.
    pub fn first_start(&self) -> Option<i64> {
        self.intervals.first().map(|i| i.start)
    }

    /// Total committed (busy) ticks.
    pub fn total_duration(&self) -> i64 {
        self.intervals.iter().map(Interval::duration).sum()
    }

    /// Idle ticks between the first committed start and the last
    /// committed finish. Positive values flag fragmentation.
    pub fn idle_time(&self) -> i64 {
        match self.first_start() {
            None => 0,
            Some(first) => self.last_finish() - first - self.total_duration(),
        }
    }

    /// Fixed-width busy bitmap: bucket `i` is true when the machine is
    /// busy at tick `i * bucket_width`.
    pub fn occupancy_bitmap(&self, buckets: usize, bucket_width: i64) -> Vec<bool> {
        (0..buckets)
            .map(|i| {
                let tick = i as i64 * bucket_width;
                self.intervals.iter().any(|iv| iv.contains(tick))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_with(intervals: &[(i64, i64)]) -> Timeline {
        let mut t = Timeline::new();
        for &(start, duration) in intervals {
            t.insert(Interval::new(start, duration)).unwrap();
        }
        t
    }

    #[test]
    fn test_empty_timeline_fit() {
        let t = Timeline::new();
        assert_eq!(t.earliest_fit(0, 10), 0);
        assert_eq!(t.earliest_fit(25, 10), 25);
        assert_eq!(t.last_finish(), 0);
        assert_eq!(t.idle_time(), 0);
    }

    #[test]
    fn test_fit_appends_after_last() {
        let t = timeline_with(&[(0, 10)]);
        // No window before [0, 10) → append at 10.
        assert_eq!(t.earliest_fit(0, 5), 10);
    }

    #[test]
    fn test_fit_uses_gap_between_intervals() {
        let t = timeline_with(&[(0, 10), (30, 10)]);
        // Gap [10, 30) holds a 15-tick operation.
        assert_eq!(t.earliest_fit(0, 15), 10);
        // But not a 25-tick one → append at 40.
        assert_eq!(t.earliest_fit(0, 25), 40);
    }

    #[test]
    fn test_fit_respects_earliest_start_in_gap() {
        let t = timeline_with(&[(0, 10), (30, 10)]);
        // Bound 15 pushes the candidate inside the gap: [15, 25) fits.
        assert_eq!(t.earliest_fit(15, 10), 15);
        // Bound 25 leaves too little room in the gap → append.
        assert_eq!(t.earliest_fit(25, 10), 40);
    }

    #[test]
    fn test_fit_before_first_interval() {
        let t = timeline_with(&[(50, 10)]);
        assert_eq!(t.earliest_fit(0, 20), 0);
        assert_eq!(t.earliest_fit(45, 5), 45);
        // Cannot finish before 50 → append at 60.
        assert_eq!(t.earliest_fit(45, 10), 60);
    }

    #[test]
    fn test_first_fit_is_greedy_not_optimal() {
        // Two gaps; the earlier one satisfies the bound, so it wins even
        // though the later gap would leave less fragmentation.
        let t = timeline_with(&[(0, 10), (20, 10), (40, 10)]);
        assert_eq!(t.earliest_fit(0, 5), 10);
    }

    #[test]
    fn test_insert_keeps_sorted_order() {
        let t = timeline_with(&[(30, 10), (0, 10), (15, 5)]);
        let starts: Vec<i64> = t.intervals().iter().map(|i| i.start).collect();
        assert_eq!(starts, vec![0, 15, 30]);
    }

    #[test]
    fn test_insert_rejects_overlap() {
        let mut t = timeline_with(&[(0, 10), (20, 10)]);
        assert!(t.insert(Interval::new(5, 3)).is_err());
        assert!(t.insert(Interval::new(25, 10)).is_err());
        assert!(t.insert(Interval::new(8, 5)).is_err());
        assert_eq!(t.len(), 2);
        // Touching boundaries are fine for half-open intervals.
        assert!(t.insert(Interval::new(10, 10)).is_ok());
    }

    #[test]
    fn test_idle_time_measures_holes() {
        let t = timeline_with(&[(0, 10), (30, 10)]);
        // [10, 30) is a 20-tick hole.
        assert_eq!(t.idle_time(), 20);

        let packed = timeline_with(&[(0, 10), (10, 10)]);
        assert_eq!(packed.idle_time(), 0);
    }

    #[test]
    fn test_idle_time_ignores_leading_gap() {
        // Idle time is measured from the first committed start.
        let t = timeline_with(&[(50, 10), (60, 10)]);
        assert_eq!(t.idle_time(), 0);
    }

    #[test]
    fn test_total_duration() {
        let t = timeline_with(&[(0, 10), (30, 5)]);
        assert_eq!(t.total_duration(), 15);
    }

    #[test]
    fn test_occupancy_bitmap_point_samples() {
        let t = timeline_with(&[(0, 150), (200, 100)]);
        let bitmap = t.occupancy_bitmap(4, 100);
        // Samples at ticks 0, 100, 200, 300.
        assert_eq!(bitmap, vec![true, true, true, false]);
    }

    #[test]
    fn test_overlap_semantics_half_open() {
        let a = Interval::new(0, 10);
        let b = Interval::new(10, 10);
        assert!(!a.overlaps(&b));
        let c = Interval::new(9, 1);
        assert!(a.overlaps(&c));
        let zero = Interval::new(5, 0);
        assert!(!a.overlaps(&zero));
    }
}
