//! Good-time-interval sets.
//!
//! An [`IntervalSet`] holds disjoint half-open `[start, stop)` intervals sorted
//! by start. Overlapping or abutting insertions are merged, so the set is
//! always in canonical form and equality is structural.

use crate::cursor::ForwardCursor;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub stop: f64,
}

impl Interval {
    pub fn new(start: f64, stop: f64) -> Result<Self, CoreError> {
        if !(start.is_finite() && stop.is_finite()) {
            return Err(CoreError::InvalidRange {
                start,
                stop,
                reason: "interval bounds must be finite",
            });
        }
        if start >= stop {
            return Err(CoreError::InvalidRange {
                start,
                stop,
                reason: "start must precede stop",
            });
        }
        Ok(Self { start, stop })
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.stop
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set by inserting each `(start, stop)` pair in turn.
    pub fn from_intervals<I>(pairs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut set = Self::new();
        for (start, stop) in pairs {
            set.insert_interval(start, stop)?;
        }
        Ok(set)
    }

    /// Insert `[start, stop)`, merging with every interval it overlaps or abuts.
    pub fn insert_interval(&mut self, start: f64, stop: f64) -> Result<(), CoreError> {
        let new = Interval::new(start, stop)?;

        // First interval that ends at or after `start` (touching counts).
        let lo = self.intervals.partition_point(|iv| iv.stop < new.start);
        // One past the last interval that starts at or before `stop`.
        let hi = self.intervals.partition_point(|iv| iv.start <= new.stop);

        let merged = if lo < hi {
            Interval {
                start: new.start.min(self.intervals[lo].start),
                stop: new.stop.max(self.intervals[hi - 1].stop),
            }
        } else {
            new
        };
        self.intervals.splice(lo..hi, std::iter::once(merged));
        Ok(())
    }

    /// True iff `t` lies in `[start, stop)` of some interval.
    pub fn accept(&self, t: f64) -> bool {
        let idx = self.intervals.partition_point(|iv| iv.start <= t);
        idx > 0 && self.intervals[idx - 1].stop > t
    }

    /// Intersect every interval with `[tmin, tmax]`, dropping empty pieces.
    pub fn apply_time_range_cut(&self, tmin: f64, tmax: f64) -> IntervalSet {
        let intervals = self
            .intervals
            .iter()
            .filter_map(|iv| {
                let start = iv.start.max(tmin);
                let stop = iv.stop.min(tmax);
                (start < stop).then_some(Interval { start, stop })
            })
            .collect();
        IntervalSet { intervals }
    }

    pub fn min_value(&self) -> Result<f64, CoreError> {
        self.intervals.first().map(|iv| iv.start).ok_or(CoreError::EmptySet)
    }

    pub fn max_value(&self) -> Result<f64, CoreError> {
        self.intervals.last().map(|iv| iv.stop).ok_or(CoreError::EmptySet)
    }

    /// Total covered time.
    pub fn ontime(&self) -> f64 {
        self.intervals.iter().map(Interval::duration).sum()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Streaming acceptor for non-decreasing times.
    pub fn cursor(&self) -> GtiCursor<'_> {
        GtiCursor {
            cursor: ForwardCursor::new(&self.intervals),
        }
    }
}

/// Accepts a non-decreasing stream of times against an [`IntervalSet`].
///
/// Equivalent to [`IntervalSet::accept`] for sorted input, without the binary
/// search per call.
#[derive(Debug, Clone)]
pub struct GtiCursor<'a> {
    cursor: ForwardCursor<'a, Interval>,
}

impl GtiCursor<'_> {
    pub fn accept(&mut self, t: f64) -> bool {
        self.cursor.advance_while(|iv| iv.stop <= t);
        self.cursor.current().is_some_and(|iv| iv.start <= t)
    }
}
