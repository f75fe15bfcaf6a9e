//! Pointing history and the monotonic boresight cursor.

use crate::cursor::ForwardCursor;
use crate::domain::{PointingRecord, SkyDir};
use crate::error::CoreError;

const PRECEDES_COVERAGE: &str = "time precedes first pointing record";
const EXCEEDS_COVERAGE: &str = "time exceeds pointing coverage";
const IN_GAP: &str = "time falls in a pointing gap";
const NOT_FINITE: &str = "time is not finite";

/// Time-ordered spacecraft pointing records, owned by whoever loaded them.
#[derive(Debug, Clone)]
pub struct PointingTable {
    records: Vec<PointingRecord>,
}

impl PointingTable {
    /// Validate and wrap records sorted by `start`.
    ///
    /// Gaps between consecutive records are allowed.
    pub fn new(records: Vec<PointingRecord>) -> Result<Self, CoreError> {
        if records.is_empty() {
            return Err(CoreError::EmptyTable);
        }
        for (i, rec) in records.iter().enumerate() {
            if !(rec.start.is_finite() && rec.stop.is_finite() && rec.start < rec.stop) {
                return Err(CoreError::InvalidRange {
                    start: rec.start,
                    stop: rec.stop,
                    reason: "pointing record must have finite start < stop",
                });
            }
            if i > 0 && rec.start < records[i - 1].start {
                return Err(CoreError::UnsortedTable { index: i });
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PointingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.records[0].start
    }

    pub fn stop(&self) -> f64 {
        self.records[self.records.len() - 1].stop
    }

    /// A fresh cursor positioned on the first record.
    pub fn cursor(&self) -> PointingCursor<'_> {
        PointingCursor::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Tracking,
    Exhausted,
}

/// Resolves the boresight at a stream of non-decreasing times.
///
/// The cursor never rewinds: feeding a time earlier than one already resolved
/// gives unspecified (but memory-safe) results.
#[derive(Debug, Clone)]
pub struct PointingCursor<'a> {
    cursor: ForwardCursor<'a, PointingRecord>,
    state: CursorState,
    resolved: Option<usize>,
}

impl<'a> PointingCursor<'a> {
    pub fn new(table: &'a PointingTable) -> Self {
        Self {
            cursor: ForwardCursor::new(table.records()),
            state: CursorState::Tracking,
            resolved: None,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Index of the record that satisfied the most recent successful lookup.
    pub fn resolved_index(&self) -> Option<usize> {
        self.resolved
    }

    pub fn current_record(&self) -> Option<&'a PointingRecord> {
        self.cursor.current()
    }

    pub fn resolve_boresight(&mut self, t: f64) -> Result<SkyDir, CoreError> {
        if !t.is_finite() {
            return Err(CoreError::Coverage {
                time: t,
                reason: NOT_FINITE,
            });
        }
        if self.state == CursorState::Exhausted {
            return Err(CoreError::Coverage {
                time: t,
                reason: EXCEEDS_COVERAGE,
            });
        }

        if self.resolved == Some(self.cursor.position()) {
            if let Some(record) = self.cursor.current().filter(|r| r.contains(t)) {
                return Ok(record.boresight);
            }
        }

        self.cursor.advance_while_before_last(|rec| t >= rec.stop);

        let Some(record) = self.cursor.current() else {
            self.state = CursorState::Exhausted;
            return Err(CoreError::Coverage {
                time: t,
                reason: EXCEEDS_COVERAGE,
            });
        };

        if t >= record.stop {
            self.state = CursorState::Exhausted;
            self.resolved = None;
            self.cursor.exhaust();
            return Err(CoreError::Coverage {
                time: t,
                reason: EXCEEDS_COVERAGE,
            });
        }

        if t < record.start {
            let reason = if self.cursor.position() == 0 {
                PRECEDES_COVERAGE
            } else {
                IN_GAP
            };
            return Err(CoreError::Coverage { time: t, reason });
        }

        self.resolved = Some(self.cursor.position());
        Ok(record.boresight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PointingTable {
        PointingTable::new(vec![
            PointingRecord::new(0.0, 1.0, 10.0, 0.0),
            PointingRecord::new(1.0, 5.0, 20.0, 0.0),
            PointingRecord::new(5.0, 10.0, 30.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_records_in_order_without_rewinding() {
        let table = table();
        let mut cursor = table.cursor();
        let mut seen = Vec::new();
        let mut last_position = 0;
        for t in [0.5, 1.5, 1.5, 9.9] {
            let dir = cursor.resolve_boresight(t).unwrap();
            assert!(cursor.position() >= last_position);
            last_position = cursor.position();
            seen.push((cursor.resolved_index().unwrap(), dir.ra));
        }
        assert_eq!(seen, vec![(0, 10.0), (1, 20.0), (1, 20.0), (2, 30.0)]);
        assert_eq!(cursor.state(), CursorState::Tracking);
    }

    #[test]
    fn record_boundaries_are_half_open() {
        let table = table();
        let mut cursor = table.cursor();
        assert_eq!(cursor.resolve_boresight(1.0).unwrap().ra, 20.0);
        assert_eq!(cursor.resolved_index(), Some(1));
        assert_eq!(cursor.current_record().map(|r| r.start), Some(1.0));
        assert_eq!(cursor.resolve_boresight(5.0).unwrap().ra, 30.0);
        assert_eq!(cursor.current_record().map(|r| r.stop), Some(10.0));
    }

    #[test]
    fn time_before_first_record_is_a_coverage_error() {
        let table = table();
        let mut cursor = table.cursor();
        let err = cursor.resolve_boresight(-0.1).unwrap_err();
        assert_eq!(
            err,
            CoreError::Coverage {
                time: -0.1,
                reason: PRECEDES_COVERAGE
            }
        );
        // Still usable afterwards.
        assert_eq!(cursor.resolve_boresight(0.0).unwrap().ra, 10.0);
    }

    #[test]
    fn time_at_last_stop_exhausts_the_cursor() {
        let table = table();
        let mut cursor = table.cursor();
        cursor.resolve_boresight(2.0).unwrap();
        let err = cursor.resolve_boresight(10.0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Coverage {
                reason: EXCEEDS_COVERAGE,
                ..
            }
        ));
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(cursor.resolve_boresight(10.5).is_err());
    }

    #[test]
    fn gaps_are_reported_and_stream_continues() {
        let table = PointingTable::new(vec![
            PointingRecord::new(0.0, 1.0, 10.0, 0.0),
            PointingRecord::new(2.0, 3.0, 20.0, 0.0),
        ])
        .unwrap();
        let mut cursor = table.cursor();
        cursor.resolve_boresight(0.5).unwrap();
        let err = cursor.resolve_boresight(1.5).unwrap_err();
        assert!(matches!(err, CoreError::Coverage { reason: IN_GAP, .. }));
        assert_eq!(cursor.state(), CursorState::Tracking);
        assert_eq!(cursor.resolve_boresight(2.5).unwrap().ra, 20.0);
    }

    #[test]
    fn table_validation() {
        assert_eq!(PointingTable::new(vec![]).unwrap_err(), CoreError::EmptyTable);
        assert!(matches!(
            PointingTable::new(vec![PointingRecord::new(1.0, 1.0, 0.0, 0.0)]),
            Err(CoreError::InvalidRange { .. })
        ));
        assert_eq!(
            PointingTable::new(vec![
                PointingRecord::new(5.0, 6.0, 0.0, 0.0),
                PointingRecord::new(1.0, 2.0, 0.0, 0.0),
            ])
            .unwrap_err(),
            CoreError::UnsortedTable { index: 1 }
        );
    }
}
