//! Forward-only cursor over an ordered slice.
//!
//! Time-ordered tables (pointing history, GTIs) are consumed by streams of
//! non-decreasing event times. The cursor only ever moves forward, so a full
//! pass over `n` events and `m` records costs `O(n + m)`.

/// A position into a borrowed, ordered slice that never moves backwards.
#[derive(Debug, Clone)]
pub struct ForwardCursor<'a, R> {
    items: &'a [R],
    position: usize,
}

impl<'a, R> ForwardCursor<'a, R> {
    pub fn new(items: &'a [R]) -> Self {
        Self { items, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item under the cursor, or `None` once every item has been passed.
    pub fn current(&self) -> Option<&'a R> {
        self.items.get(self.position)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.items.len()
    }

    pub fn is_at_last(&self) -> bool {
        self.position + 1 == self.items.len()
    }

    /// Advance while `pred` holds for the current item. May run off the end.
    ///
    /// Returns the number of steps taken.
    pub fn advance_while<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&R) -> bool,
    {
        let start = self.position;
        while let Some(item) = self.items.get(self.position) {
            if !pred(item) {
                break;
            }
            self.position += 1;
        }
        self.position - start
    }

    /// Advance while `pred` holds, but never past the last item.
    ///
    /// Returns the number of steps taken.
    pub fn advance_while_before_last<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&R) -> bool,
    {
        let start = self.position;
        while self.position + 1 < self.items.len() && pred(&self.items[self.position]) {
            self.position += 1;
        }
        self.position - start
    }

    /// Move past every remaining item.
    pub fn exhaust(&mut self) {
        self.position = self.items.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_while_can_exhaust() {
        let items = [1, 3, 5, 7];
        let mut cursor = ForwardCursor::new(&items);
        assert_eq!(cursor.advance_while(|&x| x < 4), 2);
        assert_eq!(cursor.current(), Some(&5));
        assert_eq!(cursor.advance_while(|&x| x < 100), 2);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn advance_while_before_last_stops_on_last_item() {
        let items = [1, 3, 5, 7];
        let mut cursor = ForwardCursor::new(&items);
        assert_eq!(cursor.advance_while_before_last(|&x| x < 100), 3);
        assert!(cursor.is_at_last());
        assert_eq!(cursor.current(), Some(&7));
        assert_eq!(cursor.advance_while_before_last(|_| true), 0);
    }

    #[test]
    fn position_never_decreases() {
        let items = [0.0, 1.0, 2.0, 3.0];
        let mut cursor = ForwardCursor::new(&items);
        let mut last = 0;
        for t in [0.5, 2.5, 1.0, 3.5] {
            cursor.advance_while_before_last(|&x| x + 1.0 <= t);
            assert!(cursor.position() >= last);
            last = cursor.position();
        }
    }
}
