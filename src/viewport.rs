//! Cursor and scroll bookkeeping for a list shown through a fixed-height window.

/// Returns the scroll offset that keeps `cursor` inside a window of
/// `visible` rows, clamped to `[0, max(0, total - visible)]`.
pub fn adjust(cursor: usize, offset: usize, visible: usize, total: usize) -> usize {
    let visible = visible.max(1);
    let mut offset = offset;
    if cursor >= offset + visible {
        offset = cursor + 1 - visible;
    } else if cursor < offset {
        offset = cursor;
    }
    offset.min(total.saturating_sub(visible))
}

/// Cursor plus scroll offset over one list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListCursor {
    pub cursor: usize,
    pub offset: usize,
}

impl ListCursor {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    /// Re-establishes both invariants after the list length or the window
    /// height changed.
    pub fn clamp(&mut self, total: usize, visible: usize) {
        if total == 0 {
            self.reset();
            return;
        }
        if self.cursor >= total {
            self.cursor = total - 1;
        }
        self.offset = adjust(self.cursor, self.offset, visible, total);
    }

    pub fn select(&mut self, index: usize, total: usize, visible: usize) {
        self.cursor = index;
        self.clamp(total, visible);
    }

    /// Moves by one row, wrapping around at either end.
    pub fn step(&mut self, forward: bool, total: usize, visible: usize) {
        if total == 0 {
            self.reset();
            return;
        }
        let cur = self.cursor.min(total - 1);
        self.cursor = if forward {
            (cur + 1) % total
        } else {
            (cur + total - 1) % total
        };
        self.offset = adjust(self.cursor, self.offset, visible, total);
    }

    /// Moves by a window height without wrapping.
    pub fn page(&mut self, forward: bool, total: usize, visible: usize) {
        if total == 0 {
            self.reset();
            return;
        }
        let step = visible.max(1);
        let cur = self.cursor.min(total - 1);
        self.cursor = if forward {
            (cur + step).min(total - 1)
        } else {
            cur.saturating_sub(step)
        };
        self.offset = adjust(self.cursor, self.offset, visible, total);
    }

    pub fn first(&mut self, total: usize, visible: usize) {
        self.select(0, total, visible);
    }

    pub fn last(&mut self, total: usize, visible: usize) {
        self.select(total.saturating_sub(1), total, visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cursor_below_window_becomes_last_row() {
        assert_eq!(adjust(12, 0, 5, 30), 8);
    }

    #[test]
    fn cursor_above_window_becomes_first_row() {
        assert_eq!(adjust(3, 10, 5, 30), 3);
    }

    #[test]
    fn offset_never_leaves_the_tail_empty() {
        assert_eq!(adjust(2, 25, 5, 10), 2);
        assert_eq!(adjust(9, 9, 5, 10), 5);
        assert_eq!(adjust(0, 4, 10, 3), 0);
    }

    #[test]
    fn step_wraps_in_both_directions() {
        let mut c = ListCursor::default();
        c.step(false, 4, 2);
        assert_eq!(c.cursor, 3);
        assert_eq!(c.offset, 2);
        c.step(true, 4, 2);
        assert_eq!(c.cursor, 0);
        assert_eq!(c.offset, 0);
    }

    #[test]
    fn shrinking_list_pulls_cursor_back() {
        let mut c = ListCursor {
            cursor: 7,
            offset: 5,
        };
        c.clamp(3, 5);
        assert_eq!(c, ListCursor { cursor: 2, offset: 0 });
        c.clamp(0, 5);
        assert_eq!(c, ListCursor::default());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Step(bool),
        Page(bool),
        First,
        Last,
        Resize(usize),
        Relen(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Step),
            any::<bool>().prop_map(Op::Page),
            Just(Op::First),
            Just(Op::Last),
            (1usize..12).prop_map(Op::Resize),
            (0usize..40).prop_map(Op::Relen),
        ]
    }

    proptest! {
        #[test]
        fn cursor_stays_visible_and_offset_in_range(
            ops in proptest::collection::vec(op(), 0..60),
            start_len in 0usize..40,
        ) {
            let mut c = ListCursor::default();
            let mut len = start_len;
            let mut visible = 5usize;
            for op in ops {
                match op {
                    Op::Step(f) => c.step(f, len, visible),
                    Op::Page(f) => c.page(f, len, visible),
                    Op::First => c.first(len, visible),
                    Op::Last => c.last(len, visible),
                    Op::Resize(v) => { visible = v; c.clamp(len, visible); }
                    Op::Relen(n) => { len = n; c.clamp(len, visible); }
                }
                prop_assert!(c.offset <= len.saturating_sub(visible));
                if len > 0 {
                    prop_assert!(c.cursor < len);
                    prop_assert!(c.cursor >= c.offset && c.cursor < c.offset + visible);
                } else {
                    prop_assert_eq!(c.cursor, 0);
                }
            }
        }
    }
}
