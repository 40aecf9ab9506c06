/// Cursor over the entry list for the "past entries" view.
///
/// The cursor is owned by the view instance; it is not shared state. After a
/// delete, call [`Carousel::sync_len`] with the new length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    current: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the visible entry, `None` when there is nothing to show.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.current)
    }

    /// Step forward, wrapping from the last entry to the first.
    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.current = if self.current + 1 >= self.len {
            0
        } else {
            self.current + 1
        };
        Some(self.current)
    }

    /// Step back, wrapping from the first entry to the last.
    pub fn prev(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.current = if self.current == 0 {
            self.len - 1
        } else {
            self.current - 1
        };
        Some(self.current)
    }

    pub fn sync_len(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.current = len.saturating_sub(1);
        }
    }
}
