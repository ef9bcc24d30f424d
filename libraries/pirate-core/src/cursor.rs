//! Wrap-around list cursor shared by every on-screen list

/// Index into a list of `len` entries that wraps at both ends
///
/// The index is always `< len` when `len > 0`, and `0` for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrappingCursor {
    index: usize,
    len: usize,
}

impl WrappingCursor {
    /// Cursor at the first entry of a list of `len` entries
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Cursor at `index`, clamped into range
    pub fn at(index: usize, len: usize) -> Self {
        let mut cursor = Self::new(len);
        cursor.set(index);
        cursor
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move one entry up, wrapping to the last entry
    pub fn previous(&mut self) {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
    }

    /// Move one entry down, wrapping to the first entry
    pub fn next(&mut self) {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
    }

    /// Jump to `index`; out-of-range indices land on the last entry
    pub fn set(&mut self, index: usize) {
        self.index = if self.len == 0 {
            0
        } else {
            index.min(self.len - 1)
        };
    }

    /// First row of a `visible`-row window that keeps the cursor on screen
    ///
    /// The window starts `lead` rows above the cursor, and is pulled back so
    /// it never runs past the end of the list.
    pub fn window_start(&self, visible: usize, lead: usize) -> usize {
        let start = self.index.saturating_sub(lead);
        let max_start = self.len.saturating_sub(visible);
        start.min(max_start)
    }
}
