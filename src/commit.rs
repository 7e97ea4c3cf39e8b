/// Text entry for the commit message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitBuffer {
    pub message: String,
    /// Cursor position in chars, not bytes.
    pub cursor: usize,
    pub limit: usize,
    /// Set while the commit is in flight; edits are ignored.
    pub busy: bool,
}

impl CommitBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            message: String::new(),
            cursor: 0,
            limit: limit.max(1),
            busy: false,
        }
    }

    pub fn len(&self) -> usize {
        self.message.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn insert_char(&mut self, ch: char) {
        if self.busy || ch.is_control() || self.len() >= self.limit {
            return;
        }
        let byte = char_to_byte_index(&self.message, self.cursor);
        self.message.insert(byte, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.busy || self.cursor == 0 {
            return;
        }
        let b0 = char_to_byte_index(&self.message, self.cursor - 1);
        let b1 = char_to_byte_index(&self.message, self.cursor);
        if b0 < b1 {
            self.message.replace_range(b0..b1, "");
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        if self.busy || self.cursor >= self.len() {
            return;
        }
        let b0 = char_to_byte_index(&self.message, self.cursor);
        let b1 = char_to_byte_index(&self.message, self.cursor + 1);
        if b0 < b1 {
            self.message.replace_range(b0..b1, "");
        }
    }

    /// Splits the message around the cursor for painting.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.message
            .split_at(char_to_byte_index(&self.message, self.cursor))
    }
}

fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}
