use unicode_segmentation::UnicodeSegmentation;

/// Grapheme-aware text buffer with a cursor, shared by the message input and
/// the rename prompt.
#[derive(Clone, Debug, Default)]
pub struct LineEditor {
    text: String,
    cursor: usize,
}

impl LineEditor {
    pub fn with_text<S: Into<String>>(s: S) -> Self {
        let text = s.into();
        let cursor = text.graphemes(true).count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in graphemes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set_text<S: Into<String>>(&mut self, s: S) {
        *self = Self::with_text(s);
    }

    fn parts(&self) -> Vec<&str> {
        self.text.graphemes(true).collect()
    }

    pub fn insert(&mut self, s: &str) {
        let parts = self.parts();
        let idx = self.cursor.min(parts.len());
        let mut out = String::with_capacity(self.text.len() + s.len());
        out.extend(parts[..idx].iter().copied());
        out.push_str(s);
        out.extend(parts[idx..].iter().copied());
        let added = s.graphemes(true).count();
        self.text = out;
        self.cursor = (idx + added).min(self.text.graphemes(true).count());
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut parts = self.parts();
        let idx = self.cursor.min(parts.len());
        parts.remove(idx - 1);
        self.text = parts.concat();
        self.cursor = idx - 1;
    }

    pub fn delete(&mut self) {
        let mut parts = self.parts();
        let idx = self.cursor.min(parts.len());
        if idx < parts.len() {
            parts.remove(idx);
            self.text = parts.concat();
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        let len = self.text.graphemes(true).count();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn end(&mut self) {
        self.cursor = self.line_end();
    }

    fn line_start(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1] != "\n" {
            i -= 1;
        }
        i
    }

    fn line_end(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i] != "\n" {
            i += 1;
        }
        i
    }

    fn word_left_index(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        while i > 0 && !parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        i
    }

    pub fn word_left(&mut self) {
        self.cursor = self.word_left_index();
    }

    pub fn word_right(&mut self) {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i].trim().is_empty() {
            i += 1;
        }
        while i < parts.len() && !parts[i].trim().is_empty() {
            i += 1;
        }
        self.cursor = i;
    }

    fn drain(&mut self, from: usize, to: usize) {
        let mut parts = self.parts();
        let to = to.min(parts.len());
        if from >= to {
            return;
        }
        parts.drain(from..to);
        self.text = parts.concat();
    }

    pub fn delete_word_left(&mut self) {
        let start = self.word_left_index();
        let end = self.cursor;
        self.drain(start, end);
        self.cursor = start;
    }

    pub fn kill_to_line_start(&mut self) {
        let start = self.line_start();
        let end = self.cursor;
        self.drain(start, end);
        self.cursor = start;
    }

    pub fn kill_to_line_end(&mut self) {
        let end = self.line_end();
        self.drain(self.cursor, end);
    }
}
