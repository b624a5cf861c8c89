use super::App;

impl App {
    // Record input text to history if it's new, and reset history navigation state.
    pub fn record_history_entry(&mut self, text: &str) {
        self.history_index = None;
        if self.history.last().map(|l| l == text).unwrap_or(false) {
            return;
        }
        self.history.push(text.to_string());
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.history_index = Some(idx);
        self.editor.set_text(self.history[idx].clone());
    }

    pub fn history_next(&mut self) {
        let Some(i) = self.history_index else {
            return;
        };
        if i + 1 < self.history.len() {
            self.history_index = Some(i + 1);
            self.editor.set_text(self.history[i + 1].clone());
        } else {
            self.history_index = None;
            self.editor.clear();
        }
    }
}
