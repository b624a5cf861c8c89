use lyft_core::assistant::Persona;

use super::{App, ConfirmAction, ConfirmState, RenameState};
use crate::app::editor::LineEditor;

pub const GENERAL_THREAD: &str = "general";
const ROADMAP_PREFIX: &str = "roadmap-";

/// Thread name for a roadmap's conversation, e.g. "Full Stack" -> "roadmap-full-stack".
pub fn roadmap_thread_name(title: &str) -> String {
    let cleaned = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>();
    let slug = cleaned
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        format!("{}unknown", ROADMAP_PREFIX)
    } else {
        format!("{}{}", ROADMAP_PREFIX, slug)
    }
}

impl App {
    pub fn sidebar_inner_height(&self) -> u16 {
        self.sidebar_area
            .map(|a| a.height.saturating_sub(2))
            .unwrap_or(0)
    }

    pub fn sidebar_max_scroll(&self) -> u16 {
        let h = self.sidebar_inner_height() as usize;
        if h == 0 {
            0
        } else {
            self.threads.len().saturating_sub(h) as u16
        }
    }

    pub fn ensure_sidebar_visible(&mut self) {
        let start = self.sidebar_scroll as usize;
        let h = self.sidebar_inner_height() as usize;
        if h == 0 {
            return;
        }
        let end = start + h.saturating_sub(1);
        if self.current_thread < start {
            self.sidebar_scroll = self.current_thread as u16;
        } else if self.current_thread > end {
            self.sidebar_scroll = (self.current_thread + 1 - h) as u16;
        }
        self.sidebar_scroll = self.sidebar_scroll.min(self.sidebar_max_scroll());
    }

    pub fn current_thread_name(&self) -> &str {
        &self.threads[self.current_thread]
    }

    /// General threads talk to the platform assistant; roadmap threads to the
    /// roadmap-scoped one.
    pub fn persona(&self) -> Persona {
        let name = self.current_thread_name();
        let Some(slug) = name.strip_prefix(ROADMAP_PREFIX) else {
            return Persona::General;
        };
        let title = match &self.context.roadmap {
            Some(r) if roadmap_thread_name(&r.title) == name => r.title.clone(),
            _ => slug.replace('-', " "),
        };
        Persona::Roadmap { title }
    }

    /// Switches to `index`, refusing while a reply is outstanding.
    pub fn select_thread(&mut self, index: usize) -> bool {
        if index >= self.threads.len() || index == self.current_thread {
            return false;
        }
        if self.pending.is_some() {
            self.push_notice("Wait for the current reply (Ctrl+C cancels) before switching threads.");
            return false;
        }
        self.current_thread = index;
        self.ensure_sidebar_visible();
        self.save_state();
        self.load_current_thread_messages();
        true
    }

    /// Selects the named thread, creating it when missing.
    pub fn open_thread(&mut self, name: &str) {
        if let Some(i) = self.threads.iter().position(|t| t == name) {
            self.select_thread(i);
            return;
        }
        if self.pending.is_some() {
            self.push_notice("Wait for the current reply (Ctrl+C cancels) before switching threads.");
            return;
        }
        self.threads.push(name.to_string());
        self.current_thread = self.threads.len() - 1;
        self.ensure_sidebar_visible();
        self.save_state();
        self.load_current_thread_messages();
    }

    pub fn sidebar_select_up(&mut self) {
        if self.current_thread > 0 {
            self.select_thread(self.current_thread - 1);
        }
    }

    pub fn sidebar_select_down(&mut self) {
        self.select_thread(self.current_thread + 1);
    }

    pub fn sidebar_new_thread(&mut self) {
        let mut n = self.threads.len() + 1;
        while self.threads.iter().any(|t| *t == format!("chat-{}", n)) {
            n += 1;
        }
        self.open_thread(&format!("chat-{}", n));
    }

    pub fn sidebar_rename_current(&mut self) {
        let idx = self.current_thread.min(self.threads.len() - 1);
        self.rename = Some(RenameState {
            index: idx,
            editor: LineEditor::with_text(self.threads[idx].clone()),
        });
    }

    pub fn commit_rename(&mut self) {
        let Some(state) = self.rename.take() else {
            return;
        };
        let idx = state.index.min(self.threads.len() - 1);
        let new_name = state.editor.text().trim().to_string();
        if new_name.is_empty() || new_name == self.threads[idx] {
            return;
        }
        if self.threads.iter().any(|t| *t == new_name) {
            self.push_notice(format!("A thread named '{}' already exists.", new_name));
            return;
        }
        let old = std::mem::replace(&mut self.threads[idx], new_name.clone());
        if self.persist_enabled {
            if let Err(e) = crate::persist::rename_thread(&old, &new_name) {
                tracing::warn!(target: "tui", "rename thread {} -> {}: {:#}", old, new_name, e);
            }
        }
        self.save_state();
    }

    pub fn sidebar_delete_current(&mut self) {
        let idx = self.current_thread.min(self.threads.len() - 1);
        self.confirm = Some(ConfirmState {
            action: ConfirmAction::DeleteThread(idx),
        });
    }

    pub fn delete_thread(&mut self, idx: usize) {
        if idx >= self.threads.len() || self.pending.is_some() {
            return;
        }
        let name = self.threads.remove(idx);
        if self.persist_enabled {
            if let Err(e) = crate::persist::delete_thread(&name) {
                tracing::warn!(target: "tui", "delete thread {}: {:#}", name, e);
            }
        }
        if self.threads.is_empty() {
            self.threads.push(GENERAL_THREAD.to_string());
        }
        self.current_thread = idx.min(self.threads.len() - 1);
        self.ensure_sidebar_visible();
        self.save_state();
        self.load_current_thread_messages();
    }

    pub fn load_current_thread_messages(&mut self) {
        self.messages = if self.persist_enabled {
            crate::persist::load_thread(self.current_thread_name()).unwrap_or_else(|e| {
                tracing::warn!(target: "tui", "load thread: {:#}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };
        self.reset_chat_view();
    }
}
