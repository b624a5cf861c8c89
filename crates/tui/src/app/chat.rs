use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use crate::strings::{PREFIX_ASSISTANT, PREFIX_NOTICE, PREFIX_USER, THINKING};

use super::{App, Message, Role, WrappedMsg};

impl App {
    pub fn ensure_chat_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        if self.chat_wrap_width != width || self.chat_cache.len() != self.messages.len() {
            self.chat_cache = self
                .messages
                .iter()
                .map(|m| Self::wrap_message(m, width))
                .collect();
            self.chat_total_lines = self.chat_cache.iter().map(|w| w.lines.len()).sum();
            self.chat_wrap_width = width;
            return;
        }
        // Only the last message changes in place (placeholder -> reply).
        if let (Some(last_msg), Some(last_wrap)) = (self.messages.last(), self.chat_cache.last()) {
            if last_msg.content.len() != last_wrap.content_len || last_msg.role != last_wrap.role {
                let idx = self.messages.len() - 1;
                self.chat_cache[idx] = Self::wrap_message(last_msg, width);
                self.chat_total_lines = self.chat_cache.iter().map(|w| w.lines.len()).sum();
            }
        }
    }

    /// Returns (viewport, max_scroll, first visible line).
    pub fn compute_chat_layout(&self, inner_height: u16) -> (usize, usize, usize) {
        let viewport = inner_height as usize;
        let max_scroll = self.chat_total_lines.saturating_sub(viewport);
        let from_bottom = if self.stick_to_bottom {
            0
        } else {
            (self.chat_scroll as usize).min(max_scroll)
        };
        (viewport, max_scroll, max_scroll - from_bottom)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        self.stick_to_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        if self.chat_scroll == 0 {
            self.stick_to_bottom = true;
        }
    }

    pub fn reset_chat_view(&mut self) {
        self.chat_wrap_width = 0;
        self.chat_cache.clear();
        self.chat_total_lines = 0;
        self.chat_scroll = 0;
        self.stick_to_bottom = true;
    }

    fn wrap_message(m: &Message, width: u16) -> WrappedMsg {
        let prefix = match m.role {
            Role::User => PREFIX_USER,
            Role::Assistant => PREFIX_ASSISTANT,
            Role::Notice => PREFIX_NOTICE,
        };
        let body = if m.role == Role::Assistant && m.content.is_empty() {
            THINKING
        } else {
            m.content.as_str()
        };
        let full = format!("{}{}", prefix, body);
        let indent = " ".repeat(UnicodeWidthStr::width(prefix));
        let opts = Options::new(width as usize).subsequent_indent(&indent);
        let lines = wrap(&full, opts)
            .into_iter()
            .map(|c| c.into_owned())
            .collect::<Vec<_>>();
        WrappedMsg {
            role: m.role,
            content_len: m.content.len(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::test_app;
    use crate::app::Message;

    #[test]
    fn wraps_with_hanging_indent_and_tracks_totals() {
        let (mut app, _rt) = test_app();
        app.messages = vec![
            Message::user("what should I learn after the basics of javascript"),
            Message::assistant(""),
        ];
        app.ensure_chat_wrapped(20);
        let first = &app.chat_cache[0].lines;
        assert!(first.len() > 1);
        assert!(first[0].starts_with("| "));
        assert!(first[1].starts_with("  "));
        assert_eq!(app.chat_cache[1].lines, vec!["> Thinking...".to_string()]);

        let before = app.chat_total_lines;
        app.messages[1].content = "Learn the DOM, then async, then a framework.".into();
        app.ensure_chat_wrapped(20);
        assert!(app.chat_total_lines > before);
    }

    #[test]
    fn layout_clamps_scroll() {
        let (mut app, _rt) = test_app();
        app.messages = (0..30).map(|i| Message::user(format!("m{}", i))).collect();
        app.ensure_chat_wrapped(40);
        assert_eq!(app.compute_chat_layout(10), (10, 20, 20));
        app.scroll_up(5);
        assert_eq!(app.compute_chat_layout(10), (10, 20, 15));
        app.scroll_up(u16::MAX);
        assert_eq!(app.compute_chat_layout(10).2, 0);
        app.chat_scroll = 3;
        app.scroll_down(3);
        assert!(app.stick_to_bottom);
    }
}
