// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

pub const PREFIX_USER: &str = "| ";
pub const PREFIX_ASSISTANT: &str = "> ";
// Local notices (command feedback, errors); never sent to the model.
pub const PREFIX_NOTICE: &str = "! ";

pub const THINKING: &str = "Thinking...";
pub const EMPTY_CHAT: &str = "How can I help with your learning journey today?";
pub const INPUT_HINT: &str = "Ask CodeLyft Assistant, Enter to send / Shift+Enter for newline / /help for commands";

pub const TITLE_THREADS: &str = " Threads ";
pub const TITLE_CHAT: &str = " CodeLyft Assistant ";
pub const TITLE_INPUT: &str = " Message ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_RENAME: &str = " Rename Thread ";
pub const TITLE_CONFIRM: &str = " Confirm ";
pub const TITLE_CONTEXT: &str = " Learning Context ";

pub const NO_CONTEXT: &str = "(none: try /roadmap, /topic, /video)";

pub fn confirm_delete_thread_message(name: &str) -> String {
    format!(
        "Delete thread \"{}\" and its history? Press Y to confirm, N/Esc to cancel.",
        name
    )
}

pub fn error_notice(e: &str) -> String {
    format!("Error: {}", e)
}

pub fn build_stick_label(scroll: u16, stick: bool) -> String {
    if stick || scroll == 0 {
        "Bottom".to_string()
    } else {
        format!("+{} lines", scroll)
    }
}

pub struct StatusInfo<'a> {
    pub stick: &'a str,
    pub focus: &'a str,
    pub line: u16,
    pub col: u16,
    pub thread: &'a str,
    pub model: &'a str,
    pub keys: Option<usize>,
    pub context_len: usize,
    pub waiting: bool,
    pub usage: Option<(u32, u32)>,
}

// Build the status bar line with width-aware compaction: segments are
// appended in priority order until the next one no longer fits.
pub fn build_status_line(info: &StatusInfo<'_>, max_width: u16) -> String {
    let mut segments: Vec<String> = Vec::new();
    let keys = match info.keys {
        Some(n) => format!("{} keys", n),
        None => "offline".to_string(),
    };
    segments.push(format!("[{}][{}][{}]", info.thread, info.model, keys));
    if info.waiting {
        segments.push("waiting for reply (Ctrl+C cancels)".to_string());
    }
    segments.push(format!(
        "[{}][{}] L{} C{}",
        info.stick, info.focus, info.line, info.col
    ));
    segments.push(format!("Ctx:{}", info.context_len));
    if let Some((p, c)) = info.usage {
        segments.push(format!("Tok:{}/{}/{}", p, c, p.saturating_add(c)));
    }
    for h in [
        "Enter: send; Shift+Enter: newline",
        "PgUp/PgDn: scroll",
        "F2: threads; F6: context",
        "History: Up/Down",
        "F1: help",
    ] {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let sep_w = UnicodeWidthStr::width(sep);
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw + if i == 0 { 0 } else { sep_w };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(seg);
        used += addw;
    }
    out
}

pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Send    Shift+Enter: Newline    Esc: Quit    Ctrl+C: Cancel reply / Quit",
        "  Ctrl+L: Clear conversation    Ctrl+G: Insert a suggested question",
        "Input Editing",
        "  Arrow: Move cursor    Backspace/Delete: Delete prev/next char",
        "  Home/End, Ctrl+A/E: Line start/end    Ctrl+Arrow: Word move",
        "  Ctrl+W: Delete prev word    Ctrl+U/K: Kill to line start/end",
        "Chat Scrolling",
        "  Mouse wheel: Scroll    PgUp/PgDn: Page    Ctrl+Up/Down: Fine    Ctrl+Home/End: Top/bottom",
        "Threads & Context",
        "  F2: Show/hide threads    Tab: Cycle focus    Up/Down: Input history",
        "  Threads focus: N new / R rename / D or Delete remove",
        "  F6: Show/hide context    Context focus: Delete clears the selected entry",
        "Commands",
        "  /roadmap <title> [| description]   /custom <title>   /topic <text>",
        "  /video <title> [| url [| channel]]   /progress <done>/<total>   /context clear",
        "  /clear   /model <name>   /temp <0..2>   /max <tokens>   /suggest",
        "Help",
        "  F1 or ?: Open/close this panel",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info<'a>() -> StatusInfo<'a> {
        StatusInfo {
            stick: "Bottom",
            focus: "Input",
            line: 1,
            col: 1,
            thread: "general",
            model: "deepseek-ai/DeepSeek-V3",
            keys: Some(3),
            context_len: 2,
            waiting: false,
            usage: Some((10, 5)),
        }
    }

    #[test]
    fn status_line_drops_segments_that_do_not_fit() {
        let narrow = build_status_line(&info(), 40);
        assert_eq!(narrow, "[general][deepseek-ai/DeepSeek-V3][3 keys]");
        let wide = build_status_line(&info(), 400);
        assert!(wide.contains("Tok:10/5/15"));
        assert!(wide.ends_with("F1: help"));
    }

    #[test]
    fn status_line_flags_offline_and_waiting() {
        let mut i = info();
        i.keys = None;
        i.waiting = true;
        let line = build_status_line(&i, 400);
        assert!(line.starts_with("[general][deepseek-ai/DeepSeek-V3][offline]  |  waiting"));
    }

    #[test]
    fn stick_label() {
        assert_eq!(build_stick_label(0, false), "Bottom");
        assert_eq!(build_stick_label(7, true), "Bottom");
        assert_eq!(build_stick_label(7, false), "+7 lines");
    }
}
