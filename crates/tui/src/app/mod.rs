use std::sync::{
    mpsc::{self, TryRecvError},
    Arc,
};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use lyft_core::assistant::{
    build_conversation, suggested_prompts, system_message, ContextUpdate, LearningContext,
    RoadmapRef,
};
use lyft_core::llm::{self, CompletionOverrides, CompletionResponse, DEFAULT_MODEL};
use providers::TogetherClient;
use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{info, warn};

use crate::strings::error_notice;
use commands::Command;
use editor::LineEditor;
use threads::{roadmap_thread_name, GENERAL_THREAD};

pub mod chat;
pub mod commands;
pub mod editor;
pub mod history;
pub mod threads;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    Notice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::User,
            content: s.into(),
        }
    }
    pub fn assistant<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::Assistant,
            content: s.into(),
        }
    }
    pub fn notice<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::Notice,
            content: s.into(),
        }
    }

    /// Notices stay local to the UI.
    pub fn to_llm(&self) -> Option<llm::Message> {
        match self.role {
            Role::User => Some(llm::Message::user(self.content.clone())),
            Role::Assistant => Some(llm::Message::assistant(self.content.clone())),
            Role::Notice => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
    Context,
}

pub struct RenameState {
    pub index: usize,
    pub editor: LineEditor,
}

#[derive(Clone)]
pub struct ConfirmState {
    pub action: ConfirmAction,
}

#[derive(Clone)]
pub enum ConfirmAction {
    DeleteThread(usize),
}

#[derive(Clone)]
pub struct WrappedMsg {
    pub role: Role,
    pub content_len: usize,
    pub lines: Vec<String>,
}

/// An in-flight completion. The task reports once over `rx`.
pub struct PendingReply {
    rx: mpsc::Receiver<Result<CompletionResponse, String>>,
    task: JoinHandle<()>,
    target_index: usize,
}

pub struct App {
    pub messages: Vec<Message>,
    pub editor: LineEditor,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
    pub threads: Vec<String>,
    pub current_thread: usize,
    pub should_quit: bool,
    pub chat_scroll: u16,
    tick: u64,
    pub show_sidebar: bool,
    pub show_help: bool,
    pub chat_area: Option<Rect>,
    pub sidebar_area: Option<Rect>,
    pub sidebar_scroll: u16,
    pub focus: Focus,
    pub rename: Option<RenameState>,
    pub confirm: Option<ConfirmState>,
    pub chat_wrap_width: u16,
    pub chat_cache: Vec<WrappedMsg>,
    pub chat_total_lines: usize,
    pub stick_to_bottom: bool,
    pub chat_viewport: u16,
    pub input_visible_lines: u16,
    pub input_max_lines: u16,
    pub dirty: bool,
    // Context pane
    pub show_context: bool,
    pub context_area: Option<Rect>,
    pub context_current: usize,
    pub context: LearningContext,
    // Per-session overrides layered over the client's configured defaults.
    pub overrides: CompletionOverrides,
    pub client: Option<Arc<TogetherClient>>,
    pub client_error: Option<String>,
    runtime: Handle,
    pending: Option<PendingReply>,
    suggestion_idx: usize,
    pub last_usage: Option<(u32, u32)>,
    persist_enabled: bool,
}

impl App {
    /// Bare app with no persisted state; nothing is written to disk.
    pub fn with_parts(
        client: Option<Arc<TogetherClient>>,
        client_error: Option<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            messages: Vec::new(),
            editor: LineEditor::default(),
            history: Vec::new(),
            history_index: None,
            threads: vec![GENERAL_THREAD.to_string()],
            current_thread: 0,
            should_quit: false,
            chat_scroll: 0,
            tick: 0,
            show_sidebar: true,
            show_help: false,
            chat_area: None,
            sidebar_area: None,
            sidebar_scroll: 0,
            focus: Focus::Input,
            rename: None,
            confirm: None,
            chat_wrap_width: 0,
            chat_cache: Vec::new(),
            chat_total_lines: 0,
            stick_to_bottom: true,
            chat_viewport: 0,
            input_visible_lines: 1,
            input_max_lines: 6,
            dirty: true,
            show_context: false,
            context_area: None,
            context_current: 0,
            context: LearningContext::default(),
            overrides: CompletionOverrides::default(),
            client,
            client_error,
            runtime,
            pending: None,
            suggestion_idx: 0,
            last_usage: None,
            persist_enabled: false,
        }
    }

    pub fn new(
        client: Option<Arc<TogetherClient>>,
        client_error: Option<String>,
        runtime: Handle,
    ) -> Self {
        let mut s = Self::with_parts(client, client_error, runtime);
        s.persist_enabled = true;
        match crate::persist::load_state() {
            Ok(Some(p)) => {
                if !p.threads.is_empty() {
                    s.threads = p.threads;
                }
                s.current_thread = p.current_thread.min(s.threads.len() - 1);
                s.show_sidebar = p.show_sidebar;
                s.show_context = p.show_context;
                s.sidebar_scroll = p.sidebar_scroll;
                s.context = p.context;
                s.overrides.model = p.model;
                s.overrides.temperature = p.temperature;
                s.overrides.max_tokens = p.max_tokens;
            }
            Ok(None) => {}
            Err(e) => warn!(target: "tui", "load ui state: {:#}", e),
        }
        s.load_current_thread_messages();
        s
    }

    pub fn save_state(&self) {
        if !self.persist_enabled {
            return;
        }
        if let Err(e) = crate::persist::save_state(self) {
            warn!(target: "tui", "save ui state: {:#}", e);
        }
    }

    fn save_thread(&self) {
        if !self.persist_enabled {
            return;
        }
        if let Err(e) = crate::persist::save_thread(self.current_thread_name(), &self.messages) {
            warn!(target: "tui", "save thread: {:#}", e);
        }
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.messages.push(Message::notice(text));
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Model the next request will use.
    pub fn model_label(&self) -> String {
        if let Some(m) = &self.overrides.model {
            return m.clone();
        }
        self.client
            .as_ref()
            .map(|c| c.defaults().model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// What the model will see for the current thread: the persona prompt
    /// with the learning context, then the visible user/assistant history.
    pub fn conversation(&self) -> Vec<llm::Message> {
        let history: Vec<llm::Message> = self.messages.iter().filter_map(Message::to_llm).collect();
        build_conversation(system_message(&self.persona(), &self.context), &history)
    }

    pub fn insert_text(&mut self, s: &str) {
        if let Some(r) = self.rename.as_mut() {
            r.editor.insert(&s.replace(['\r', '\n'], " "));
        } else if matches!(self.focus, Focus::Input) {
            self.editor.insert(&s.replace("\r\n", "\n"));
        }
        self.dirty = true;
    }

    pub fn submit(&mut self) {
        let text = self.editor.text().trim().to_string();
        if text.is_empty() {
            return;
        }
        if let Some(parsed) = commands::parse(&text) {
            self.record_history_entry(&text);
            self.editor.clear();
            match parsed {
                Ok(cmd) => self.run_command(cmd),
                Err(usage) => self.push_notice(usage),
            }
            return;
        }
        if self.pending.is_some() {
            self.push_notice("A reply is still pending (Ctrl+C cancels).");
            return;
        }
        self.record_history_entry(&text);
        self.editor.clear();
        self.messages.push(Message::user(text.clone()));
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;

        let Some(client) = self.client.clone() else {
            let reason = self
                .client_error
                .clone()
                .unwrap_or_else(|| "no API keys configured".to_string());
            self.push_notice(error_notice(&reason));
            self.save_thread();
            return;
        };

        let conversation = self.conversation();
        let overrides = self.overrides.clone();
        let target_index = self.messages.len();
        self.messages.push(Message::assistant(String::new()));
        info!(
            target: "tui",
            "submit: thread={} model={} messages={} input_len={}",
            self.current_thread_name(),
            self.model_label(),
            conversation.len(),
            text.len()
        );
        let (tx, rx) = mpsc::channel();
        let task = self.runtime.spawn(async move {
            let res = client
                .complete(&conversation, &overrides)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(res);
        });
        self.pending = Some(PendingReply {
            rx,
            task,
            target_index,
        });
        self.save_thread();
    }

    fn run_command(&mut self, cmd: Command) {
        match cmd {
            Command::Roadmap {
                title,
                description,
                custom,
            } => {
                if self.pending.is_some() {
                    self.push_notice("Wait for the current reply (Ctrl+C cancels) before switching roadmaps.");
                    return;
                }
                self.context.apply(ContextUpdate {
                    roadmap: Some(RoadmapRef {
                        title: title.clone(),
                        description,
                        is_custom: custom,
                    }),
                    ..Default::default()
                });
                self.open_thread(&roadmap_thread_name(&title));
                self.push_notice(format!("Roadmap set to '{}'.", title));
            }
            Command::Topic(topic) => {
                self.push_notice(format!("Topic set to '{}'.", topic));
                self.context.apply(ContextUpdate {
                    topic: Some(topic),
                    ..Default::default()
                });
            }
            Command::Video(video) => {
                self.push_notice(format!("Video set to '{}'.", video.title));
                self.context.apply(ContextUpdate {
                    video: Some(video),
                    ..Default::default()
                });
            }
            Command::Progress(progress) => {
                self.push_notice(format!(
                    "Progress set to {}/{} ({}%).",
                    progress.completed,
                    progress.total,
                    progress.percent()
                ));
                self.context.apply(ContextUpdate {
                    progress: Some(progress),
                    ..Default::default()
                });
            }
            Command::ContextClear => {
                self.context = LearningContext::default();
                self.context_current = 0;
                self.push_notice("Learning context cleared.");
            }
            Command::Clear => self.clear_conversation(),
            Command::Model(model) => {
                self.push_notice(format!("Model set to '{}'.", model));
                self.overrides.model = Some(model);
            }
            Command::Temperature(t) => {
                self.overrides.temperature = Some(t);
                self.push_notice(format!("Temperature set to {}.", t));
            }
            Command::MaxTokens(n) => {
                self.overrides.max_tokens = Some(n);
                self.push_notice(format!("Max tokens set to {}.", n));
            }
            Command::Suggest => self.insert_suggestion(),
            Command::Help => self.show_help = true,
        }
        self.save_state();
        self.dirty = true;
    }

    pub fn clear_conversation(&mut self) {
        if self.pending.is_some() {
            self.push_notice("Wait for the current reply (Ctrl+C cancels) before clearing.");
            return;
        }
        self.messages.clear();
        self.last_usage = None;
        self.reset_chat_view();
        self.save_thread();
        self.dirty = true;
    }

    /// Cycles through the suggested questions for the current context.
    pub fn insert_suggestion(&mut self) {
        let prompts = suggested_prompts(&self.context);
        if let Some(p) = prompts.get(self.suggestion_idx % prompts.len().max(1)) {
            self.editor.set_text(p.clone());
        }
        self.suggestion_idx = self.suggestion_idx.wrapping_add(1);
        self.focus = Focus::Input;
    }

    pub fn cancel_pending(&mut self) -> bool {
        let Some(p) = self.pending.take() else {
            return false;
        };
        p.task.abort();
        self.drop_placeholder(p.target_index);
        info!(target: "tui", "request canceled");
        self.push_notice("Request canceled.");
        self.save_thread();
        true
    }

    fn is_placeholder(&self, idx: usize) -> bool {
        self.messages
            .get(idx)
            .map(|m| m.role == Role::Assistant && m.content.is_empty())
            .unwrap_or(false)
    }

    fn drop_placeholder(&mut self, idx: usize) {
        if self.is_placeholder(idx) {
            self.messages.remove(idx);
        }
    }

    fn finish_reply(&mut self, target_index: usize, outcome: Result<CompletionResponse, String>) {
        match outcome {
            Ok(resp) => {
                if let Some(u) = &resp.usage {
                    self.last_usage = Some((
                        u.prompt_tokens.unwrap_or(0),
                        u.completion_tokens.unwrap_or(0),
                    ));
                }
                let content = resp
                    .first_message()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                if content.trim().is_empty() {
                    self.drop_placeholder(target_index);
                    self.push_notice(error_notice("the assistant returned an empty reply"));
                } else if self.is_placeholder(target_index) {
                    self.messages[target_index].content = content;
                } else {
                    self.messages.push(Message::assistant(content));
                }
            }
            Err(e) => {
                warn!(target: "tui", "completion failed: {}", e);
                self.drop_placeholder(target_index);
                self.push_notice(error_notice(&e));
            }
        }
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;
        self.save_thread();
    }

    fn clear_selected_context(&mut self) {
        let entries = self.context.entries();
        if let Some((field, _)) = entries.get(self.context_current) {
            self.context.clear(*field);
            let left = entries.len() - 1;
            self.context_current = self.context_current.min(left.saturating_sub(1));
            self.save_state();
        }
    }

    fn cycle_focus(&mut self) {
        let mut order = vec![Focus::Input];
        if self.show_sidebar {
            order.push(Focus::Sidebar);
        }
        if self.show_context {
            order.push(Focus::Context);
        }
        self.focus = match order.iter().position(|f| *f == self.focus) {
            Some(pos) => order[(pos + 1) % order.len()],
            None => Focus::Input,
        };
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        if let Some(state) = &mut self.rename {
            match key.code {
                KeyCode::Esc => self.rename = None,
                KeyCode::Enter => self.commit_rename(),
                _ => {
                    apply_edit_key(&mut state.editor, &key);
                }
            }
            return;
        }

        if let Some(confirm) = self.confirm.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm = None;
                    match confirm.action {
                        ConfirmAction::DeleteThread(idx) => self.delete_thread(idx),
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.confirm = None,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('c') if ctrl => {
                if !self.cancel_pending() {
                    self.should_quit = true;
                }
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('?') if !matches!(self.focus, Focus::Input) => self.show_help = true,
            KeyCode::F(2) => {
                self.show_sidebar = !self.show_sidebar;
                if !self.show_sidebar && self.focus == Focus::Sidebar {
                    self.focus = Focus::Input;
                }
                self.save_state();
            }
            KeyCode::F(6) => {
                self.show_context = !self.show_context;
                if !self.show_context && self.focus == Focus::Context {
                    self.focus = Focus::Input;
                }
                self.save_state();
            }
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Char('l') if ctrl => self.clear_conversation(),
            KeyCode::Char('g') if ctrl => self.insert_suggestion(),
            KeyCode::Home if ctrl => {
                self.chat_scroll = u16::MAX;
                self.stick_to_bottom = false;
            }
            KeyCode::End if ctrl => {
                self.chat_scroll = 0;
                self.stick_to_bottom = true;
            }
            KeyCode::Up if ctrl => self.scroll_up(1),
            KeyCode::Down if ctrl => self.scroll_down(1),
            KeyCode::PageUp if matches!(self.focus, Focus::Sidebar) => {
                for _ in 0..self.sidebar_inner_height().max(1) {
                    self.sidebar_select_up();
                }
            }
            KeyCode::PageDown if matches!(self.focus, Focus::Sidebar) => {
                for _ in 0..self.sidebar_inner_height().max(1) {
                    self.sidebar_select_down();
                }
            }
            KeyCode::PageUp => self.scroll_up(self.chat_viewport.max(1)),
            KeyCode::PageDown => self.scroll_down(self.chat_viewport.max(1)),
            _ => match self.focus {
                Focus::Input => self.on_input_key(&key),
                Focus::Sidebar => self.on_sidebar_key(&key),
                Focus::Context => self.on_context_key(&key),
            },
        }
    }

    fn on_input_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.editor.insert("\n");
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Up if key.modifiers.is_empty() => self.history_prev(),
            KeyCode::Down if key.modifiers.is_empty() => self.history_next(),
            _ => {
                apply_edit_key(&mut self.editor, key);
            }
        }
    }

    fn on_sidebar_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Up => self.sidebar_select_up(),
            KeyCode::Down => self.sidebar_select_down(),
            KeyCode::Home => {
                self.select_thread(0);
            }
            KeyCode::End => {
                self.select_thread(self.threads.len() - 1);
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.sidebar_new_thread(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.sidebar_rename_current(),
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                self.sidebar_delete_current()
            }
            _ => {}
        }
    }

    fn on_context_key(&mut self, key: &KeyEvent) {
        let count = self.context.entries().len();
        match key.code {
            KeyCode::Up => self.context_current = self.context_current.saturating_sub(1),
            KeyCode::Down if self.context_current + 1 < count => self.context_current += 1,
            KeyCode::Delete | KeyCode::Backspace => self.clear_selected_context(),
            _ => {}
        }
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let outcome = match self.pending.as_ref().map(|p| p.rx.try_recv()) {
            None | Some(Err(TryRecvError::Empty)) => return,
            Some(Ok(res)) => res,
            Some(Err(TryRecvError::Disconnected)) => {
                Err("the request ended without a reply".to_string())
            }
        };
        if let Some(p) = self.pending.take() {
            self.finish_reply(p.target_index, outcome);
        }
    }
}

// Editing keys shared by the message input and the rename prompt.
fn apply_edit_key(editor: &mut LineEditor, key: &KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left if ctrl => editor.word_left(),
        KeyCode::Right if ctrl => editor.word_right(),
        KeyCode::Left => editor.left(),
        KeyCode::Right => editor.right(),
        KeyCode::Home => editor.home(),
        KeyCode::End => editor.end(),
        KeyCode::Char('w') if ctrl => editor.delete_word_left(),
        KeyCode::Char('u') if ctrl => editor.kill_to_line_start(),
        KeyCode::Char('k') if ctrl => editor.kill_to_line_end(),
        KeyCode::Char('a') if ctrl => editor.home(),
        KeyCode::Char('e') if ctrl => editor.end(),
        KeyCode::Char(ch) if !ctrl => {
            let mut buf = [0u8; 4];
            editor.insert(ch.encode_utf8(&mut buf));
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lyft_core::llm::{Choice, Usage};
    use lyft_core::Role as LlmRole;
    use pretty_assertions::assert_eq;

    pub(crate) fn test_app() -> (App, tokio::runtime::Runtime) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let app = App::with_parts(None, Some("no API keys configured".into()), rt.handle().clone());
        (app, rt)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, s: &str) {
        for ch in s.chars() {
            app.on_key(key(KeyCode::Char(ch)));
        }
    }

    fn reply(text: &str) -> CompletionResponse {
        CompletionResponse {
            choices: vec![Choice {
                index: 0,
                message: llm::Message::assistant(text),
                finish_reason: Some("stop".into()),
                extra: Default::default(),
            }],
            usage: Some(Usage {
                prompt_tokens: Some(12),
                completion_tokens: Some(3),
                total_tokens: Some(15),
            }),
            ..Default::default()
        }
    }

    // Installs a pending reply whose result is already waiting on the channel.
    fn stage_reply(app: &mut App, rt: &tokio::runtime::Runtime, res: Result<CompletionResponse, String>) {
        let target_index = app.messages.len();
        app.messages.push(Message::assistant(""));
        let (tx, rx) = mpsc::channel();
        tx.send(res).expect("send");
        let task = rt.spawn(async {});
        app.pending = Some(PendingReply {
            rx,
            task,
            target_index,
        });
    }

    #[test]
    fn roadmap_command_sets_context_and_switches_thread() {
        let (mut app, _rt) = test_app();
        type_text(&mut app, "/roadmap Full Stack | MERN");
        app.on_key(key(KeyCode::Enter));

        assert_eq!(app.current_thread_name(), "roadmap-full-stack");
        assert_eq!(app.threads, vec!["general", "roadmap-full-stack"]);
        let roadmap = app.context.roadmap.clone().expect("roadmap");
        assert_eq!(roadmap.title, "Full Stack");
        assert_eq!(roadmap.description.as_deref(), Some("MERN"));
        assert!(app.editor.is_empty());
        assert_eq!(app.messages.last().map(|m| m.role), Some(Role::Notice));
    }

    #[test]
    fn conversation_carries_context_and_skips_notices() {
        let (mut app, _rt) = test_app();
        app.context.topic = Some("Closures".into());
        app.messages = vec![
            Message::user("what is a closure?"),
            Message::notice("Topic set to 'Closures'."),
            Message::assistant("A function that captures its environment."),
            Message::assistant(""),
        ];
        let convo = app.conversation();
        assert_eq!(convo.len(), 3);
        assert_eq!(convo[0].role, LlmRole::System);
        assert!(convo[0].content.contains("Current topic: \"Closures\""));
        assert_eq!(convo[1].content, "what is a closure?");
        assert_eq!(convo[2].role, LlmRole::Assistant);
    }

    #[test]
    fn submit_without_client_reports_error() {
        let (mut app, _rt) = test_app();
        app.editor.set_text("hello");
        app.submit();
        assert_eq!(
            app.messages,
            vec![
                Message::user("hello"),
                Message::notice("Error: no API keys configured"),
            ]
        );
        assert!(!app.is_waiting());
        assert_eq!(app.history, vec!["hello"]);
    }

    #[test]
    fn tick_fills_placeholder_and_records_usage() {
        let (mut app, rt) = test_app();
        app.messages.push(Message::user("hi"));
        stage_reply(&mut app, &rt, Ok(reply("Hello! What are you learning?")));
        assert!(app.is_waiting());

        app.on_tick();
        assert!(!app.is_waiting());
        assert_eq!(
            app.messages.last(),
            Some(&Message::assistant("Hello! What are you learning?"))
        );
        assert_eq!(app.last_usage, Some((12, 3)));
    }

    #[test]
    fn tick_turns_failure_into_notice() {
        let (mut app, rt) = test_app();
        app.messages.push(Message::user("hi"));
        stage_reply(
            &mut app,
            &rt,
            Err("All API keys exhausted. Please try again later.".into()),
        );
        app.on_tick();
        assert_eq!(
            app.messages,
            vec![
                Message::user("hi"),
                Message::notice("Error: All API keys exhausted. Please try again later."),
            ]
        );
    }

    #[test]
    fn ctrl_c_cancels_then_quits() {
        let (mut app, rt) = test_app();
        app.messages.push(Message::user("hi"));
        stage_reply(&mut app, &rt, Ok(reply("late")));

        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.is_waiting());
        assert!(!app.should_quit);
        assert_eq!(app.messages.last(), Some(&Message::notice("Request canceled.")));

        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn pending_reply_blocks_thread_switch_and_second_submit() {
        let (mut app, rt) = test_app();
        app.threads.push("chat-2".into());
        stage_reply(&mut app, &rt, Ok(reply("x")));
        assert!(!app.select_thread(1));
        assert_eq!(app.current_thread, 0);

        app.editor.set_text("another question");
        app.submit();
        assert_eq!(app.editor.text(), "another question");
    }

    #[test]
    fn roadmap_command_is_refused_while_reply_pending() {
        let (mut app, rt) = test_app();
        stage_reply(&mut app, &rt, Ok(reply("x")));
        let before = app.messages.len();
        type_text(&mut app, "/roadmap Go");
        app.on_key(key(KeyCode::Enter));

        assert_eq!(app.context.roadmap, None);
        assert_eq!(app.current_thread_name(), "general");
        assert_eq!(app.threads, vec!["general"]);
        assert_eq!(app.messages.len(), before + 1);
        let last = app.messages.last().expect("notice");
        assert_eq!(last.role, Role::Notice);
        assert!(last.content.contains("switching roadmaps"));
    }

    #[test]
    fn overrides_and_context_commands() {
        let (mut app, _rt) = test_app();
        for cmd in ["/model meta-llama/Llama-3-8b", "/temp 0.3", "/max 256", "/progress 3/4"] {
            app.editor.set_text(cmd);
            app.submit();
        }
        assert_eq!(app.model_label(), "meta-llama/Llama-3-8b");
        assert_eq!(app.overrides.temperature, Some(0.3));
        assert_eq!(app.overrides.max_tokens, Some(256));
        assert_eq!(app.context.entries().len(), 1);

        app.focus = Focus::Context;
        app.on_key(key(KeyCode::Delete));
        assert!(app.context.is_empty());
    }

    #[test]
    fn suggestions_cycle_through_prompts() {
        let (mut app, _rt) = test_app();
        app.insert_suggestion();
        assert_eq!(app.editor.text(), "How can I help with your learning?");

        app.context.video = Some(lyft_core::assistant::VideoRef {
            title: "Rust Ownership".into(),
            ..Default::default()
        });
        app.suggestion_idx = 0;
        app.insert_suggestion();
        assert_eq!(
            app.editor.text(),
            "How does Rust Ownership fit into the bigger picture?"
        );
        app.insert_suggestion();
        assert_eq!(app.editor.text(), "What should I learn next after Rust Ownership?");
    }
}
