use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::BaseDirs;
use lyft_core::assistant::LearningContext;
use serde::{Deserialize, Serialize};

use crate::app::{App, Message, Role};

const APP_DIR: &str = "codelyft";

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct SavedState {
    pub threads: Vec<String>,
    pub current_thread: usize,
    pub show_sidebar: bool,
    #[serde(default)]
    pub show_context: bool,
    pub sidebar_scroll: u16,
    #[serde(default)]
    pub context: LearningContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl From<&App> for SavedState {
    fn from(a: &App) -> Self {
        SavedState {
            threads: a.threads.clone(),
            current_thread: a.current_thread,
            show_sidebar: a.show_sidebar,
            show_context: a.show_context,
            sidebar_scroll: a.sidebar_scroll,
            context: a.context.clone(),
            model: a.overrides.model.clone(),
            temperature: a.overrides.temperature,
            max_tokens: a.overrides.max_tokens,
        }
    }
}

pub fn state_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.config_dir().join(APP_DIR).join("ui_state.json"))
}

pub fn load_state() -> Result<Option<SavedState>> {
    let Some(path) = state_path() else {
        return Ok(None);
    };
    read_state(&path)
}

fn read_state(path: &Path) -> Result<Option<SavedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).with_context(|| format!("read state file: {}", path.display()))?;
    let s: SavedState = serde_json::from_slice(&data).with_context(|| "parse state json")?;
    Ok(Some(s))
}

pub fn save_state(app: &App) -> Result<()> {
    let Some(path) = state_path() else {
        return Ok(());
    };
    let s: SavedState = app.into();
    write_state(&path, &s)
}

fn write_state(path: &Path, s: &SavedState) -> Result<()> {
    let data = serde_json::to_vec_pretty(s)?;
    write_atomic(path, &data)
}

// Write to a sibling tmp file then rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let mut tmp = path.to_path_buf();
    let ext = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp.set_extension(ext);
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create tmp: {}", tmp.display()))?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("persist to {}", path.display()))?;
    Ok(())
}

fn thread_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join(APP_DIR).join("threads"))
}

fn sanitize(name: &str) -> String {
    let s = name
        .trim()
        .replace(['<', '>', ':', '"', '/', '\\', '|', '?', '*'], "_");
    if s.is_empty() {
        "general".to_string()
    } else {
        s
    }
}

fn thread_path_in(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.jsonl", sanitize(name)))
}

pub fn load_thread(name: &str) -> Result<Vec<Message>> {
    let Some(dir) = thread_dir() else {
        return Ok(Vec::new());
    };
    read_thread(&thread_path_in(&dir, name))
}

// Unparseable lines are skipped so one bad record does not hide the thread.
fn read_thread(path: &Path) -> Result<Vec<Message>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("read thread file: {}", path.display()))?;
    let mut out = Vec::new();
    for (n, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Message>(line) {
            Ok(m) => out.push(m),
            Err(e) => {
                tracing::debug!(target: "tui", "skip line {} of {}: {}", n + 1, path.display(), e)
            }
        }
    }
    Ok(out)
}

pub fn save_thread(name: &str, msgs: &[Message]) -> Result<()> {
    let Some(dir) = thread_dir() else {
        return Ok(());
    };
    write_thread(&thread_path_in(&dir, name), msgs)
}

// Only the user/assistant exchange is kept; notices and pending
// placeholders are dropped.
fn write_thread(path: &Path, msgs: &[Message]) -> Result<()> {
    let mut data = Vec::new();
    for m in msgs {
        let keep = match m.role {
            Role::User => true,
            Role::Assistant => !m.content.is_empty(),
            Role::Notice => false,
        };
        if !keep {
            continue;
        }
        serde_json::to_writer(&mut data, m)?;
        data.push(b'\n');
    }
    write_atomic(path, &data)
}

pub fn rename_thread(old: &str, new: &str) -> Result<()> {
    let Some(dir) = thread_dir() else {
        return Ok(());
    };
    let old_path = thread_path_in(&dir, old);
    let new_path = thread_path_in(&dir, new);
    if !old_path.exists() {
        return Ok(());
    }
    fs::rename(&old_path, &new_path)
        .or_else(|_| fs::copy(&old_path, &new_path).and_then(|_| fs::remove_file(&old_path)))
        .with_context(|| format!("move {} to {}", old_path.display(), new_path.display()))
}

pub fn delete_thread(name: &str) -> Result<()> {
    let Some(dir) = thread_dir() else {
        return Ok(());
    };
    let path = thread_path_in(&dir, name);
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}
