use directories::BaseDirs;
use lyft_core::CompletionOptions;
use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TogetherFileConfig {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_ms: Option<u64>,
    pub deadline_ms: Option<u64>,
    pub serialize_rotation: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct TogetherConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub defaults: CompletionOptions,
    /// Bounds each attempt.
    pub timeout: Duration,
    /// Bounds the whole rotation loop when set.
    pub deadline: Option<Duration>,
    pub serialize_rotation: bool,
    pub proxy: Option<String>,
}

impl TogetherConfig {
    pub fn new<I, S>(api_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_keys: api_keys.into_iter().map(Into::into).collect(),
            base_url: DEFAULT_BASE_URL.to_string(),
            defaults: CompletionOptions::default(),
            timeout: Duration::from_millis(30_000),
            deadline: None,
            serialize_rotation: false,
            proxy: None,
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let file_cfg = Self::config_path()
            .filter(|p| p.exists())
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TogetherFileConfig>(&text) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        warn!(target: "providers::together", "ignoring malformed {}: {}", path.display(), e);
                        None
                    }
                },
                Err(e) => {
                    warn!(target: "providers::together", "cannot read {}: {}", path.display(), e);
                    None
                }
            });
        Self::from_sources(|k| env::var(k).ok(), file_cfg.unwrap_or_default())
    }

    /// Resolves configuration from an environment lookup and a parsed file.
    pub fn from_sources<F>(lookup: F, file_cfg: TogetherFileConfig) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_keys = Self::keys_from(&lookup);
        if api_keys.is_empty() {
            anyhow::bail!("no Together API keys configured (set TOGETHER_API_KEYS or TOGETHER_API_KEY_1..)");
        }
        let base_url = lookup("TOGETHER_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid TOGETHER_BASE_URL '{}': {}", base_url, e))?;

        let mut defaults = CompletionOptions::default();
        if let Some(m) = file_cfg.model {
            defaults.model = m;
        }
        if let Some(n) = file_cfg.max_tokens {
            defaults.max_tokens = n;
        }
        if let Some(t) = file_cfg.temperature {
            defaults.temperature = t;
        }
        defaults
            .validate()
            .map_err(|e| anyhow::anyhow!("config.toml: {}", e))?;

        let proxy = lookup("HTTPS_PROXY").or_else(|| lookup("HTTP_PROXY"));

        Ok(TogetherConfig {
            api_keys,
            base_url,
            defaults,
            timeout: Duration::from_millis(file_cfg.timeout_ms.unwrap_or(30_000)),
            deadline: file_cfg.deadline_ms.map(Duration::from_millis),
            serialize_rotation: file_cfg.serialize_rotation.unwrap_or(false),
            proxy,
        })
    }

    fn keys_from<F>(lookup: &F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("TOGETHER_API_KEYS") {
            return list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        let mut keys = Vec::new();
        for i in 1.. {
            match lookup(&format!("TOGETHER_API_KEY_{}", i)) {
                Some(k) if !k.trim().is_empty() => keys.push(k.trim().to_string()),
                Some(_) => continue,
                None => break,
            }
        }
        keys
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".codelyft").join("config.toml")
        } else {
            base.config_dir().join("codelyft").join("config.toml")
        };
        Some(p)
    }
}
