use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Keys the request builder owns; passthrough options may not shadow them.
const RESERVED_KEYS: [&str; 5] = ["messages", "model", "max_tokens", "temperature", "top_p"];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl Message {
    pub fn system<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::System,
            content: s.into(),
        }
    }
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
}

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Fully resolved options for one completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    /// Provider options passed through to the request body untouched.
    pub extra: Map<String, Value>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: None,
            extra: Map::new(),
        }
    }
}

/// Per-call overrides. Anything left as `None` keeps the client's default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionOverrides {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub extra: Map<String, Value>,
}

impl CompletionOverrides {
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn with_extra<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl CompletionOptions {
    /// Layers `overrides` over `self` without touching either.
    pub fn merge(&self, overrides: &CompletionOverrides) -> CompletionOptions {
        let mut extra = self.extra.clone();
        for (k, v) in &overrides.extra {
            extra.insert(k.clone(), v.clone());
        }
        CompletionOptions {
            model: overrides
                .model
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_p: overrides.top_p.or(self.top_p),
            extra,
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::InvalidArgument("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ChatError::InvalidArgument(
                "max_tokens must be greater than zero".into(),
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::InvalidArgument(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if let Some(p) = self.top_p {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(ChatError::InvalidArgument(format!(
                    "top_p {} outside 0.0..=1.0",
                    p
                )));
            }
        }
        if let Some(k) = self.extra.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
            return Err(ChatError::InvalidArgument(format!(
                "passthrough option '{}' shadows a typed field",
                k
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Provider success payload, kept as received. Fields the model does not
/// name survive in `extra`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompletionResponse {
    /// The assistant reply, `choices[0].message`.
    pub fn first_message(&self) -> Option<&Message> {
        self.choices.first().map(|c| &c.message)
    }
}

/// Cause of a failure that is not recovered by switching credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    #[error("network: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("protocol: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("All API keys exhausted. Please try again later.")]
    Exhausted { attempts: usize },
    #[error("request failed: {0}")]
    Terminal(#[from] RequestFailure),
    #[error("deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded { attempts: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ChatError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ChatError::Exhausted { .. })
    }
}

#[allow(async_fn_in_trait)]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        conversation: &[Message],
        overrides: &CompletionOverrides,
    ) -> Result<CompletionResponse, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let d = CompletionOptions::default();
        assert_eq!(d.model, "deepseek-ai/DeepSeek-V3");
        assert_eq!(d.max_tokens, 1000);
        assert_eq!(d.temperature, 0.7);
        assert_eq!(d.top_p, None);
        assert!(d.extra.is_empty());
    }

    #[test]
    fn merge_overrides_only_supplied_fields() {
        let base = CompletionOptions::default();
        let merged = base.merge(&CompletionOverrides::default().temperature(0.2));
        assert_eq!(merged.temperature, 0.2);
        assert_eq!(merged.model, base.model);
        assert_eq!(merged.max_tokens, base.max_tokens);
        // defaults are untouched for the next call
        assert_eq!(base.temperature, 0.7);
    }

    #[test]
    fn merge_combines_passthrough_keys() {
        let mut base = CompletionOptions::default();
        base.extra.insert("stop".into(), json!(["\n\n"]));
        base.extra.insert("seed".into(), json!(1));
        let ov = CompletionOverrides::default().with_extra("seed", json!(42));
        let merged = base.merge(&ov);
        assert_eq!(merged.extra.get("seed"), Some(&json!(42)));
        assert_eq!(merged.extra.get("stop"), Some(&json!(["\n\n"])));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = CompletionOptions::default();
        assert!(base.validate().is_ok());
        for ov in [
            CompletionOverrides::default().model("  "),
            CompletionOverrides::default().max_tokens(0),
            CompletionOverrides::default().temperature(2.5),
            CompletionOverrides::default().temperature(f32::NAN),
            CompletionOverrides::default().with_extra("messages", json!([])),
        ] {
            let err = base.merge(&ov).validate().unwrap_err();
            assert!(matches!(err, ChatError::InvalidArgument(_)), "{:?}", ov);
        }
    }

    #[test]
    fn response_keeps_unknown_fields_and_reads_first_choice() {
        let raw = json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "hi" }, "finish_reason": "stop", "logprobs": null }
            ],
            "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 }
        });
        let resp: CompletionResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(resp.first_message(), Some(&Message::assistant("hi")));
        assert_eq!(resp.extra.get("object"), Some(&json!("chat.completion")));
        assert_eq!(resp.usage.as_ref().and_then(|u| u.total_tokens), Some(4));
        assert_eq!(serde_json::to_value(&resp).unwrap(), raw);
    }

    #[test]
    fn null_content_reads_as_empty() {
        let m: Message = serde_json::from_value(json!({"role": "assistant", "content": null})).unwrap();
        assert_eq!(m.content, "");
    }

    #[test]
    fn exhausted_message_is_user_facing() {
        let e = ChatError::Exhausted { attempts: 3 };
        assert_eq!(e.to_string(), "All API keys exhausted. Please try again later.");
        assert!(e.is_exhausted());
    }
}
