use crate::together::classify::{self, FailureClass};
use crate::together::config::TogetherConfig;
use crate::together::credentials::{Credential, CredentialSet};
use lyft_core::llm::{
    ChatError, CompletionOptions, CompletionOverrides, CompletionResponse, Message, ModelClient,
    RequestFailure,
};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Chat-completion client that walks its credential list when a key is
/// rejected or out of quota.
pub struct TogetherClient {
    http: Client,
    endpoint: String,
    defaults: CompletionOptions,
    credentials: CredentialSet,
    deadline: Option<Duration>,
    rotation_lock: Option<Mutex<()>>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [Message],
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("{code} {message}", code = .status.as_u16())]
    Rotatable { status: StatusCode, message: String },
    #[error(transparent)]
    Terminal(RequestFailure),
}

impl TogetherClient {
    pub fn new(cfg: TogetherConfig) -> anyhow::Result<Self> {
        let credentials = CredentialSet::new(&cfg.api_keys)?;
        let endpoint = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let mut builder = Client::builder()
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        if let Some(p) = &cfg.proxy {
            builder = builder.proxy(reqwest::Proxy::all(p)?);
        }
        let http = builder.build()?;
        info!(target: "providers::together", "client ready endpoint={} keys={} model={}", endpoint, credentials.len(), cfg.defaults.model);
        Ok(Self {
            http,
            endpoint,
            defaults: cfg.defaults,
            credentials,
            deadline: cfg.deadline,
            rotation_lock: cfg.serialize_rotation.then(|| Mutex::new(())),
        })
    }

    pub fn defaults(&self) -> &CompletionOptions {
        &self.defaults
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Index of the credential the next attempt will use.
    pub fn cursor(&self) -> usize {
        self.credentials.cursor()
    }

    pub async fn complete(
        &self,
        conversation: &[Message],
        overrides: &CompletionOverrides,
    ) -> Result<CompletionResponse, ChatError> {
        if conversation.is_empty() {
            return Err(ChatError::InvalidArgument(
                "conversation must contain at least one message".into(),
            ));
        }
        let opts = self.defaults.merge(overrides);
        opts.validate()?;

        let _serial = match &self.rotation_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let body = ChatCompletionRequest {
            messages: conversation,
            model: &opts.model,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            top_p: opts.top_p,
            extra: &opts.extra,
        };
        let n = self.credentials.len();
        let deadline = self.deadline.map(|d| tokio::time::Instant::now() + d);
        let started = Instant::now();
        let mut attempts = 0usize;

        loop {
            let (idx, key) = self.credentials.current();
            attempts += 1;
            debug!(target: "providers::together", "attempt {}/{} with API key {} model={} messages={}", attempts, n, idx + 1, opts.model, conversation.len());

            let outcome = match deadline {
                Some(at) => match tokio::time::timeout_at(at, self.attempt(key, &body)).await {
                    Ok(r) => r,
                    Err(_) => {
                        error!(target: "providers::together", "deadline exceeded after {} attempt(s)", attempts);
                        return Err(ChatError::DeadlineExceeded { attempts });
                    }
                },
                None => self.attempt(key, &body).await,
            };

            match outcome {
                Ok(resp) => {
                    info!(target: "providers::together", "completion ok key={} attempts={} elapsed_ms={}", idx + 1, attempts, started.elapsed().as_millis());
                    return Ok(resp);
                }
                Err(AttemptError::Terminal(failure)) => {
                    error!(target: "providers::together", "Error with API key {}: {}", idx + 1, failure);
                    return Err(ChatError::Terminal(failure));
                }
                Err(e @ AttemptError::Rotatable { .. }) => {
                    warn!(target: "providers::together", "Error with API key {}: {}", idx + 1, e);
                    let next = self.credentials.advance();
                    warn!(target: "providers::together", "Rotated to API key {}", next + 1);
                    if attempts >= n {
                        error!(target: "providers::together", "all {} API keys exhausted", n);
                        return Err(ChatError::Exhausted { attempts });
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        key: &Credential,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<CompletionResponse, AttemptError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Terminal(map_reqwest_err(e)))?;
        let status = resp.status();
        if !status.is_success() {
            let text = match resp.text().await {
                Ok(t) => t,
                Err(e) => {
                    warn!(target: "providers::together", "failed to read {} error body: {}", status.as_u16(), e);
                    String::new()
                }
            };
            let signal = classify::provider_message(&text);
            let message = classify::error_message(&text);
            return Err(match classify::classify(status, signal.as_deref()) {
                FailureClass::Rotatable => AttemptError::Rotatable { status, message },
                FailureClass::Terminal => AttemptError::Terminal(RequestFailure::Status {
                    status: status.as_u16(),
                    message,
                }),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AttemptError::Terminal(map_reqwest_err(e)))?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AttemptError::Terminal(RequestFailure::Decode(e.to_string())))?;
        if parsed.choices.is_empty() {
            return Err(AttemptError::Terminal(RequestFailure::Protocol(
                "response contained no choices".into(),
            )));
        }
        Ok(parsed)
    }
}

#[allow(async_fn_in_trait)]
impl ModelClient for TogetherClient {
    async fn complete(
        &self,
        conversation: &[Message],
        overrides: &CompletionOverrides,
    ) -> Result<CompletionResponse, ChatError> {
        TogetherClient::complete(self, conversation, overrides).await
    }
}

fn map_reqwest_err(e: reqwest::Error) -> RequestFailure {
    if e.is_timeout() {
        RequestFailure::Timeout(e.to_string())
    } else if e.is_decode() {
        RequestFailure::Decode(e.to_string())
    } else if e.is_request() || e.is_connect() {
        RequestFailure::Network(e.to_string())
    } else {
        RequestFailure::Protocol(e.to_string())
    }
}
