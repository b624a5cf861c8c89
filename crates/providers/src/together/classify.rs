//! Decides whether a failed attempt moves on to the next credential.

use reqwest::StatusCode;
use serde::Deserialize;

const ROTATABLE_STATUS: [StatusCode; 5] = [
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::TOO_MANY_REQUESTS,
];

const ROTATABLE_PHRASES: [&str; 3] = ["rate limit", "insufficient", "balance"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// Tied to the credential or a transient quota; try the next key.
    Rotatable,
    /// Surface to the caller as is.
    Terminal,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProviderErrorBody {
    pub error: ProviderErrorDetail,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProviderErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// The provider's own `{"error":{"message":..}}` field, if the body has one.
/// Only this field carries a rotation signal.
pub fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

/// Best-effort display message out of a failure body: the structured
/// message, a bare `{"message":..}`, `{"error":".."}`, or the raw text.
pub fn error_message(body: &str) -> String {
    if let Some(m) = provider_message(body) {
        return m;
    }
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(m) = v["message"].as_str() {
            return m.to_string();
        }
        if let Some(m) = v["error"].as_str() {
            return m.to_string();
        }
    }
    body.trim().to_string()
}

/// Classifies a non-success HTTP response. Phrases are matched
/// case-sensitively against the structured provider message only.
pub fn classify(status: StatusCode, provider_message: Option<&str>) -> FailureClass {
    if ROTATABLE_STATUS.contains(&status) {
        return FailureClass::Rotatable;
    }
    match provider_message {
        Some(m) if ROTATABLE_PHRASES.iter().any(|p| m.contains(p)) => FailureClass::Rotatable,
        _ => FailureClass::Terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_statuses_rotate() {
        for code in [400u16, 401, 403, 404, 429] {
            let s = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify(s, None), FailureClass::Rotatable, "{}", code);
        }
    }

    #[test]
    fn other_statuses_are_terminal_without_a_signal() {
        for code in [402u16, 408, 422, 500, 502, 503] {
            let s = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify(s, Some("upstream error")), FailureClass::Terminal, "{}", code);
            assert_eq!(classify(s, None), FailureClass::Terminal, "{}", code);
        }
    }

    #[test]
    fn quota_phrases_in_provider_message_rotate_regardless_of_status() {
        let s = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(classify(s, Some("rate limit reached for model")), FailureClass::Rotatable);
        assert_eq!(classify(s, Some("insufficient credits")), FailureClass::Rotatable);
        assert_eq!(
            classify(StatusCode::PAYMENT_REQUIRED, Some("Account balance is 0")),
            FailureClass::Rotatable
        );
    }

    #[test]
    fn phrases_match_case_sensitively() {
        let s = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(classify(s, Some("Rate limit backend crashed")), FailureClass::Terminal);
        assert_eq!(classify(s, Some("Insufficient storage")), FailureClass::Terminal);
    }

    #[test]
    fn plain_text_gateway_page_is_not_a_signal() {
        let body = "502 Bad Gateway: no healthy upstream behind load balancer";
        assert_eq!(provider_message(body), None);
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, provider_message(body).as_deref()),
            FailureClass::Terminal
        );
        assert_eq!(provider_message(r#"{"message":"rate limit"}"#), None);
        assert_eq!(
            provider_message(r#"{"error":{"message":"rate limit exceeded"}}"#).as_deref(),
            Some("rate limit exceeded")
        );
    }

    #[test]
    fn message_extraction_handles_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"invalid api key","type":"auth"}}"#),
            "invalid api key"
        );
        assert_eq!(error_message(r#"{"message":"slow down"}"#), "slow down");
        assert_eq!(error_message(r#"{"error":"nope"}"#), "nope");
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }
}
