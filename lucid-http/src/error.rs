use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("could not build request: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("undecodable response ({0}): {1}")]
    Decode(String, String),
    #[error("{status} from upstream: {message} (request id {request_id})")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Classify a reqwest failure. Timeouts keep the budget that expired.
    pub(crate) fn transport(err: reqwest::Error, budget: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(budget)
        } else {
            Self::Network(err.to_string())
        }
    }

    /// True for failures worth another attempt.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Best human-readable message in an error body.
///
/// Understands `{"error":{"message":..}}` plus flat `message`, `detail` and
/// `error` strings; anything else is returned as a trimmed snippet.
pub(crate) fn upstream_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope {
        Nested { error: Nested },
        Flat {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            detail: Option<String>,
            #[serde(default)]
            error: Option<String>,
        },
    }
    #[derive(Deserialize)]
    struct Nested {
        message: String,
    }

    match serde_json::from_slice::<Envelope>(body) {
        Ok(Envelope::Nested { error }) => error.message,
        Ok(Envelope::Flat {
            message,
            detail,
            error,
        }) => [message, detail, error]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty())
            .unwrap_or_else(|| snippet(body)),
        Err(_) => snippet(body),
    }
}

pub(crate) const SNIPPET_BYTES: usize = 500;

/// Lossy UTF-8 view of `body`, cut on a char boundary.
pub(crate) fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_BYTES {
        return text.into_owned();
    }
    let cut = (0..=SNIPPET_BYTES)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &text[..cut])
}
