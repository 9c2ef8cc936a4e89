use crate::HttpError;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderValue};
use std::borrow::Cow;
use std::time::Duration;

/// Credentials attached to a request. Only the kind is ever logged.
#[derive(Clone, Debug, Default)]
pub enum Auth<'a> {
    Bearer(&'a str),
    #[default]
    None,
}

impl Auth<'_> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::None => "none",
        }
    }

    pub(crate) fn apply(&self, rb: RequestBuilder) -> Result<RequestBuilder, HttpError> {
        match self {
            Auth::Bearer(raw) => Ok(rb.bearer_auth(clean_token(raw)?)),
            Auth::None => Ok(rb),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the client's defaults.
///
/// ```
/// use lucid_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Bearer("sk-demo")),
///     ..Default::default()
/// };
/// assert_eq!(opts.retries, None);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// Treat an absolute `path` as the full URL instead of joining it to the base.
    pub allow_absolute: bool,
}

impl<'a> RequestOpts<'a> {
    pub(crate) fn auth(&self) -> &Auth<'a> {
        self.auth.as_ref().unwrap_or(&Auth::None)
    }

    pub(crate) fn decorate(&self, mut rb: RequestBuilder) -> Result<RequestBuilder, HttpError> {
        if let Some(query) = &self.query {
            let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        if let Some(headers) = &self.headers {
            rb = rb.headers(headers.clone());
        }
        self.auth().apply(rb)
    }

    /// Query pairs as they may appear in logs.
    pub(crate) fn loggable_query(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .flatten()
            .map(|(k, v)| {
                if looks_secret(k) {
                    (*k, "<redacted>")
                } else {
                    (*k, v.as_ref())
                }
            })
            .collect()
    }
}

fn looks_secret(key: &str) -> bool {
    const MARKERS: [&str; 4] = ["key", "token", "secret", "auth"];
    let key = key.to_ascii_lowercase();
    MARKERS.iter().any(|m| key.contains(m))
}

/// Strip quoting and stray whitespace from a pasted API key and make sure the
/// result is a legal header value.
fn clean_token(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(['"', '\''])
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if !token.is_ascii() || token.bytes().any(|b| b.is_ascii_control()) {
        return Err(HttpError::Build("API key must be printable ASCII".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("bad Authorization header: {e}")))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_unquoted_and_compacted() {
        assert_eq!(clean_token(" \"sk-ab c\n\" ").unwrap(), "sk-abc");
        assert!(clean_token("sk-ключ").is_err());
    }

    #[test]
    fn secret_query_values_are_hidden() {
        let opts = RequestOpts {
            query: Some(vec![
                ("url", Cow::Borrowed("https://example.com")),
                ("api_key", Cow::Borrowed("hunter2")),
            ]),
            ..Default::default()
        };
        assert_eq!(
            opts.loggable_query(),
            vec![("url", "https://example.com"), ("api_key", "<redacted>")]
        );
    }
}
