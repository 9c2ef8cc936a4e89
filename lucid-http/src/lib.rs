//! Outbound HTTP for lucid.
//!
//! Two kinds of call live here:
//!
//! - JSON calls ([`HttpClient::get_json`], [`HttpClient::post_json_opts`])
//!   that treat non-2xx as [`HttpError::Api`] and retry 429/5xx, honouring
//!   `Retry-After`.
//! - Page fetches ([`HttpClient::fetch_page`]) that hand back any status with
//!   its body, because a 403 challenge page is an answer the caller wants to
//!   classify.
//!
//! Secrets never reach the logs: bearer tokens are reduced to their kind and
//! query values under key-like names are masked.
//!
//! ```no_run
//! # async fn demo() -> Result<(), lucid_http::HttpError> {
//! let client = lucid_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", lucid_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

mod error;
mod request;

pub use error::HttpError;
pub use request::{Auth, RequestOpts};

use error::{snippet, upstream_message};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const BASE_DELAY: Duration = Duration::from_millis(200);
/// Floor applied to 429 retries that carry no `Retry-After`.
const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

/// A fetched document, whatever its status.
#[derive(Clone, Debug)]
pub struct PageResponse {
    pub status: StatusCode,
    /// URL after redirects.
    pub final_url: Url,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Client whose relative paths resolve against `base`.
    ///
    /// ```no_run
    /// let client = lucid_http::HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), lucid_http::HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Ok(Self {
            base: Some(base),
            ..Self::unanchored()?
        })
    }

    /// Client without a base; every call passes an absolute URL.
    pub fn unanchored() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base: None,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(self, default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            ..self
        }
    }

    pub fn with_retries(self, max_retries: usize) -> Self {
        Self {
            max_retries,
            ..self
        }
    }

    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.json_call::<(), T>(Method::GET, path, None, opts).await
    }

    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_call(Method::POST, path, Some(body), opts).await
    }

    /// GET a document. Only transport failures are errors; they are retried
    /// `opts.retries` times (none by default).
    pub async fn fetch_page(
        &self,
        url: &str,
        opts: RequestOpts<'_>,
    ) -> Result<PageResponse, HttpError> {
        let url = self.resolve(url, true)?;
        let budget = opts.timeout.unwrap_or(self.default_timeout);
        let retries = opts.retries.unwrap_or(0);
        let mut attempt = 0usize;

        loop {
            let req_id = request_id();
            let rb = opts.decorate(self.inner.get(url.clone()).timeout(budget))?;
            tracing::debug!(
                %req_id,
                attempt = attempt + 1,
                target_url = %loggable(&url),
                timeout_ms = budget.as_millis() as u64,
                "http.page.start"
            );

            let started = Instant::now();
            let result = async {
                let resp = rb.send().await?;
                let status = resp.status();
                let final_url = resp.url().clone();
                let body = resp.text().await?;
                Ok::<_, reqwest::Error>(PageResponse {
                    status,
                    final_url,
                    body,
                })
            }
            .await
            .map_err(|e| HttpError::transport(e, budget));

            match result {
                Ok(page) => {
                    tracing::debug!(
                        %req_id,
                        status = %page.status,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        bytes = page.body.len(),
                        landed_on = %loggable(&page.final_url),
                        "http.page.done"
                    );
                    return Ok(page);
                }
                Err(err) if attempt < retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(%req_id, error = %err, delay_ms = delay.as_millis() as u64, "http.page.retry");
                    sleep(delay).await;
                }
                Err(err) => {
                    tracing::warn!(%req_id, error = %err, "http.page.failed");
                    return Err(err);
                }
            }
        }
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        let absolute = allow_absolute.then(|| Url::parse(path).ok()).flatten();
        match (absolute, &self.base) {
            (Some(url), _) => Ok(url),
            (None, Some(base)) => base.join(path),
            (None, None) => Url::parse(path),
        }
        .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn json_call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(format!("serializing body: {e}")))?;
        let budget = opts.timeout.unwrap_or(self.default_timeout);
        let retries = opts.retries.unwrap_or(self.max_retries);
        let mut attempt = 0usize;

        loop {
            let req_id = request_id();
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(budget);
            if let Some(bytes) = &payload {
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }
            let rb = opts.decorate(rb)?;
            tracing::debug!(
                %req_id,
                attempt = attempt + 1,
                %method,
                target_url = %loggable(&url),
                query = ?opts.loggable_query(),
                auth = opts.auth().kind(),
                "http.json.start"
            );

            let started = Instant::now();
            let outcome = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    match resp.bytes().await {
                        Ok(bytes) => Ok((status, headers, bytes)),
                        Err(e) => Err(HttpError::transport(e, budget)),
                    }
                }
                Err(e) => Err(HttpError::transport(e, budget)),
            };

            let (status, headers, bytes) = match outcome {
                Ok(parts) => parts,
                Err(err) if attempt < retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(%req_id, error = %err, delay_ms = delay.as_millis() as u64, "http.json.retry");
                    sleep(delay).await;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(%req_id, error = %err, "http.json.failed");
                    return Err(err);
                }
            };

            let upstream_id = upstream_request_id(&headers);
            tracing::debug!(
                %req_id,
                %status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                bytes = bytes.len(),
                %upstream_id,
                "http.json.response"
            );

            if status.is_success() {
                return serde_json::from_slice(&bytes).map_err(|e| {
                    tracing::warn!(%req_id, error = %e, body = %snippet(&bytes), "http.json.decode_failed");
                    HttpError::Decode(e.to_string(), snippet(&bytes))
                });
            }

            let err = HttpError::Api {
                status,
                message: upstream_message(&bytes),
                request_id: upstream_id,
            };
            if err.is_transient() && attempt < retries {
                attempt += 1;
                let delay = retry_delay(status, &headers, attempt);
                tracing::warn!(%req_id, error = %err, delay_ms = delay.as_millis() as u64, "http.json.retry");
                sleep(delay).await;
                continue;
            }
            tracing::warn!(%req_id, error = %err, "http.json.failed");
            return Err(err);
        }
    }
}

fn request_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("r{}", &id[..12])
}

/// Host and path only; query strings can carry credentials.
fn loggable(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("-"), url.path())
}

fn upstream_request_id(headers: &HeaderMap) -> String {
    ["x-request-id", "x-correlation-id"]
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// 200ms, 400ms, 800ms, ... for attempt 1, 2, 3, ...
fn backoff(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    BASE_DELAY.saturating_mul(1 << exp)
}

fn retry_delay(status: StatusCode, headers: &HeaderMap, attempt: usize) -> Duration {
    let advertised = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    match advertised {
        Some(delay) => delay,
        None if status == StatusCode::TOO_MANY_REQUESTS => backoff(attempt).max(RATE_LIMIT_FLOOR),
        None => backoff(attempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            retry_delay(StatusCode::TOO_MANY_REQUESTS, &headers, 1),
            RATE_LIMIT_FLOOR
        );
        assert_eq!(
            retry_delay(StatusCode::BAD_GATEWAY, &headers, 1),
            Duration::from_millis(200)
        );
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(
            retry_delay(StatusCode::TOO_MANY_REQUESTS, &headers, 1),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn unanchored_client_requires_absolute_urls() {
        let client = HttpClient::unanchored().unwrap();
        assert!(client.resolve("relative/path", true).is_err());
        assert!(client.resolve("https://example.com/a", true).is_ok());
    }

    #[test]
    fn anchored_client_joins_relative_paths() {
        let client = HttpClient::new("https://api.example.com/v1/").unwrap();
        let url = client.resolve("chat/completions", false).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/chat/completions");
    }
}
