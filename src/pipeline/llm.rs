//! Completion client: build chat requests and call the endpoint.
//!
//! This module owns the only network I/O in the pipeline. All prompt
//! engineering lives in [`crate::prompts`] so it can be changed without
//! touching the retry or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 is the only retryable outcome. The endpoint may name its own
//! delay via the `retry-after` header (seconds); without one the client
//! waits [`RetryPolicy::default_delay`]. Any other error response fails
//! immediately — retrying a 401 or a malformed request cannot succeed.
//! After [`RetryPolicy::max_attempts`] rate-limited attempts the call
//! fails with [`ExtractError::MaxRetriesExceeded`].

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Default chat-completions endpoint.
pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ── Request / response types ─────────────────────────────────────────────

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A complete request body for the chat-completions endpoint.
///
/// Built once per call and not mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a raw response body, trimmed.
fn first_choice_content(body: &str) -> Result<String, ExtractError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ExtractError::UnexpectedResponseShape {
            detail: format!("reply is not a completion object: {e}"),
        })?;

    let content = parsed
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .ok_or_else(|| ExtractError::UnexpectedResponseShape {
            detail: "reply has no choices[0].message.content".to_string(),
        })?;

    Ok(content.trim().to_string())
}

// ── Retry policy ─────────────────────────────────────────────────────────

/// Backoff parameters for rate-limited completion calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 5.
    pub max_attempts: u32,
    /// Wait when the 429 response carries no usable `retry-after`. Default: 1 s.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            default_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// The delay to apply after a 429, honouring the server-suggested value.
    pub fn delay_for(&self, retry_after_secs: Option<u64>) -> Duration {
        retry_after_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_delay)
    }
}

/// Outcome of a single completion attempt.
pub(crate) enum Attempt<T> {
    /// The attempt succeeded.
    Ok(T),
    /// HTTP 429; retry after the suggested (or default) delay.
    RateLimited { retry_after_secs: Option<u64> },
    /// Non-retryable failure; surface immediately.
    Failed(ExtractError),
}

/// Drive `attempt` under `policy` until it succeeds, fails hard, or the
/// attempt budget is spent.
///
/// The wait happens after every rate-limited attempt, the final one
/// included, before `MaxRetriesExceeded` is reported.
pub(crate) async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, ExtractError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Attempt::Ok(value) => return Ok(value),
            Attempt::RateLimited { retry_after_secs } => {
                let delay = policy.delay_for(retry_after_secs);
                warn!(
                    "Rate limit exceeded (attempt {n}/{}). Retrying after {} seconds...",
                    policy.max_attempts,
                    delay.as_secs()
                );
                sleep(delay).await;
            }
            Attempt::Failed(err) => return Err(err),
        }
    }

    Err(ExtractError::MaxRetriesExceeded {
        attempts: policy.max_attempts,
    })
}

/// Parse the `retry-after` header as whole seconds.
///
/// A missing or non-numeric value reads as `None` and falls back to the
/// policy default.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

// ── Provider trait and HTTP implementation ───────────────────────────────

/// Anything that can answer a completion request with reply text.
///
/// The pipeline only ever sees this trait. Tests inject fakes; production
/// uses [`HttpCompletionClient`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the first choice's reply text, trimmed.
    ///
    /// Rate limits are absorbed internally per the implementation's policy.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ExtractError>;
}

/// HTTP client for an OpenAI-style chat-completions endpoint.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl HttpCompletionClient {
    /// Create a client for `api_url` authenticating with `api_key`.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            policy,
        }
    }

    /// Build a client from config, reading the API key from the
    /// `OPENAI_API_KEY` environment variable when none is configured.
    ///
    /// A missing key is not an error here: the request is sent anyway and
    /// the endpoint's authentication failure surfaces as an
    /// [`ExtractError::ApiError`].
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();

        if api_key.is_empty() {
            warn!("No API key configured and {API_KEY_ENV} is unset; completion requests will fail authentication");
        }

        Self::new(
            config.api_url.clone(),
            api_key,
            RetryPolicy {
                max_attempts: config.max_attempts,
                default_delay: Duration::from_secs(config.default_retry_delay_secs),
            },
        )
    }

    async fn attempt_once(&self, request: &CompletionRequest) -> Attempt<String> {
        let response = match self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Attempt::Failed(ExtractError::RequestFailed {
                    reason: e.to_string(),
                })
            }
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::RateLimited {
                retry_after_secs: parse_retry_after(response.headers()),
            };
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Attempt::Failed(ExtractError::ApiError {
                status: status.as_u16(),
                detail,
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Attempt::Failed(ExtractError::RequestFailed {
                    reason: e.to_string(),
                })
            }
        };

        match first_choice_content(&body) {
            Ok(content) => {
                debug!("Completion reply: {} bytes", content.len());
                Attempt::Ok(content)
            }
            Err(e) => Attempt::Failed(e),
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ExtractError> {
        with_backoff(&self.policy, |_| self.attempt_once(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.default_delay, Duration::from_secs(1));
    }

    #[test]
    fn delay_honours_server_suggestion() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(Some(7)), Duration::from_secs(7));
        assert_eq!(policy.delay_for(None), Duration::from_secs(1));
    }

    #[test]
    fn retry_after_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "3".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(3));

        headers.insert(RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn request_serialises_to_expected_shape() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("hello"),
            ],
            max_tokens: 150,
            temperature: 0.7,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn first_choice_content_happy_path() {
        let body = r#"{"choices":[{"message":{"content":"  Nature: Toy \n"}}]}"#;
        assert_eq!(first_choice_content(body).unwrap(), "Nature: Toy");
    }

    #[test]
    fn first_choice_content_missing_choices() {
        let err = first_choice_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedResponseShape { .. }));
    }

    #[test]
    fn first_choice_content_missing_content() {
        let err = first_choice_content(r#"{"choices":[{"message":{}}]}"#).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedResponseShape { .. }));
    }

    #[test]
    fn first_choice_content_not_json() {
        let err = first_choice_content("service unavailable").unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedResponseShape { .. }));
    }

    #[tokio::test]
    async fn backoff_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(&RetryPolicy::default(), |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Attempt::Ok("reply")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "reply");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_supplied_delays_then_succeeds() {
        // 429 four times with retry-after 2, 3, absent, absent, then success
        // on the fifth attempt. Suspension = 2 + 3 + 1 + 1 seconds.
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = with_backoff(&RetryPolicy::default(), |_| {
            let calls = &calls;
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                match n {
                    1 => Attempt::RateLimited {
                        retry_after_secs: Some(2),
                    },
                    2 => Attempt::RateLimited {
                        retry_after_secs: Some(3),
                    },
                    3 | 4 => Attempt::RateLimited {
                        retry_after_secs: None,
                    },
                    _ => Attempt::Ok("reply"),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "reply");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(2 + 3 + 1 + 1));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_exhausts_after_five_rate_limits() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<&str, _> = with_backoff(&RetryPolicy::default(), |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Attempt::RateLimited {
                    retry_after_secs: None,
                }
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            ExtractError::MaxRetriesExceeded { attempts: 5 }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // The wait runs after the final attempt too.
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_fails_immediately_on_other_errors() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<&str, _> = with_backoff(&RetryPolicy::default(), |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Attempt::Failed(ExtractError::ApiError {
                    status: 500,
                    detail: "boom".into(),
                })
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            ExtractError::ApiError { status: 500, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
