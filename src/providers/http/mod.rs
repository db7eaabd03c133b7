
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::ProviderError;
use crate::config::HttpConfig;

const EXPONENTIAL_BACKOFF_BASE: u32 = 2;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Blocking JSON client shared by every provider, with bounded retries
#[derive(Debug, Clone)]
pub struct HttpClient {
    provider: &'static str,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff: Duration,
}

/// What to do after a failed attempt
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    Retry(String),
    Fatal(ProviderError),
}

impl HttpClient {
    #[inline]
    pub fn new(provider: &'static str, config: &HttpConfig) -> Self {
        Self {
            provider,
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
            retry_attempts: config.retry_attempts.max(1),
            backoff: DEFAULT_BACKOFF,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Base delay before the first retry; doubles on each further attempt
    #[inline]
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[inline]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    #[inline]
    pub const fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// POST a JSON body and decode a JSON response
    #[inline]
    pub fn post_json<B, R>(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<R, ProviderError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(body).map_err(|e| {
            ProviderError::malformed(self.provider, format!("Failed to serialize request: {}", e))
        })?;

        let response_text = self.send_with_retry(url, || {
            let mut request = self
                .agent
                .post(url.as_str())
                .header("Content-Type", "application/json");
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request
                .send(&payload)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        self.decode(&response_text)
    }

    /// GET with query parameters and decode a JSON response
    #[inline]
    pub fn get_json<R>(&self, url: &Url, query: &[(&str, &str)]) -> Result<R, ProviderError>
    where
        R: DeserializeOwned,
    {
        let response_text = self.send_with_retry(url, || {
            let mut request = self.agent.get(url.as_str());
            for (name, value) in query {
                request = request.query(*name, *value);
            }
            request
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        self.decode(&response_text)
    }

    fn decode<R: DeserializeOwned>(&self, text: &str) -> Result<R, ProviderError> {
        serde_json::from_str(text).map_err(|e| {
            ProviderError::malformed(self.provider, format!("Failed to parse response: {}", e))
        })
    }

    fn send_with_retry<F>(&self, url: &Url, mut request_fn: F) -> Result<String, ProviderError>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "{} request attempt {}/{} to {}",
                self.provider,
                attempt,
                self.retry_attempts,
                url.path()
            );

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(err) => match classify(self.provider, &err) {
                    Failure::Fatal(provider_error) => {
                        warn!("{}", provider_error);
                        return Err(provider_error);
                    }
                    Failure::Retry(message) => {
                        warn!(
                            "{} request failed: {}, attempt {}/{}",
                            self.provider, message, attempt, self.retry_attempts
                        );
                        last_error = Some(err);

                        if attempt < self.retry_attempts {
                            let delay = self.backoff * EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1);
                            debug!("Waiting {:?} before retry", delay);
                            std::thread::sleep(delay);
                        }
                    }
                },
            }
        }

        error!(
            "All {} attempts failed for {} request to {}",
            self.retry_attempts, self.provider, url
        );

        Err(match last_error {
            Some(ureq::Error::StatusCode(status)) => ProviderError::Rejected {
                provider: self.provider.to_string(),
                status,
                message: format!("server error after {} attempts", self.retry_attempts),
            },
            Some(err) => ProviderError::Network {
                provider: self.provider.to_string(),
                message: err.to_string(),
            },
            None => ProviderError::Network {
                provider: self.provider.to_string(),
                message: "request failed after retries".to_string(),
            },
        })
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn classify(provider: &str, err: &ureq::Error) -> Failure {
    let provider_name = provider.to_string();
    match err {
        ureq::Error::StatusCode(status) => match *status {
            429 => Failure::Fatal(ProviderError::QuotaExceeded {
                provider: provider_name,
                message: "HTTP 429 Too Many Requests".to_string(),
            }),
            401 | 403 => Failure::Fatal(ProviderError::Unauthorized {
                provider: provider_name,
                message: format!("HTTP {}", status),
            }),
            status if status >= 500 => Failure::Retry(format!("server error (status {})", status)),
            status => Failure::Fatal(ProviderError::Rejected {
                provider: provider_name,
                status,
                message: "client error".to_string(),
            }),
        },
        ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound
        | ureq::Error::Timeout(_)
        | ureq::Error::Io(_) => Failure::Retry(format!("transport error: {}", err)),
        other => Failure::Fatal(ProviderError::Network {
            provider: provider_name,
            message: other.to_string(),
        }),
    }
}
