use std::time::Duration;

use sip_core::Result;
use tokio::time::sleep;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total attempts including the first request.
    pub attempts: u32,
    pub timeout: Duration,
    /// Delay before retry `n` (0-based) is `backoff_base * backoff_factor^n`.
    pub backoff_base: Duration,
    pub backoff_factor: f64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(15),
            backoff_base: Duration::from_secs(1),
            backoff_factor: 1.5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base
            .mul_f64(self.backoff_factor.powi(retry as i32))
    }
}

/// Page fetcher with bounded retries. Any transport error or non-2xx status
/// is retried; the last error is returned once attempts run out.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let max_attempts = self.config.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < max_attempts => {
                    let delay = self.config.backoff(attempt - 1);
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "fetch.retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    tracing::warn!(url, attempt, error = %err, "fetch.failed");
                    return Err(err);
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
