use crate::core::cache_control;
use crate::domain::model::FetchOutcome;
use crate::domain::ports::{ConfigProvider, Fetcher};
use crate::utils::error::{MsrError, Result};
use async_trait::async_trait;
use reqwest::{header::CACHE_CONTROL, redirect, Client};
use std::time::{Duration, Instant};

const MAX_REDIRECTS: usize = 10;

/// `reqwest`-backed fetcher. Follows redirects and measures the whole
/// request, from send until the body has been read.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.request_timeout(), config.user_agent())
    }

    /// Client timeouts surface as `FetchTimeout` whether they hit while
    /// waiting for headers or while reading the body.
    fn request_error(&self, url: &str, e: reqwest::Error) -> MsrError {
        if e.is_timeout() {
            MsrError::FetchTimeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs_f64(),
            }
        } else {
            MsrError::HttpError(e)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        tracing::debug!("GET {}", url);
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;
        let status = response.status();

        // 標頭可能無法解析，此時維持原本的過期時間
        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(cache_control::max_age);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, e))?;
        let elapsed = started.elapsed();

        tracing::debug!(
            "{} -> {} ({} bytes in {:?}, max-age {:?})",
            url,
            status,
            body.len(),
            elapsed,
            max_age
        );

        Ok(FetchOutcome {
            content_bytes: body.len() as u64,
            elapsed,
            max_age,
        })
    }
}
