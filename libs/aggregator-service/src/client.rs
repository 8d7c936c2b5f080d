use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;

use crate::error::UpstreamError;

/// Источник текста для агрегатора: echo-сервис или его подмена в тестах.
pub trait EchoSource: Send + Sync {
    /// `GET <base>?delay=<ms>`, тело ответа как текст.
    fn get_text(&self, delay: u64) -> Pin<Box<dyn Future<Output = Result<String, UpstreamError>> + Send + '_>>;
}

/// HTTP client for the echo service.
#[derive(Clone, Debug)]
pub struct EchoClient {
    http: reqwest::Client,
    base_url: Url,
}

impl EchoClient {
    /// `timeout` bounds each outbound request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl {
            url: base_url.to_string(),
            detail: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self { http, base_url })
    }

    async fn fetch(&self, delay: u64) -> Result<String, UpstreamError> {
        let url = self.base_url.as_str();
        let resp = self
            .http
            .get(self.base_url.clone())
            .query(&[("delay", delay)])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { url: url.to_string(), source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|source| UpstreamError::Transport { url: url.to_string(), source })
    }
}

impl EchoSource for EchoClient {
    fn get_text(&self, delay: u64) -> Pin<Box<dyn Future<Output = Result<String, UpstreamError>> + Send + '_>> {
        Box::pin(self.fetch(delay))
    }
}
