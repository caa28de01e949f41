use std::time::Duration;

use async_trait::async_trait;

use crate::config::DeviceConfig;
use crate::device::traits::DeviceControl;
use crate::device::types::{
    Ack, DeviceStatus, InputRequest, LaunchRequest, ScreenshotResponse, SwipeRequest, TapRequest,
};
use crate::errors::{PhoneClawError, PhoneClawResult};

/// HTTP client for the on-device control helper.
pub struct HelperClient {
    base_url: String,
    client: reqwest::Client,
    control_timeout: Duration,
    slow_timeout: Duration,
}

impl HelperClient {
    pub fn new(base_url: impl Into<String>, control_timeout: Duration, slow_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            control_timeout,
            slow_timeout,
        }
    }

    pub fn from_config(cfg: &DeviceConfig) -> Self {
        Self::new(
            cfg.helper_url.clone(),
            Duration::from_millis(cfg.control_timeout_ms),
            Duration::from_millis(cfg.slow_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_ack(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> PhoneClawResult<()> {
        let mut request = self.client.post(self.url(path)).timeout(timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(PhoneClawError::Device(format!("POST /{path}: {status}: {err_body}")));
        }

        let ack: Ack = response.json().await?;
        if ack.success {
            tracing::debug!(path, "device acknowledged");
            Ok(())
        } else {
            Err(PhoneClawError::Device(format!(
                "POST /{path} rejected: {}",
                ack.error.unwrap_or_else(|| "success=false".into())
            )))
        }
    }
}

#[async_trait]
impl DeviceControl for HelperClient {
    async fn status(&self) -> PhoneClawResult<DeviceStatus> {
        let response = self
            .client
            .get(self.url("status"))
            .timeout(self.control_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PhoneClawError::Device(format!("GET /status: {}", response.status())));
        }
        Ok(response.json().await?)
    }

    async fn screenshot(&self) -> PhoneClawResult<String> {
        let response = self
            .client
            .get(self.url("screenshot"))
            .timeout(self.slow_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PhoneClawError::Device(format!(
                "GET /screenshot: {}",
                response.status()
            )));
        }

        let shot: ScreenshotResponse = response.json().await?;
        match shot.image {
            Some(image) if shot.success && !image.is_empty() => Ok(image),
            _ => Err(PhoneClawError::Device(format!(
                "screenshot unavailable: {}",
                shot.error.unwrap_or_else(|| "no image in response".into())
            ))),
        }
    }

    async fn tap(&self, x: i32, y: i32) -> PhoneClawResult<()> {
        let body = serde_json::to_value(TapRequest { x, y })?;
        self.post_ack("tap", Some(body), self.control_timeout).await
    }

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u32) -> PhoneClawResult<()> {
        let body = serde_json::to_value(SwipeRequest { x1, y1, x2, y2, duration_ms })?;
        self.post_ack("swipe", Some(body), self.slow_timeout).await
    }

    async fn input_text(&self, text: &str) -> PhoneClawResult<()> {
        let body = serde_json::to_value(InputRequest { text: text.to_string() })?;
        self.post_ack("input", Some(body), self.control_timeout).await
    }

    async fn back(&self) -> PhoneClawResult<()> {
        self.post_ack("back", None, self.control_timeout).await
    }

    async fn home(&self) -> PhoneClawResult<()> {
        self.post_ack("home", None, self.control_timeout).await
    }

    async fn launch(&self, package: &str) -> PhoneClawResult<()> {
        let body = serde_json::to_value(LaunchRequest { package: package.to_string() })?;
        self.post_ack("launch", Some(body), self.control_timeout).await
    }
}
