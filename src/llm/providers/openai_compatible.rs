use std::time::Duration;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::llm::provider::VisionModel;
use crate::llm::types::{ChatRequest, ChatResponse};

pub struct OpenAiCompatibleProvider {
    model: String,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_base: &str, api_key: String, model: String, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            model,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            max_tokens,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &ModelConfig, api_key: &str) -> Self {
        Self::new(
            &cfg.api_url,
            api_key.to_string(),
            cfg.model.clone(),
            cfg.max_tokens,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

#[async_trait]
impl VisionModel for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, image_base64: &str) -> PhoneClawResult<String> {
        let body = ChatRequest::vision(&self.model, prompt, image_base64, self.max_tokens);

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = prompt.len(),
            image_b64_len = image_base64.len(),
            "sending vision request (image omitted)"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(PhoneClawError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .first_text()
            .ok_or_else(|| PhoneClawError::LlmProvider("model response carried no text".into()))?;

        tracing::info!(content_len = content.len(), "vision model replied");
        Ok(content)
    }
}
