use async_trait::async_trait;

use crate::errors::PhoneClawResult;

/// A vision-capable chat model. Implementations send one prompt plus one
/// screenshot and return the raw reply text, uninterpreted.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, image_base64: &str) -> PhoneClawResult<String>;
}
