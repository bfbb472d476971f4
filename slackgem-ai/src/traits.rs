use async_trait::async_trait;

use crate::error::GenerationError;

/// A text-generation backend: one prompt in, one block of text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
