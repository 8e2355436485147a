/*!
 * Provider implementations for language-model endpoints.
 *
 * This module contains the collaborator seam of the translation engine:
 * - `Provider`: the single `generate(prompt) -> reply` capability the driver needs
 * - `openai`: OpenAI-compatible chat completions client (streaming or not)
 * - `mock`: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// A provider turns one complete prompt into the model's complete reply.
/// The same prompt is expected to be safely cacheable: callers may serve a
/// stored reply instead of asking again.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send the prompt and return the whole reply once it is complete
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Forget any stored reply for this prompt so the next call asks again
    async fn invalidate(&self, _prompt: &str) {}
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        (**self).generate(prompt).await
    }

    async fn invalidate(&self, prompt: &str) {
        (**self).invalidate(prompt).await
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Box<P> {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        (**self).generate(prompt).await
    }

    async fn invalidate(&self, prompt: &str) {
        (**self).invalidate(prompt).await
    }
}

pub mod mock;
pub mod openai;
