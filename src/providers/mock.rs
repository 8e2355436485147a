/*!
 * Mock provider implementation for testing.
 *
 * The mock never touches the network. It answers from one of:
 * - `MockProvider::scripted()` - a queue of canned replies, in order
 * - `MockProvider::with_responder()` - a function of the prompt
 * - `MockProvider::failing()` - always fails with an error
 *
 * Every prompt it receives is recorded for inspection.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
enum MockBehavior {
    /// Pop replies from the queue; an exhausted queue is an error
    Scripted,
    /// Compute the reply from the prompt
    Responder(fn(&str) -> String),
    /// Always fails with an error
    Failing,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    fn new(behavior: MockBehavior, replies: Vec<String>) -> Self {
        Self {
            behavior,
            replies: Arc::new(Mutex::new(replies.into())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            invalidated: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a provider answering with these replies, one per request
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockBehavior::Scripted, replies.into_iter().map(Into::into).collect())
    }

    /// Create a provider that computes each reply from the prompt
    pub fn with_responder(responder: fn(&str) -> String) -> Self {
        Self::new(MockBehavior::Responder(responder), Vec::new())
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, Vec::new())
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts whose stored reply was invalidated
    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().clone()
    }

    /// Format a well-formed reply the way the prompt asks for it
    pub fn format_reply(lines: &[&str], terms: &[(&str, &str)]) -> String {
        let mut reply = String::from("```\n【译文】\n");
        for line in lines {
            reply.push_str(line);
            reply.push('\n');
        }
        reply.push_str("【新术语】\n");
        for (source, target) in terms {
            reply.push_str(&format!("{} - {}\n", source, target));
        }
        reply.push_str("```");
        reply
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());

        match &self.behavior {
            MockBehavior::Scripted => self.replies.lock().pop_front().ok_or_else(|| {
                ProviderError::RequestFailed("Mock reply queue is empty".to_string())
            }),
            MockBehavior::Responder(responder) => Ok(responder(prompt)),
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
        }
    }

    async fn invalidate(&self, prompt: &str) {
        self.invalidated.lock().push(prompt.to_string());
    }
}
