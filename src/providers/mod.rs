/*!
 * Provider implementations for the remote translation service.
 *
 * This module contains the chat message types shared by all providers and
 * the client implementations:
 * - OpenAI: OpenAI-compatible chat completions API
 * - Mock: scripted provider used by the test suite
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Role tag of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// Content supplied by the caller
    User,
}

/// A single chat message: a role plus text content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a system-role message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Create a user-role message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Common trait for all translation providers
///
/// This is the remote translate capability consumed by the dispatcher: one
/// instruction message plus one prompt message in, translated text out. All
/// failure modes are expressed through `ProviderError` so the retry policy
/// can classify them.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one prompt under the given instructions
    ///
    /// # Arguments
    /// * `instructions` - The instruction (system) message of the batch pair
    /// * `prompt` - The user message holding the text to translate
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or a classified error
    async fn translate(&self, instructions: &Message, prompt: &Message)
        -> Result<String, ProviderError>;

    /// Short provider name for logging
    fn name(&self) -> &str;
}

pub mod mock;
pub mod openai;
