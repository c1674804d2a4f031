/*!
 * Batch registry for translation work.
 *
 * A batch is a pair of messages: the instructions for the model and the
 * prompt holding the text to translate. The registry stores them as one flat
 * ordered sequence in which even positions hold instructions and odd
 * positions hold prompts, so its length is always even and entry `i` pairs
 * with `i + 1`.
 */

use log::info;

use crate::app_config::{MessagePairingMode, TranslationConfig};
use crate::providers::Message;

use super::prompt::PromptBuilder;

/// Ordered, write-once store of (instructions, prompt) batch pairs
#[derive(Debug, Default)]
pub struct BatchRegistry {
    /// Flat message sequence; even/odd positions pair up
    messages: Vec<Message>,
}

impl BatchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Append one batch pair
    pub fn append(&mut self, instructions: Message, prompt: Message) {
        self.messages.push(instructions);
        self.messages.push(prompt);
    }

    /// Iterate over the (instructions, prompt) pairs in order
    pub fn pairs(&self) -> impl Iterator<Item = (&Message, &Message)> {
        self.messages.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Number of stored messages (always even)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the registry holds no batches
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of batch pairs
    pub fn batch_count(&self) -> usize {
        self.messages.len() / 2
    }

    /// Build the registry for a full run: partition the source lines into
    /// prompts and pair each with the instruction message.
    ///
    /// Spans that yield an empty prompt are skipped. The pairing mode decides
    /// whether instructions carry the system role or the user role (for
    /// models without a system role).
    pub fn build(lines: &[String], config: &TranslationConfig) -> Self {
        let builder = PromptBuilder::new(config.lines_per_batch);
        let mut registry = Self::new();

        for prompt in builder.prompts(lines) {
            let instructions = match config.message_pairing {
                MessagePairingMode::System => Message::system(config.system_message.clone()),
                MessagePairingMode::User => Message::user(config.system_message.clone()),
            };

            registry.append(instructions, Message::user(prompt));
        }

        info!("Built {} translation batches", registry.batch_count());

        registry
    }
}
