//! OpenAI-compatible chat-completions payloads spoken by the LiteLLM gateway.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
///
/// Field order is fixed so that equal requests serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Chat message object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatMessageContent,
}

/// Message content: a plain string for text-only turns, an ordered block
/// array once media is involved.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessageContent {
    TextOnly(String),
    Multimodal(Vec<ContentBlock>),
}

/// One content segment in multipart message input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image URL wrapper; carries a `data:` URL for inline media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Top-level chat completion response, also the shape of one stream chunk.
///
/// `top_level` captures `content`/`tool_calls` placed directly on the body by
/// gateways that do not wrap them in `choices`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub top_level: AssistantMessage,
}

/// Single choice item returned by chat completions.
#[derive(Debug, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
    #[serde(default)]
    pub delta: Option<AssistantMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant output found in `message`, `delta`, or on the top-level body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: WireFunction,
}

/// Function name plus its arguments as a JSON-encoded string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WireFunction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Where the assistant output of a response was found.
#[derive(Debug)]
pub enum ChoiceMessage {
    Complete(AssistantMessage),
    StreamDelta(AssistantMessage),
    TopLevel(AssistantMessage),
}

impl ChoiceMessage {
    pub fn into_message(self) -> AssistantMessage {
        match self {
            ChoiceMessage::Complete(message)
            | ChoiceMessage::StreamDelta(message)
            | ChoiceMessage::TopLevel(message) => message,
        }
    }
}

impl ChatCompletionResponse {
    /// Pick the assistant output of a complete (non-streaming) response:
    /// `choices[0].message`, then `choices[0].delta`, then the body itself.
    /// Returns it together with the finish reason.
    pub fn into_completion(mut self) -> (ChoiceMessage, Option<String>) {
        if self.choices.is_empty() {
            return (ChoiceMessage::TopLevel(self.top_level), self.finish_reason);
        }
        let choice = self.choices.swap_remove(0);
        let message = match (choice.message, choice.delta) {
            (Some(message), _) => ChoiceMessage::Complete(message),
            (None, Some(delta)) => ChoiceMessage::StreamDelta(delta),
            (None, None) => ChoiceMessage::TopLevel(self.top_level),
        };
        (message, choice.finish_reason)
    }

    /// The `choices[0].delta` of a stream chunk, with its finish reason.
    pub fn into_delta(mut self) -> (Option<AssistantMessage>, Option<String>) {
        if self.choices.is_empty() {
            return (None, None);
        }
        let choice = self.choices.swap_remove(0);
        (choice.delta, choice.finish_reason)
    }
}
