//! Conversion of a provider-neutral [`LlmRequest`] into a chat-completions body.

use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, ContentBlock, ImageUrl};
use crate::llm::types::{Content, InlineData, LlmRequest, Part, MODEL_ROLE};
use serde_json::Value;

const ASSISTANT_ROLE: &str = "assistant";
const SYSTEM_ROLE: &str = "system";
const LOG_PAYLOAD_PREFIX: usize = 50;
const TRUNCATION_MARKER: &str = "...[truncated]";

/// Build the wire request for `request`. Pure: the same input always yields
/// an identical body.
pub fn translate_request(request: &LlmRequest, model: &str, stream: bool) -> ChatCompletionRequest {
    let system = request.system_instruction.iter().map(|instruction| ChatMessage {
        role: SYSTEM_ROLE.to_string(),
        content: ChatMessageContent::TextOnly(instruction.clone()),
    });

    let messages = system
        .chain(request.contents.iter().map(translate_content))
        .collect();

    let config = request.config.as_ref();

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        stream,
        temperature: config.and_then(|c| c.temperature),
        max_tokens: config.and_then(|c| c.max_output_tokens),
    }
}

fn translate_content(content: &Content) -> ChatMessage {
    let role = if content.role == MODEL_ROLE {
        ASSISTANT_ROLE.to_string()
    } else {
        content.role.clone()
    };

    let mut texts: Vec<&str> = Vec::new();
    let mut media: Vec<&InlineData> = Vec::new();
    for part in &content.parts {
        match part {
            Part::Text { text } => texts.push(text),
            Part::InlineData { inline_data } => media.push(inline_data),
            Part::FunctionCall { .. } => {}
        }
    }

    let content = if media.is_empty() {
        ChatMessageContent::TextOnly(texts.join("\n"))
    } else {
        let text_blocks = texts
            .into_iter()
            .filter(|text| !text.is_empty())
            .map(|text| ContentBlock::Text {
                text: text.to_string(),
            });
        let image_blocks = media.into_iter().map(|inline| ContentBlock::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", inline.mime_type, inline.data),
            },
        });
        ChatMessageContent::Multimodal(text_blocks.chain(image_blocks).collect())
    };

    ChatMessage { role, content }
}

/// Copy of `request` for logging, with every inline base64 payload cut down
/// to its first 50 characters.
pub fn redact_for_log(request: &ChatCompletionRequest) -> Value {
    let mut value = match serde_json::to_value(request) {
        Ok(value) => value,
        Err(e) => return Value::String(format!("<unserializable request: {}>", e)),
    };

    if let Some(messages) = value.get_mut("messages").and_then(Value::as_array_mut) {
        for message in messages {
            let Some(blocks) = message.get_mut("content").and_then(Value::as_array_mut) else {
                continue;
            };
            for block in blocks {
                if let Some(Value::String(url)) = block.pointer_mut("/image_url/url") {
                    *url = truncate_data_url(url);
                }
            }
        }
    }

    value
}

fn truncate_data_url(url: &str) -> String {
    let (prefix, payload) = match url.find(";base64,") {
        Some(idx) => url.split_at(idx + ";base64,".len()),
        None => ("", url),
    };

    if payload.chars().count() <= LOG_PAYLOAD_PREFIX {
        return url.to_string();
    }

    let kept: String = payload.chars().take(LOG_PAYLOAD_PREFIX).collect();
    format!("{}{}{}", prefix, kept, TRUNCATION_MARKER)
}
