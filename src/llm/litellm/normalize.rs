//! Conversion of gateway output back into [`LlmResponse`]s.

use super::types::{AssistantMessage, ChatCompletionResponse, WireToolCall};
use crate::llm::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::llm::types::{LlmResponse, Part};
use serde_json::{Map, Value};

/// Text and function-call parts carried by one assistant message or delta.
///
/// Empty text is dropped. Tool-call arguments that are missing or are not
/// valid JSON decode to `{}` so one bad call does not lose the rest; each
/// such replacement is reported as [`DiagnosticEvent::MalformedArguments`].
pub fn message_parts(message: AssistantMessage, diagnostics: &dyn Diagnostics) -> Vec<Part> {
    let mut parts = Vec::new();

    if let Some(text) = message.content.filter(|text| !text.is_empty()) {
        parts.push(Part::text(text));
    }

    parts.extend(
        message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| tool_call_part(call, diagnostics)),
    );

    parts
}

fn tool_call_part(call: WireToolCall, diagnostics: &dyn Diagnostics) -> Part {
    let name = call.function.name.unwrap_or_default();
    let args = call
        .function
        .arguments
        .as_deref()
        .and_then(|raw| match serde_json::from_str::<Value>(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                diagnostics.record(DiagnosticEvent::MalformedArguments {
                    name: name.clone(),
                    reason: e.to_string(),
                });
                None
            }
        })
        .unwrap_or_else(|| Value::Object(Map::new()));

    Part::function_call(name, args)
}

/// Normalize a complete, non-streaming chat completion.
///
/// The turn counts as complete only when a non-null `finish_reason` is present.
pub fn normalize_completion(response: ChatCompletionResponse, diagnostics: &dyn Diagnostics) -> LlmResponse {
    let (message, finish_reason) = response.into_completion();
    let parts = message_parts(message.into_message(), diagnostics);

    LlmResponse {
        turn_complete: finish_reason.is_some(),
        finish_reason,
        ..LlmResponse::from_parts(parts, false)
    }
}

/// Responses for one stream chunk, in emission order: a partial text
/// fragment, a complete tool-call unit, then a turn-complete marker when the
/// chunk carries a finish reason.
pub fn chunk_to_responses(chunk: ChatCompletionResponse, diagnostics: &dyn Diagnostics) -> Vec<LlmResponse> {
    let (delta, finish_reason) = chunk.into_delta();
    let mut responses = Vec::new();

    if let Some(delta) = delta {
        if let Some(text) = delta.content.filter(|text| !text.is_empty()) {
            responses.push(LlmResponse::from_parts(vec![Part::text(text)], true));
        }

        let calls: Vec<Part> = delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| tool_call_part(call, diagnostics))
            .collect();
        if !calls.is_empty() {
            responses.push(LlmResponse::from_parts(calls, false));
        }
    }

    if let Some(reason) = finish_reason {
        responses.push(LlmResponse {
            turn_complete: true,
            finish_reason: Some(reason),
            ..Default::default()
        });
    }

    responses
}
