//! Provider-neutral conversation types exchanged with an [`LlmAdapter`](super::LlmAdapter).

use serde::{Deserialize, Serialize};

/// Role name used for turns produced by the model.
pub const MODEL_ROLE: &str = "model";
/// Role name used for turns produced by the end user.
pub const USER_ROLE: &str = "user";

/// One conversation turn: a role and its ordered parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: USER_ROLE.to_string(),
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: MODEL_ROLE.to_string(),
            parts,
        }
    }
}

/// Untagged union of the part shapes a turn can carry.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn function_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Part::FunctionCall {
            function_call: FunctionCall {
                name: name.into(),
                args,
            },
        }
    }
}

/// Base64 inline payload used for image/vision requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// A tool invocation requested by the model, with decoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: serde_json::Value,
}

/// Optional sampling settings. Unset fields are never defaulted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// A complete multi-turn request handed to an adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateConfig>,
}

/// One element of an adapter's response sequence.
///
/// A response carries either `content` or `error_code`, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    pub partial: bool,
    pub turn_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Renderable explanation attached to error responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
}

impl LlmResponse {
    /// Model content built from `parts`; `None` content when `parts` is empty.
    pub fn from_parts(parts: Vec<Part>, partial: bool) -> Self {
        Self {
            content: (!parts.is_empty()).then(|| Content::model(parts)),
            partial,
            ..Default::default()
        }
    }

    /// Terminal error response. Never carries content.
    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            turn_complete: true,
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            user_message: Some(user_message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }

    /// Concatenated text parts, empty when there is no content.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| match p {
                Part::FunctionCall { function_call } => Some(function_call),
                _ => None,
            })
    }

    /// Text suitable for an end user: the content text, or the error explanation.
    pub fn render(&self) -> String {
        match &self.user_message {
            Some(message) if self.is_error() => message.clone(),
            _ => self.text(),
        }
    }
}
