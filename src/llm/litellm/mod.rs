//! LiteLLM gateway adapter
//!
//! Translates provider-neutral requests into OpenAI-compatible
//! chat-completions calls, parses single JSON replies or `data:` event
//! streams, and folds every failure into a terminal error response.

pub mod adapter;
pub mod error;
pub mod normalize;
pub mod sse;
pub mod translate;
pub mod transport;
pub mod types;

pub use adapter::{LiteLlmAdapter, LiteLlmConfig};
pub use error::{http_error_code, TRANSPORT_ERROR_CODE};
pub use transport::{HttpTransport, Transport};
