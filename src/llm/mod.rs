//! LLM integration for floor-plan analysis
//!
//! Provides a provider-neutral request/response model, the [`LlmAdapter`]
//! seam used by the application layer, and the LiteLLM gateway adapter that
//! speaks the OpenAI-compatible chat-completions protocol.

pub mod diagnostics;
pub mod litellm;
pub mod mime;
pub mod mock;
pub mod types;

pub use diagnostics::{
    DiagnosticEvent, Diagnostics, GuardedDiagnostics, RecordingDiagnostics, TracingDiagnostics,
};
pub use litellm::{LiteLlmAdapter, LiteLlmConfig};
pub use mock::MockLlmAdapter;
pub use types::{Content, FunctionCall, GenerateConfig, InlineData, LlmRequest, LlmResponse, Part};

use futures::stream::{BoxStream, Stream};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A model backend that turns a conversation into a lazily produced
/// sequence of responses.
pub trait LlmAdapter: Send + Sync {
    /// Default model used when `invoke` receives an empty model name.
    fn model(&self) -> &str;

    /// Start one independent invocation. Never fails outright: problems are
    /// reported as a single error-bearing [`LlmResponse`] in the sequence.
    ///
    /// When the gateway reports a finish reason, the sequence also carries a
    /// content-less response with `turn_complete` set and `finish_reason`
    /// filled in. In streaming mode this marker follows the fragments, so a
    /// stream usually holds one more element than it has text and tool-call
    /// units.
    fn invoke(&self, request: LlmRequest, model: &str, stream: bool) -> ResponseStream;
}

/// Pull-based sequence of [`LlmResponse`]s for one invocation.
///
/// Nothing is read from the network until the stream is polled. Closing (or
/// dropping) the stream releases the underlying connection; later polls yield
/// `None`.
pub struct ResponseStream {
    inner: Option<BoxStream<'static, LlmResponse>>,
}

impl ResponseStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = LlmResponse> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(stream)),
        }
    }

    /// A sequence holding exactly the given responses.
    pub fn from_responses(responses: Vec<LlmResponse>) -> Self {
        Self::new(futures::stream::iter(responses))
    }

    /// Stop consuming and release the connection.
    pub fn close(&mut self) {
        self.inner = None;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for ResponseStream {
    type Item = LlmResponse;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
