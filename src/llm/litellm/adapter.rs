use super::error::{http_error, transport_error, TRANSPORT_ERROR_CODE};
use super::normalize::normalize_completion;
use super::sse::parse_event_stream;
use super::translate::{redact_for_log, translate_request};
use super::transport::{HttpTransport, Transport};
use super::types::ChatCompletionResponse;
use crate::llm::diagnostics::{DiagnosticEvent, Diagnostics, GuardedDiagnostics, TracingDiagnostics};
use crate::llm::types::{LlmRequest, LlmResponse};
use crate::llm::{LlmAdapter, ResponseStream};
use crate::{Error, Result};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;

/// Connection settings for a LiteLLM (OpenAI-compatible) gateway.
#[derive(Debug, Clone)]
pub struct LiteLlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Adapter between the provider-neutral conversation model and a LiteLLM
/// gateway's `/chat/completions` endpoint.
///
/// Holds only immutable configuration; every [`invoke`](LlmAdapter::invoke)
/// is independent and may run concurrently with others.
pub struct LiteLlmAdapter {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
    model: String,
}

impl LiteLlmAdapter {
    pub fn new(config: LiteLlmConfig) -> Result<Self> {
        Self::new_with_client(config, reqwest::Client::new())
    }

    /// Build the adapter on a caller-supplied client, which owns timeouts and
    /// connection pooling.
    pub fn new_with_client(config: LiteLlmConfig, client: reqwest::Client) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("LiteLLM base URL is not set".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("LiteLLM API key is not set".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(Error::Config("LiteLLM default model is not set".to_string()));
        }

        let transport = HttpTransport::new(client, &config.base_url, config.api_key);
        Ok(Self::with_transport(Arc::new(transport), config.model))
    }

    /// Build the adapter on any [`Transport`], e.g. one wrapped in a retry policy.
    pub fn with_transport(transport: Arc<dyn Transport>, model: String) -> Self {
        Self {
            transport,
            diagnostics: Arc::new(TracingDiagnostics),
            model,
        }
    }

    /// Report to `diagnostics` instead of `tracing`. A sink that panics loses
    /// the event but cannot disturb the invocation.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Arc::new(GuardedDiagnostics::new(diagnostics));
        self
    }

    /// Live (bidirectional) sessions are not something a chat-completions
    /// gateway offers; this always fails without touching the network.
    pub fn connect(&self, _request: &LlmRequest) -> Result<Infallible> {
        Err(Error::UnsupportedMode(
            "live bidirectional connections are not supported by the LiteLLM adapter".to_string(),
        ))
    }
}

impl LlmAdapter for LiteLlmAdapter {
    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, request: LlmRequest, model: &str, stream: bool) -> ResponseStream {
        let model = if model.is_empty() {
            self.model.clone()
        } else {
            model.to_string()
        };
        let transport = self.transport.clone();
        let diagnostics = self.diagnostics.clone();

        ResponseStream::new(async_stream::stream! {
            let wire = translate_request(&request, &model, stream);
            diagnostics.record(DiagnosticEvent::Request {
                model: model.clone(),
                stream,
                body: redact_for_log(&wire),
            });

            let response = match transport.send(&wire).await {
                Ok(response) => response,
                Err(e) => {
                    let message = match e {
                        Error::Http(source) => source.to_string(),
                        other => other.to_string(),
                    };
                    yield failure(diagnostics.as_ref(), transport_error(message));
                    return;
                }
            };

            let status = response.status();
            diagnostics.record(DiagnosticEvent::Status {
                status: status.as_u16(),
            });

            if !status.is_success() {
                let outcome = match response.text().await {
                    Ok(body) => http_error(status.as_u16(), body),
                    Err(e) => transport_error(e.to_string()),
                };
                yield failure(diagnostics.as_ref(), outcome);
                return;
            }

            if stream {
                let mut events = Box::pin(parse_event_stream(
                    Box::pin(response.bytes_stream()),
                    diagnostics.clone(),
                ));
                while let Some(event) = events.next().await {
                    yield event;
                }
            } else {
                yield read_completion(response, diagnostics.as_ref()).await;
            }
        })
    }
}

async fn read_completion(response: reqwest::Response, diagnostics: &dyn Diagnostics) -> LlmResponse {
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return failure(diagnostics, transport_error(e.to_string())),
    };

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return failure(diagnostics, transport_error(e.to_string())),
    };
    diagnostics.record(DiagnosticEvent::Completion {
        body: value.clone(),
    });

    match serde_json::from_value::<ChatCompletionResponse>(value) {
        Ok(completion) => normalize_completion(completion, diagnostics),
        Err(e) => failure(diagnostics, transport_error(e.to_string())),
    }
}

fn failure(diagnostics: &dyn Diagnostics, response: LlmResponse) -> LlmResponse {
    diagnostics.record(DiagnosticEvent::Failure {
        code: response
            .error_code
            .clone()
            .unwrap_or_else(|| TRANSPORT_ERROR_CODE.to_string()),
        message: response.error_message.clone().unwrap_or_default(),
    });
    response
}
