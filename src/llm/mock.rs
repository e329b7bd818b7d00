use super::types::{LlmRequest, LlmResponse, Part};
use super::{LlmAdapter, ResponseStream};
use std::sync::{Arc, Mutex};

/// Scripted adapter for exercising callers without a gateway.
///
/// Each invocation replays the next scripted sequence, cycling when the
/// script runs out. With no script it echoes a single complete text response.
#[derive(Clone)]
pub struct MockLlmAdapter {
    model: String,
    scripts: Arc<Mutex<Vec<Vec<LlmResponse>>>>,
    requests: Arc<Mutex<Vec<(LlmRequest, String, bool)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockLlmAdapter {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            scripts: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_responses(self, responses: Vec<LlmResponse>) -> Self {
        self.scripts.lock().unwrap().push(responses);
        self
    }

    /// Script a streamed answer: one partial response per fragment.
    pub fn with_stream(self, fragments: &[&str]) -> Self {
        let responses = fragments
            .iter()
            .map(|fragment| LlmResponse::from_parts(vec![Part::text(*fragment)], true))
            .collect();
        self.with_responses(responses)
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Requests seen so far, with the model name and stream flag used.
    pub fn get_requests(&self) -> Vec<(LlmRequest, String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmAdapter for MockLlmAdapter {
    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, request: LlmRequest, model: &str, stream: bool) -> ResponseStream {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let model = if model.is_empty() { self.model.as_str() } else { model };
        self.requests
            .lock()
            .unwrap()
            .push((request, model.to_string(), stream));

        let scripts = self.scripts.lock().unwrap();
        let responses = if scripts.is_empty() {
            vec![LlmResponse {
                turn_complete: true,
                finish_reason: Some("stop".to_string()),
                ..LlmResponse::from_parts(vec![Part::text("Mock analysis")], false)
            }]
        } else {
            scripts[(*count - 1) % scripts.len()].clone()
        };

        ResponseStream::from_responses(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Content;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_default_response() {
        let adapter = MockLlmAdapter::new();
        let responses: Vec<LlmResponse> =
            adapter.invoke(LlmRequest::default(), "", false).collect().await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].text(), "Mock analysis");
        assert!(responses[0].turn_complete);
    }

    #[tokio::test]
    async fn test_mock_cycles_scripts_and_records_requests() {
        let adapter = MockLlmAdapter::new()
            .with_stream(&["a", "b"])
            .with_stream(&["c"]);

        let request = LlmRequest {
            contents: vec![Content::user(vec![Part::text("hi")])],
            ..Default::default()
        };

        let first: Vec<LlmResponse> = adapter.invoke(request.clone(), "", true).collect().await;
        let second: Vec<LlmResponse> = adapter.invoke(request.clone(), "other", true).collect().await;
        let third: Vec<LlmResponse> = adapter.invoke(request, "", false).collect().await;

        assert_eq!(first.len(), 2);
        assert_eq!(second[0].text(), "c");
        assert_eq!(third[0].text(), "a");
        assert_eq!(adapter.get_call_count(), 3);

        let requests = adapter.get_requests();
        assert_eq!(requests[0].1, "mock-model");
        assert_eq!(requests[1].1, "other");
        assert!(!requests[2].2);
    }
}
