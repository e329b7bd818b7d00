//! Floor-plan KPI analysis on top of an [`LlmAdapter`].

use crate::llm::mime::detect_image_mime;
use crate::llm::{
    Content, FunctionCall, GenerateConfig, LiteLlmAdapter, LlmAdapter, LlmRequest, Part,
};
use crate::models::Config;
use crate::{prompts, Error, Result};
use base64::Engine as _;
use futures::StreamExt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
    pub finish_reason: Option<String>,
}

/// Sends a floor plan and its KPI description to the model and gathers the
/// answer.
pub struct FloorPlanAnalyzer {
    llm: Box<dyn LlmAdapter>,
    model: String,
    stream: bool,
    generate_config: Option<GenerateConfig>,
}

impl FloorPlanAnalyzer {
    /// Build an analyzer on any adapter; the adapter's default model is used.
    pub fn with_adapter(llm: Box<dyn LlmAdapter>, stream: bool) -> Self {
        Self {
            llm,
            model: String::new(),
            stream,
            generate_config: None,
        }
    }

    /// Construct an analyzer talking to the configured LiteLLM gateway.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let adapter = LiteLlmAdapter::new_with_client(config.litellm(), client)?;
        info!(
            "LLM gateway: {} (model: {}, streaming: {})",
            config.litellm_base_url, config.model, config.stream
        );

        let mut analyzer = Self::with_adapter(Box::new(adapter), config.stream);
        analyzer.generate_config = config.generate_config();
        Ok(analyzer)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_generate_config(mut self, config: GenerateConfig) -> Self {
        self.generate_config = Some(config);
        self
    }

    /// One user turn: the rendered KPI prompt followed by the plan image.
    pub fn build_request(&self, image: &[u8], kpi: &str) -> LlmRequest {
        let mime = detect_image_mime(image);
        let data = base64::engine::general_purpose::STANDARD.encode(image);

        LlmRequest {
            contents: vec![Content::user(vec![
                Part::text(prompts::render(prompts::ANALYSIS_USER, &[("kpi", kpi.trim())])),
                Part::inline_data(mime, data),
            ])],
            system_instruction: Some(prompts::ANALYSIS_SYSTEM.trim().to_string()),
            config: self.generate_config.clone(),
        }
    }

    pub async fn analyze(&self, image: &[u8], kpi: &str) -> Result<Analysis> {
        self.analyze_with(image, kpi, |_| {}).await
    }

    pub async fn analyze_file(&self, path: &Path, kpi: &str) -> Result<Analysis> {
        self.analyze_file_with(path, kpi, |_| {}).await
    }

    pub async fn analyze_file_with<F>(&self, path: &Path, kpi: &str, on_fragment: F) -> Result<Analysis>
    where
        F: FnMut(&str),
    {
        let image = tokio::fs::read(path).await?;
        info!("Read floor plan {} ({} bytes)", path.display(), image.len());
        self.analyze_with(&image, kpi, on_fragment).await
    }

    /// Run the analysis, handing every text fragment to `on_fragment` as it
    /// arrives. A gateway failure becomes [`Error::Gateway`].
    pub async fn analyze_with<F>(&self, image: &[u8], kpi: &str, mut on_fragment: F) -> Result<Analysis>
    where
        F: FnMut(&str),
    {
        if image.is_empty() {
            return Err(Error::InvalidInput("floor-plan image is empty".to_string()));
        }
        if kpi.trim().is_empty() {
            return Err(Error::InvalidInput("KPI description is empty".to_string()));
        }

        let request = self.build_request(image, kpi);
        let mut responses = self.llm.invoke(request, &self.model, self.stream);
        let mut analysis = Analysis::default();

        while let Some(response) = responses.next().await {
            if let Some(code) = response.error_code.clone() {
                let message = response.error_message.clone().unwrap_or_default();
                warn!("Analysis failed: {}", response.render());
                return Err(Error::Gateway { code, message });
            }

            let text = response.text();
            if !text.is_empty() {
                on_fragment(&text);
                analysis.text.push_str(&text);
            }
            analysis
                .function_calls
                .extend(response.function_calls().cloned());
            if response.finish_reason.is_some() {
                analysis.finish_reason = response.finish_reason;
            }
        }

        debug!(
            "Analysis finished ({} chars, {} tool calls, finish reason {:?})",
            analysis.text.len(),
            analysis.function_calls.len(),
            analysis.finish_reason
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlmAdapter};
    use serde_json::json;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[tokio::test]
    async fn test_streamed_fragments_are_accumulated() {
        let mock = MockLlmAdapter::new().with_stream(&["Daylight: ", "meets target."]);
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock.clone()), true);

        let mut seen = Vec::new();
        let analysis = analyzer
            .analyze_with(PNG, "daylight factor above 2%", |fragment| {
                seen.push(fragment.to_string())
            })
            .await
            .unwrap();

        assert_eq!(analysis.text, "Daylight: meets target.");
        assert_eq!(seen, vec!["Daylight: ", "meets target."]);
        assert_eq!(mock.get_call_count(), 1);
        assert!(mock.get_requests()[0].2);
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_image() {
        let mock = MockLlmAdapter::new();
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock.clone()), false)
            .with_model("vision-model")
            .with_generate_config(GenerateConfig {
                temperature: Some(0.1),
                max_output_tokens: None,
            });

        analyzer.analyze(PNG, "  net-to-gross ratio  ").await.unwrap();

        let (request, model, stream) = mock.get_requests().remove(0);
        assert_eq!(model, "vision-model");
        assert!(!stream);
        assert_eq!(request.system_instruction.as_deref(), Some(prompts::ANALYSIS_SYSTEM.trim()));
        assert_eq!(request.config.unwrap().temperature, Some(0.1));

        let parts = &request.contents[0].parts;
        match &parts[0] {
            Part::Text { text } => {
                assert!(text.contains("net-to-gross ratio"));
                assert!(!text.contains("{{kpi}}"));
            }
            other => panic!("expected text part, got {:?}", other),
        }
        assert_eq!(
            parts[1],
            Part::inline_data(
                "image/png",
                base64::engine::general_purpose::STANDARD.encode(PNG)
            )
        );
    }

    #[tokio::test]
    async fn test_error_response_becomes_gateway_error() {
        let mock = MockLlmAdapter::new().with_responses(vec![LlmResponse::error(
            "LITELLM_401",
            "invalid key",
            "The gateway rejected the API key.",
        )]);
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock), true);

        let err = analyzer.analyze(PNG, "area").await.unwrap_err();
        match err {
            Error::Gateway { code, message } => {
                assert_eq!(code, "LITELLM_401");
                assert_eq!(message, "invalid key");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_calls_and_finish_reason_are_collected() {
        let mock = MockLlmAdapter::new().with_responses(vec![
            LlmResponse::from_parts(
                vec![Part::function_call("measure_room", json!({"room": "living"}))],
                false,
            ),
            LlmResponse {
                turn_complete: true,
                finish_reason: Some("tool_calls".to_string()),
                ..Default::default()
            },
        ]);
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock), true);

        let analysis = analyzer.analyze(PNG, "room sizes").await.unwrap();
        assert!(analysis.text.is_empty());
        assert_eq!(analysis.function_calls[0].name, "measure_room");
        assert_eq!(analysis.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[tokio::test]
    async fn test_blank_inputs_are_rejected_before_invoking() {
        let mock = MockLlmAdapter::new();
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock.clone()), true);

        assert!(matches!(
            analyzer.analyze(&[], "area").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            analyzer.analyze(PNG, "   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_file_reads_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.png");
        std::fs::write(&path, PNG).unwrap();

        let mock = MockLlmAdapter::new();
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(mock.clone()), false);
        let analysis = analyzer.analyze_file(&path, "area").await.unwrap();

        assert_eq!(analysis.text, "Mock analysis");
        assert_eq!(analysis.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let analyzer = FloorPlanAnalyzer::with_adapter(Box::new(MockLlmAdapter::new()), false);
        let err = analyzer
            .analyze_file(Path::new("/nonexistent/plan.png"), "area")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
