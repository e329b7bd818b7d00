use super::types::ChatCompletionRequest;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Delivers one chat-completions request and hands back the raw response.
///
/// Implementations send exactly one request per call. Policies such as retry
/// can wrap a `Transport` without the parsing code noticing.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response>;
}

/// Single-attempt HTTP transport with bearer-token authentication.
pub struct HttpTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    /// `client` carries any timeouts; the transport adds none of its own.
    pub fn new(client: Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            stream: false,
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let transport = HttpTransport::new(Client::new(), "http://gateway:4000/v1/", "k".into());
        assert_eq!(transport.endpoint(), "http://gateway:4000/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_send_posts_once_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer secret"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Client::new(), &server.uri(), "secret".into());
        let response = transport.send(&request()).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned_not_raised() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Client::new(), &server.uri(), "k".into());
        let response = transport.send(&request()).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_an_http_error() {
        let transport = HttpTransport::new(Client::new(), "http://127.0.0.1:1", "k".into());
        let err = transport.send(&request()).await.unwrap_err();
        assert!(matches!(err, crate::Error::Http(_)));
    }
}
