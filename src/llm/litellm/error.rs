//! Terminal error responses produced when an invocation cannot complete.

use crate::llm::types::LlmResponse;

/// Code for failures that happen before a status is known or while reading
/// the body.
pub const TRANSPORT_ERROR_CODE: &str = "LITELLM_ERROR";

/// `LITELLM_<status>` for a non-2xx gateway reply.
pub fn http_error_code(status: u16) -> String {
    format!("LITELLM_{}", status)
}

/// Error response for a non-2xx status. `body` is surfaced verbatim.
pub fn http_error(status: u16, body: String) -> LlmResponse {
    let explanation = format!(
        "The LLM gateway rejected the request with HTTP status {}.\n\
         Probable causes:\n\
         - the API key is missing, expired or not allowed to use this model\n\
         - the model name is not configured on the gateway\n\
         - the gateway or its upstream provider is overloaded or down\n\
         Gateway response: {}",
        status, body
    );
    LlmResponse::error(http_error_code(status), body, explanation)
}

/// Error response for a failure to reach the gateway or read its reply.
pub fn transport_error(message: impl Into<String>) -> LlmResponse {
    let message = message.into();
    let explanation = format!(
        "Could not get an answer from the LLM gateway.\n\
         Probable causes:\n\
         - the gateway base URL is wrong or the service is not running\n\
         - a network, DNS or TLS problem between this server and the gateway\n\
         - the request timed out or the connection dropped mid-response\n\
         Details: {}",
        message
    );
    LlmResponse::error(TRANSPORT_ERROR_CODE, message, explanation)
}
