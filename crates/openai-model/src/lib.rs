//! A model provider for OpenAI-compatible chat completion APIs.
//!
//! Groq is the default endpoint, any server speaking the same streaming
//! protocol (including OpenAI itself) works by changing the base URL.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use scout_model::{ErrorKind, ModelProvider, ModelProviderError, ModelRequest};

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder,
};
use io::{Chunks, Sse};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ErrorKind::Unauthorized
            }
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
            _ => ErrorKind::Other,
        };
        let detail = serde_json::from_str::<proto::ErrorBody>(body)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| body.trim().to_owned());
        let message = if detail.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            format!("HTTP {}: {detail}", status.as_u16())
        };
        Self::new(message, kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        debug!(
            model = %self.config.model,
            messages = req.messages.len(),
            tools = req.tools.len(),
            "sending chat completion request"
        );
        let resp_fut = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::ACCEPT, "text/event-stream")
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Network))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = Error::from_status(status, &body);
                warn!("request rejected: {err}");
                return Err(err);
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::InvalidResponse,
                ));
            }

            let chunks = Chunks::from_response(resp);
            Ok(OpenAIResponse::from_sse(Sse::new(chunks)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use scout_model::{ModelMessage, ModelResponse, ModelResponseEvent};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> OpenAIProvider {
        let config = OpenAIConfigBuilder::with_api_key("gsk_test")
            .with_base_url(format!("{}/openai/v1", server.uri()))
            .with_model("llama3-8b-8192")
            .build();
        OpenAIProvider::new(config)
    }

    fn user_request(text: &str) -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User(text.to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_streamed_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(json!({
                "model": "llama3-8b-8192",
                "stream": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n\
data: {\"id\":\"c1\",\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
data: [DONE]\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let resp = provider_for(&server)
            .send_request(&user_request("Hello"))
            .await
            .unwrap();
        let mut resp = pin!(resp);
        let mut text = String::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            if let ModelResponseEvent::MessageDelta(delta) = event {
                text.push_str(&delta);
            }
        }
        assert_eq!(text, "Hi");
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Invalid API Key",
                    "type": "invalid_request_error",
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send_request(&user_request("Hello"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "HTTP 401: Invalid API Key");
    }

    #[tokio::test]
    async fn test_unexpected_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "c1" })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send_request(&user_request("Hello"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }
}
