//! Gemini `generateContent` provider
//!
//! Sends the whole prompt as a single user turn and asks for a JSON
//! response body.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::providers::LlmProvider,
};

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;
const RESPONSE_MIME_TYPE: &str = "application/json";

/// Keeps the credential out of URLs, which show up in error messages
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if non-empty
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, provider = "gemini", "Gemini API error");
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}",
                status
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        let text = body
            .into_text()
            .ok_or_else(|| AppError::ExternalApi("Empty response from Gemini".to_string()))?;

        tracing::info!(
            model = %self.model,
            chars = text.chars().count(),
            provider = "gemini",
            "Gemini generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{
        http::{HeaderMap, StatusCode, Uri},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    fn provider(api_url: String) -> GeminiProvider {
        GeminiProvider::new(
            "test_key".to_string(),
            api_url,
            "gemini-2.0-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_format() {
        let provider = provider("https://generativelanguage.googleapis.com/".to_string());
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"{\"recommendations\":[]}"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.into_text(),
            Some("{\"recommendations\":[]}".to_string())
        );
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.into_text(), None);

        let json = r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text(), None);
    }

    #[tokio::test]
    async fn test_generate_against_fake_upstream() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(
                |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
                    assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "test_key");
                    assert!(uri.query().is_none());
                    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
                    Json(json!({
                        "candidates": [{
                            "content": { "parts": [{ "text": format!("echo:{}", prompt) }] }
                        }]
                    }))
                },
            ),
        );
        let url = spawn_upstream(router).await;

        let text = provider(url).generate("ping").await.unwrap();
        assert_eq!(text, "echo:ping");
    }

    #[tokio::test]
    async fn test_generate_non_success_is_external_error() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let url = spawn_upstream(router).await;

        let result = provider(url).generate("ping").await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_generate_empty_candidates_is_external_error() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let url = spawn_upstream(router).await;

        let result = provider(url).generate("ping").await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = GeminiProvider::new(
            "SECRET_KEY_123".to_string(),
            format!("http://{}", addr),
            "gemini-2.0-flash".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider.generate("ping").await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET_KEY_123"));
        assert!(!format!("{:?}", err).contains("SECRET_KEY_123"));
    }

    #[tokio::test]
    async fn test_decode_error_does_not_leak_key() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async { "not json" }),
        );
        let url = spawn_upstream(router).await;

        let provider = GeminiProvider::new(
            "SECRET_KEY_123".to_string(),
            url,
            "gemini-2.0-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = provider.generate("ping").await.unwrap_err();
        assert!(!err.to_string().contains("SECRET_KEY_123"));
    }
}
