use super::types::{ChatMessage, ChatRole, LlmError, LlmProvider, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Нативный провайдер Gemini (generateContent): system instruction + один ход пользователя
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self::new_with_endpoint(DEFAULT_GEMINI_API_BASE.to_string(), api_key)
    }

    pub fn new_with_endpoint(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }

    /// Собрать тело запроса: все system-сообщения уходят в systemInstruction
    fn build_request(messages: Vec<ChatMessage>) -> GenerateContentRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                ChatRole::System => system_parts.push(Part { text: msg.content }),
                ChatRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![Part { text: msg.content }],
                }),
            }
        }

        GenerateContentRequest {
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(Content {
                    role: None,
                    parts: system_parts,
                })
            },
            contents,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<LlmResponse, LlmError> {
        let body = Self::build_request(messages);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            tracing::error!("Gemini request failed with status {}", status);
            return Err(LlmError::from_api_message(format!("{}: {}", status, text)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::ApiError(format!("Failed to parse Gemini response: {}", e)))?;

        parsed.into_llm_response(model)
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}

// ============================================================================
// Request/Response structures для generateContent
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<i32>,
}

impl GenerateContentResponse {
    fn into_llm_response(self, model: &str) -> Result<LlmResponse, LlmError> {
        let tokens_used = self.usage_metadata.and_then(|u| u.total_token_count);
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            tokens_used,
            model: model.to_string(),
            finish_reason: candidate.finish_reason,
        })
    }
}
