use crate::config::Config;
use crate::error::{AutolysisError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const SYSTEM_PROMPT: &str = "Summarize the data analysis.";

/// Turns an analysis summary into prose.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn narration(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self> {
        Self::with_timeout(api_key, model, base_url, Duration::from_secs(60))
    }

    pub fn with_timeout(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_key,
            base_url,
            model,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(
            config.api_token.clone(),
            config.model.clone(),
            config.api_url.clone(),
            config.http_timeout,
        )
    }

    pub async fn call_llm(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest::narration(&self.model, prompt);
        debug!("Sending {} prompt chars to {}", prompt.len(), self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AutolysisError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AutolysisError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AutolysisError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(&response_json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion response.
pub fn extract_content(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(AutolysisError::Llm(format!("LLM API error: {}", error)));
    }

    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            AutolysisError::Llm(format!(
                "No choices array in LLM response. Response: {}",
                response_json
            ))
        })?;

    let first = choices
        .first()
        .ok_or_else(|| AutolysisError::Llm("Empty choices array in LLM response".to_string()))?;

    if let Some(finish_reason) = first.get("finish_reason").and_then(|r| r.as_str()) {
        if finish_reason == "length" {
            warn!("LLM response was truncated due to length limit");
        } else if finish_reason == "content_filter" {
            return Err(AutolysisError::Llm(
                "LLM response was filtered by content policy".to_string(),
            ));
        }
    }

    let content = first["message"]["content"].as_str().ok_or_else(|| {
        AutolysisError::Llm(format!(
            "No content in LLM response. Response structure: {}",
            response_json
        ))
    })?;

    if content.is_empty() {
        return Err(AutolysisError::Llm("Empty content in LLM response".to_string()));
    }

    Ok(content.to_string())
}

#[async_trait]
impl Narrator for LlmClient {
    async fn narrate(&self, prompt: &str) -> Result<String> {
        self.call_llm(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(ChatRequest::narration("gpt-4o-mini", "hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Summarize the data analysis."},
                    {"role": "user", "content": "hello"}
                ]
            })
        );
    }

    #[test]
    fn test_extract_content() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "All good."}, "finish_reason": "stop"}]
        });
        assert_eq!(extract_content(&response).unwrap(), "All good.");
    }

    #[test]
    fn test_extract_content_errors() {
        assert!(extract_content(&json!({"error": {"message": "quota"}})).is_err());
        assert!(extract_content(&json!({"choices": []})).is_err());
        assert!(extract_content(&json!({"id": "x"})).is_err());
        assert!(extract_content(&json!({"choices": [{"message": {"content": ""}}]})).is_err());
        assert!(extract_content(&json!({
            "choices": [{"message": {"content": "x"}, "finish_reason": "content_filter"}]
        }))
        .is_err());
    }

    #[test]
    fn test_truncated_content_is_kept() {
        let response = json!({
            "choices": [{"message": {"content": "partial"}, "finish_reason": "length"}]
        });
        assert_eq!(extract_content(&response).unwrap(), "partial");
    }
}
