//! Client for the text-generation backend, consumed as a pure
//! string-to-string function over an OpenAI-style chat-completions endpoint.
//! Any transport, HTTP or decode failure is converted into a descriptive
//! string result so the interactive loop always completes a cycle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

pub struct LlmClient {
    http: reqwest::Client,
    cfg: LlmConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    /// Generate a response for the prompt. Never fails: backend errors come
    /// back as a textual error description.
    pub async fn generate(&self, prompt: &str) -> String {
        match self.request(prompt).await {
            Ok(text) => text,
            Err(e) => format!("Error during generation request: {}", e),
        }
    }

    async fn request(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'));
        let body = CompletionRequest {
            model: &self.cfg.model,
            messages: vec![Message { role: "user".to_string(), content: prompt.to_string() }],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };
        debug!("posting {} prompt chars to {}", prompt.len(), url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.cfg.api_key))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            anyhow::bail!("backend returned HTTP {}: {}", status, text);
        }
        let parsed: CompletionResponse = resp.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("backend returned no choices"))?;
        Ok(choice.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_serializes_expected_wire_shape() {
        let req = CompletionRequest {
            model: "gpt-3.5-turbo",
            messages: vec![Message { role: "user".into(), content: "hello".into() }],
            temperature: 0.7,
            max_tokens: 150,
        };
        let v: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "gpt-3.5-turbo");
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "hello");
        assert_eq!(v["max_tokens"], 150);
    }

    #[test]
    fn completion_response_parses_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":" hi "}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, " hi ");
    }
}
