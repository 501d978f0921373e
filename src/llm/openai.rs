//! OpenAI-compatible `/chat/completions` client (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::IntentCompletion;

const PROVIDER: &str = "openai-compatible";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    app_title: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            app_title: config.app_title.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// First choice's content; an absent message reads as an empty object.
fn first_choice_content(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| "{}".to_string())
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl IntentCompletion for OpenAiCompatibleClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut request = self
            .client
            .post(self.endpoint())
            .header("X-Title", &self.app_title)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        tracing::debug!(model = %self.model, "Requesting intent completion");
        let response = request.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after: retry_after(&response),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;
        Ok(first_choice_content(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    #[derive(Clone, Default)]
    struct Seen {
        headers: Arc<Mutex<Vec<(String, String)>>>,
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    async fn completions(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        for name in ["x-title", "authorization"] {
            if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
                seen.headers
                    .lock()
                    .unwrap()
                    .push((name.to_string(), value.to_string()));
            }
        }
        seen.bodies.lock().unwrap().push(body);
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"action\":\"balance\",\"confidence\":0.9}" } }]
            })),
        )
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "deepseek/deepseek-r1-0528:free".to_string(),
            api_key: Some(SecretString::from("sk-test".to_string())),
            app_title: "SmartWallet AI".to_string(),
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn sends_title_key_and_both_turns() {
        let seen = Seen::default();
        let router = Router::new()
            .route("/api/v1/chat/completions", post(completions))
            .with_state(seen.clone());
        let client = OpenAiCompatibleClient::new(&config(spawn(router).await)).unwrap();

        let content = client.complete("system text", "user text").await.unwrap();
        assert_eq!(content, "{\"action\":\"balance\",\"confidence\":0.9}");

        let headers = seen.headers.lock().unwrap().clone();
        assert!(headers.contains(&("x-title".to_string(), "SmartWallet AI".to_string())));
        assert!(headers.contains(&("authorization".to_string(), "Bearer sk-test".to_string())));

        let body = seen.bodies.lock().unwrap()[0].clone();
        assert_eq!(body["model"], "deepseek/deepseek-r1-0528:free");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user text");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failed() {
        let router = Router::new().route(
            "/api/v1/chat/completions",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let client = OpenAiCompatibleClient::new(&config(spawn(router).await)).unwrap();

        assert!(matches!(
            client.complete("s", "u").await,
            Err(LlmError::AuthFailed { .. })
        ));
    }

    #[test]
    fn missing_content_reads_as_empty_object() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[{"message":null}]}"#).unwrap();
        assert_eq!(first_choice_content(response), "{}");
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_choice_content(response), "{}");
    }
}
