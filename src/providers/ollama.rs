use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{Completion, CompletionRequest, CompletionResult};
use crate::config::Config;
use crate::error::CompletionFailure;
use crate::model::Role;
use crate::providers::http_errors::model_api_request_error;
use crate::providers::{conversation_turns, endpoint, system_instruction};

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    stream: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: String,
}

fn ollama_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "assistant",
    }
}

fn to_ollama_messages(cfg: &Config, request: &CompletionRequest) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage {
        role: "system",
        content: system_instruction(cfg, request.mode),
    }];
    messages.extend(
        conversation_turns(&request.history, &request.user_text)
            .into_iter()
            .map(|turn| ChatMessage {
                role: ollama_role(turn.role),
                content: turn.text,
            }),
    );
    messages
}

pub async fn complete(
    client: &Client,
    cfg: &Config,
    request: &CompletionRequest,
) -> CompletionResult {
    let api_url = endpoint(&cfg.model_base_url, "api/chat");
    let body = OllamaChatRequest {
        model: cfg.model.clone(),
        stream: false,
        messages: to_ollama_messages(cfg, request),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        message_count = body.messages.len(),
        "sending ollama chat request"
    );

    let response = client
        .post(&api_url)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "ollama request failed"
            );
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    let status = response.status();
    if !status.is_success() {
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "ollama returned non-success status"
        );
        return Err(CompletionFailure::Api {
            status: status.as_u16(),
            message: response_body.trim().to_string(),
        });
    }

    let parsed: OllamaChatResponse = response
        .json()
        .await
        .map_err(|err| CompletionFailure::Malformed(err.to_string()))?;
    if parsed.message.content.trim().is_empty() {
        return Err(CompletionFailure::EmptyResponse);
    }
    debug!(
        model = %cfg.model,
        response_len = parsed.message.content.len(),
        "received ollama chat response"
    );
    Ok(Completion {
        text: parsed.message.content,
        citations: Vec::new(),
    })
}
