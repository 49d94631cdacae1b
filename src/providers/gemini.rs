use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{Completion, CompletionRequest, CompletionResult};
use crate::config::Config;
use crate::error::CompletionFailure;
use crate::model::Citation;
use crate::providers::http_errors::model_api_request_error;
use crate::providers::{conversation_turns, endpoint, system_instruction};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<Citation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

fn generate_url(base_url: &str, model: &str) -> String {
    endpoint(base_url, &format!("v1beta/models/{model}:generateContent"))
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

fn build_request(cfg: &Config, request: &CompletionRequest) -> GenerateContentRequest {
    let contents: Vec<Content> = conversation_turns(&request.history, &request.user_text)
        .iter()
        .map(|turn| text_content(Some(turn.role.as_str()), &turn.text))
        .collect();

    let tools = if cfg.grounding {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    } else {
        Vec::new()
    };

    GenerateContentRequest {
        contents,
        system_instruction: text_content(None, &system_instruction(cfg, request.mode)),
        tools,
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

fn is_block_reason(finish_reason: &str) -> bool {
    matches!(
        finish_reason,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
    )
}

fn into_completion(parsed: GenerateContentResponse) -> CompletionResult {
    let Some(candidate) = parsed.candidates.into_iter().next() else {
        if let Some(reason) = parsed.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(CompletionFailure::Blocked(reason));
        }
        return Err(CompletionFailure::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason {
            Some(reason) if is_block_reason(&reason) => Err(CompletionFailure::Blocked(reason)),
            _ => Err(CompletionFailure::EmptyResponse),
        };
    }

    let citations = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .unwrap_or_default();

    Ok(Completion { text, citations })
}

pub async fn complete(
    client: &Client,
    cfg: &Config,
    request: &CompletionRequest,
) -> CompletionResult {
    let Some(api_key) = cfg.api_key.as_ref() else {
        return Err(CompletionFailure::Configuration(
            "GEMINI_API_KEY is not set. Export it or add it to .env.".to_string(),
        ));
    };

    let api_url = generate_url(&cfg.model_base_url, &cfg.model);
    let body = build_request(cfg, request);
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        content_count = body.contents.len(),
        grounding = cfg.grounding,
        mode = request.mode.as_str(),
        "sending gemini generateContent request"
    );

    let response = client
        .post(&api_url)
        .header("x-goog-api-key", api_key.expose())
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "gemini request failed"
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
            "gemini returned non-success status"
        );
        return Err(CompletionFailure::Api {
            status: status.as_u16(),
            message: api_error_message(&response_body),
        });
    }

    let parsed: GenerateContentResponse = response
        .json()
        .await
        .map_err(|err| CompletionFailure::Malformed(err.to_string()))?;
    let completion = into_completion(parsed)?;
    debug!(
        model = %cfg.model,
        response_len = completion.text.len(),
        citation_count = completion.citations.len(),
        "received gemini completion"
    );
    Ok(completion)
}
