pub mod gemini;
pub(crate) mod http_errors;
pub mod ollama;
#[cfg(test)]
pub(crate) mod test_support;

use reqwest::Client;
use tracing::{debug, warn};

use crate::completion::{CompletionRequest, CompletionResult};
use crate::config::Config;
use crate::error::CompletionFailure;
use crate::model::{Message, ResponseMode, Role};

pub async fn complete(
    client: &Client,
    cfg: &Config,
    request: &CompletionRequest,
) -> CompletionResult {
    let provider = cfg.model_provider.trim().to_ascii_lowercase();
    debug!(
        provider = %provider,
        model = %cfg.model,
        history_len = request.history.len(),
        mode = request.mode.as_str(),
        "dispatching completion request"
    );

    match provider.as_str() {
        "gemini" => gemini::complete(client, cfg, request).await,
        "ollama" => ollama::complete(client, cfg, request).await,
        other => {
            warn!(provider = %other, "unsupported model provider configured");
            Err(CompletionFailure::Configuration(format!(
                "Unsupported MODEL_PROVIDER='{other}'. Supported providers: gemini, ollama."
            )))
        }
    }
}

/// Base system prompt followed by the mode's length/depth instruction.
pub(crate) fn system_instruction(cfg: &Config, mode: ResponseMode) -> String {
    let base = cfg.system_prompt.trim();
    if base.is_empty() {
        mode.instruction().to_string()
    } else {
        format!("{base}\n\n{}", mode.instruction())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Turn {
    pub role: Role,
    pub text: String,
}

/// History plus the new utterance as the turns sent to a provider.
///
/// Error bubbles were produced locally and are skipped. A user turn whose
/// answer failed is folded into the next user turn, so roles always alternate.
pub(crate) fn conversation_turns(history: &[Message], user_text: &str) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::with_capacity(history.len() + 1);
    let valid = history.iter().filter(|msg| !msg.is_error);
    let pending_user = std::iter::once((Role::User, user_text));

    for (role, text) in valid
        .map(|msg| (msg.role, msg.text.as_str()))
        .chain(pending_user)
    {
        match turns.last_mut() {
            Some(last) if last.role == role => {
                last.text.push_str("\n\n");
                last.text.push_str(text);
            }
            _ => turns.push(Turn {
                role,
                text: text.to_string(),
            }),
        }
    }
    turns
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
