/// Why a completion request produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionFailure {
    #[error("{0}")]
    Network(String),
    #[error("Model request failed with status {}{}", .status, detail_suffix(.message))]
    Api { status: u16, message: String },
    #[error("Model response was blocked: {0}")]
    Blocked(String),
    #[error("Model returned an empty response")]
    EmptyResponse,
    #[error("Failed to parse model response: {0}")]
    Malformed(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Other(String),
}

fn detail_suffix(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}
