use std::env;
use std::fmt;

use crate::model::ResponseMode;

const DEFAULT_MODEL_PROVIDER: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_SYSTEM_PROMPT: &str = "You are RAM AI, a helpful assistant. Search the web \
     when a question depends on current information, and answer in the language the user \
     writes in.";
const DEFAULT_GROUNDING: bool = true;
const DEFAULT_ERROR_FALLBACK_MESSAGE: &str = "Unknown error";

/// Model API credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model_provider: String,
    pub model: String,
    pub model_base_url: String,
    pub api_key: Option<ApiKey>,
    pub system_prompt: String,
    pub model_timeout_secs: Option<u64>,
    pub response_mode: ResponseMode,
    pub grounding: bool,
    pub error_fallback_message: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_provider =
            get_var("MODEL_PROVIDER").unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string());
        let model_base_url = non_empty(get_var("MODEL_BASE_URL"))
            .unwrap_or_else(|| default_base_url(&model_provider).to_string());
        let api_key = non_empty(get_var("GEMINI_API_KEY"))
            .or_else(|| non_empty(get_var("API_KEY")))
            .map(ApiKey::new);

        Self {
            model: get_var("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url,
            api_key,
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            model_timeout_secs: parse_positive_u64(get_var("MODEL_TIMEOUT_SECS").as_deref()),
            response_mode: parse_response_mode(get_var("RESPONSE_MODE").as_deref()),
            grounding: parse_bool(get_var("GROUNDING").as_deref(), DEFAULT_GROUNDING),
            error_fallback_message: non_empty(get_var("ERROR_FALLBACK_MESSAGE"))
                .unwrap_or_else(|| DEFAULT_ERROR_FALLBACK_MESSAGE.to_string()),
            model_provider,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    if provider.trim().eq_ignore_ascii_case("ollama") {
        DEFAULT_OLLAMA_BASE_URL
    } else {
        DEFAULT_GEMINI_BASE_URL
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_positive_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn parse_response_mode(raw: Option<&str>) -> ResponseMode {
    raw.and_then(ResponseMode::parse).unwrap_or_default()
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
