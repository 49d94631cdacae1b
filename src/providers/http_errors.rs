use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::CompletionFailure;

fn error_chain_matches(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::TimedOut, "timed out")
}

/// Turns a transport-level reqwest error into a failure the user can act on.
pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: Option<u64>,
) -> CompletionFailure {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        let after = timeout_secs
            .map(|secs| format!(" after {secs}s"))
            .unwrap_or_default();
        return CompletionFailure::Network(format!(
            "Model request timed out{after} while calling '{api_url}'. \
             Increase MODEL_TIMEOUT_SECS or check model responsiveness."
        ));
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return CompletionFailure::Network(format!(
                "Connection refused by model API at '{api_url}'. \
                 Ensure the model provider is reachable and MODEL_BASE_URL is correct."
            ));
        }

        return CompletionFailure::Network(format!(
            "Failed to connect to model API at '{api_url}'. \
             Check MODEL_BASE_URL and network connectivity."
        ));
    }

    CompletionFailure::Network(format!("Failed to call model API at '{api_url}': {err}"))
}
