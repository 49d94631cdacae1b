use tracing::{debug, warn};

use crate::completion::{CompletionClient, CompletionRequest, CompletionResult};
use crate::model::{Message, ResponseMode};

/// Conversation state for one session: the append-only message list, the
/// single-request gate and the selected response mode.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    mode: ResponseMode,
    draft: String,
    fallback_error: String,
}

impl Conversation {
    pub fn new(mode: ResponseMode, fallback_error: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
            mode,
            draft: String::new(),
            fallback_error: fallback_error.into(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Applies to the next submission only.
    pub fn set_mode(&mut self, mode: ResponseMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> ResponseMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Admits a user turn. Returns `None` without touching any state when the
    /// text is blank or a request is already in flight.
    pub fn begin_turn(&mut self, text: &str) -> Option<CompletionRequest> {
        let user_text = text.trim();
        if user_text.is_empty() {
            debug!("ignoring empty submission");
            return None;
        }
        if self.pending {
            debug!("ignoring submission while a request is pending");
            return None;
        }

        let history = self.messages.clone();
        self.messages.push(Message::user(user_text));
        self.pending = true;
        self.draft.clear();

        Some(CompletionRequest {
            user_text: user_text.to_string(),
            history,
            mode: self.mode,
        })
    }

    /// Admits the draft buffer as a user turn. The draft is left untouched
    /// when the turn is refused.
    pub fn begin_draft(&mut self) -> Option<CompletionRequest> {
        let text = self.draft.clone();
        self.begin_turn(&text)
    }

    /// Records the outcome of the pending request and reopens the gate.
    pub fn settle(&mut self, result: CompletionResult) -> Option<&Message> {
        if !self.pending {
            warn!("completion settled with no pending request; ignoring");
            return None;
        }

        let message = match result {
            Ok(completion) => Message::model(completion.text, completion.citations),
            Err(failure) => {
                let reason = failure.to_string();
                warn!(error = %reason, "completion failed");
                if reason.trim().is_empty() {
                    Message::error(self.fallback_error.clone())
                } else {
                    Message::error(reason)
                }
            }
        };
        self.messages.push(message);
        self.pending = false;
        self.messages.last()
    }

    pub async fn submit<C>(&mut self, client: &C, text: &str) -> Option<&Message>
    where
        C: CompletionClient + ?Sized,
    {
        let request = self.begin_turn(text)?;
        let result = client.complete(request).await;
        self.settle(result)
    }

    /// Submits whatever is in the draft buffer.
    pub async fn submit_draft<C>(&mut self, client: &C) -> Option<&Message>
    where
        C: CompletionClient + ?Sized,
    {
        let request = self.begin_draft()?;
        let result = client.complete(request).await;
        self.settle(result)
    }
}
