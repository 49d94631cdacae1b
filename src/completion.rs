use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::error::CompletionFailure;
use crate::model::{Citation, Message, ResponseMode};
use crate::providers;

/// Everything a provider needs for one completion: prior turns, the new
/// utterance and the mode that shapes the instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub user_text: String,
    pub history: Vec<Message>,
    pub mode: ResponseMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub text: String,
    pub citations: Vec<Citation>,
}

pub type CompletionResult = Result<Completion, CompletionFailure>;

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = CompletionResult> + 'a>>;

pub trait CompletionClient {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a>;
}

type BackendFuture<'a> = Pin<Box<dyn Future<Output = CompletionResult> + 'a>>;

trait CompletionBackend {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a CompletionRequest,
    ) -> BackendFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderBackend;

impl CompletionBackend for ProviderBackend {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a CompletionRequest,
    ) -> BackendFuture<'a> {
        Box::pin(async move { providers::complete(client, cfg, request).await })
    }
}

/// Completion client backed by the HTTP provider selected in `Config`.
pub struct HostCompletionClient<'a, B = ProviderBackend> {
    client: &'a Client,
    cfg: &'a Config,
    backend: B,
}

impl<'a> HostCompletionClient<'a, ProviderBackend> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self {
            client,
            cfg,
            backend: ProviderBackend,
        }
    }
}

impl<'a, B> HostCompletionClient<'a, B> {
    #[cfg(test)]
    fn with_backend(client: &'a Client, cfg: &'a Config, backend: B) -> Self {
        Self {
            client,
            cfg,
            backend,
        }
    }
}

impl<'a, B> CompletionClient for HostCompletionClient<'a, B>
where
    B: CompletionBackend,
{
    fn complete<'b>(&'b self, request: CompletionRequest) -> CompletionFuture<'b> {
        Box::pin(async move {
            self.backend
                .complete(self.client, self.cfg, &request)
                .await
        })
    }
}
