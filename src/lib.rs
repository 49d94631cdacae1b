pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod providers;
pub mod render;
pub mod repl;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::info;

use completion::HostCompletionClient;
use config::Config;
use controller::Conversation;
use render::render_message;
use repl::run_repl;

fn build_http_client(cfg: &Config) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = cfg.model_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to initialize HTTP client")
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = Config::from_env();
    info!(
        provider = %cfg.model_provider,
        model = %cfg.model,
        base_url = %cfg.model_base_url,
        api_key_set = cfg.api_key.is_some(),
        response_mode = cfg.response_mode.as_str(),
        grounding = cfg.grounding,
        timeout_secs = ?cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    let http = build_http_client(&cfg)?;
    let client = HostCompletionClient::new(&http, &cfg);

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return run_repl(&client, &cfg).await;
    }

    let mut convo = Conversation::new(cfg.response_mode, cfg.error_fallback_message.clone());
    convo.set_draft(args.join(" "));
    let Some(reply) = convo.submit_draft(&client).await else {
        bail!("Nothing to ask: the prompt is empty");
    };
    if reply.is_error {
        bail!("{}", reply.text);
    }
    println!("{}", render_message(reply));
    Ok(())
}
