use anyhow::{Context, Result};
use std::fmt::Display;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::completion::{CompletionClient, CompletionFuture, CompletionResult};
use crate::config::Config;
use crate::controller::Conversation;
use crate::model::{Message, ResponseMode};
use crate::render::{render_history_line, render_message};

/// Example questions offered on an empty session.
pub const STARTER_PROMPTS: &[&str] = &[
    "What is the latest US dollar exchange rate?",
    "What was the result of Real Madrid's match last night?",
    "What are today's top technology headlines?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Exit,
    Reset,
    History,
    ToggleMode,
    SetMode(ResponseMode),
    Suggest(Option<usize>),
    Prompt(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let input = line.trim();
    if input.is_empty() {
        return Command::Empty;
    }
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Command::Exit;
    }
    if input.eq_ignore_ascii_case("/reset") {
        return Command::Reset;
    }
    if input.eq_ignore_ascii_case("/history") {
        return Command::History;
    }
    if input.eq_ignore_ascii_case("/mode") {
        return Command::ToggleMode;
    }
    let mut words = input.split_whitespace();
    if words
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("/suggest"))
    {
        let pick = words.next().and_then(|raw| raw.parse::<usize>().ok());
        return Command::Suggest(pick);
    }
    if let Some(mode) = input.strip_prefix('/').and_then(ResponseMode::parse) {
        return Command::SetMode(mode);
    }
    Command::Prompt(input)
}

fn say<W: Write>(out: &mut W, line: impl Display) -> Result<()> {
    writeln!(out, "{line}").context("Failed to write to output")
}

fn prompt<W: Write>(out: &mut W, convo: &Conversation) -> Result<()> {
    write!(out, "[{}]> ", convo.mode().as_str()).context("Failed to write to output")?;
    out.flush().context("Failed to flush output")
}

fn print_suggestions<W: Write>(out: &mut W) -> Result<()> {
    say(
        out,
        "try one of these ('/suggest N' puts it in the draft, Enter sends it):",
    )?;
    for (idx, text) in STARTER_PROMPTS.iter().enumerate() {
        say(out, format_args!("  {}. {}", idx + 1, text))?;
    }
    Ok(())
}

fn print_history<W: Write>(out: &mut W, history: &[Message]) -> Result<()> {
    if history.is_empty() {
        return say(out, "(history is empty)\n");
    }

    for (idx, msg) in history.iter().enumerate() {
        say(out, render_history_line(idx, msg))?;
    }
    say(out, "")
}

async fn next_settled(in_flight: &mut Option<CompletionFuture<'_>>) -> CompletionResult {
    match in_flight.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn print_settled<W: Write>(
    out: &mut W,
    convo: &mut Conversation,
    result: CompletionResult,
) -> Result<()> {
    match convo.settle(result) {
        Some(msg) => say(out, format_args!("\n{}\n", render_message(msg))),
        None => Ok(()),
    }
}

/// Interactive chat on stdin/stdout.
pub async fn run_repl<C>(client: &C, cfg: &Config) -> Result<()>
where
    C: CompletionClient + ?Sized,
{
    let input = BufReader::new(tokio::io::stdin());
    run_session(client, cfg, input, &mut io::stdout()).await?;
    Ok(())
}

/// Line-oriented chat loop. Input keeps being read while an answer is in
/// flight; new prompts are turned away until it lands. Returns the final
/// conversation once input ends or the user exits, after any in-flight
/// answer has been applied.
pub async fn run_session<C, R, W>(
    client: &C,
    cfg: &Config,
    input: R,
    out: &mut W,
) -> Result<Conversation>
where
    C: CompletionClient + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut convo = Conversation::new(cfg.response_mode, cfg.error_fallback_message.clone());
    let mut lines = input.lines();
    let mut in_flight: Option<CompletionFuture<'_>> = None;

    say(out, "ramai web-grounded chat")?;
    say(out, format_args!("model: {} ({})", cfg.model, cfg.model_provider))?;
    say(
        out,
        "type a question, '/concise' or '/detailed' to pick the answer length, '/mode' to toggle, \
         '/history' to list messages, '/reset' to start over, or 'exit' to quit",
    )?;
    print_suggestions(out)?;
    prompt(out, &convo)?;

    loop {
        tokio::select! {
            result = next_settled(&mut in_flight) => {
                in_flight = None;
                print_settled(out, &mut convo, result)?;
                prompt(out, &convo)?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };

                let submit = match parse_command(&line) {
                    Command::Empty => !convo.draft().trim().is_empty(),
                    Command::Exit => break,
                    Command::Reset if convo.is_pending() => {
                        say(out, "wait for the current answer before resetting")?;
                        false
                    }
                    Command::Reset => {
                        convo = Conversation::new(convo.mode(), cfg.error_fallback_message.clone());
                        say(out, "conversation reset\n")?;
                        print_suggestions(out)?;
                        false
                    }
                    Command::History => {
                        print_history(out, convo.messages())?;
                        false
                    }
                    Command::ToggleMode => {
                        let mode = convo.toggle_mode();
                        say(out, format_args!("response mode: {}", mode.as_str()))?;
                        false
                    }
                    Command::SetMode(mode) => {
                        convo.set_mode(mode);
                        say(out, format_args!("response mode: {}", mode.as_str()))?;
                        false
                    }
                    Command::Suggest(None) => {
                        print_suggestions(out)?;
                        false
                    }
                    Command::Suggest(Some(pick)) => {
                        match pick.checked_sub(1).and_then(|idx| STARTER_PROMPTS.get(idx)) {
                            Some(text) => {
                                convo.set_draft(*text);
                                say(out, format_args!("draft: {text} (press Enter to send)"))?;
                            }
                            None => say(
                                out,
                                format_args!(
                                    "no suggestion {pick}; pick 1-{}",
                                    STARTER_PROMPTS.len()
                                ),
                            )?,
                        }
                        false
                    }
                    Command::Prompt(text) => {
                        convo.set_draft(text);
                        true
                    }
                };

                if submit {
                    match convo.begin_draft() {
                        Some(request) => {
                            debug!(mode = request.mode.as_str(), "submitting prompt");
                            in_flight = Some(client.complete(request));
                            say(out, "searching and thinking...")?;
                        }
                        None => say(
                            out,
                            "still waiting for the previous answer; it stays in the draft",
                        )?,
                    }
                }

                if in_flight.is_none() {
                    prompt(out, &convo)?;
                }
            }
        }
    }

    if let Some(fut) = in_flight.take() {
        let result = fut.await;
        print_settled(out, &mut convo, result)?;
    }

    Ok(convo)
}
