//! Command line front end
//!
//! Thin presentation layer over `RequestOrchestrator`: everything typed here
//! goes through `submit_query`.

use crate::chat::{ChatError, ChatService, HttpChatService, LoggingChatService};
use crate::config::{ClientConfig, ConfigError, ThreadMode};
use crate::conversation::{Message, MessageStatus, Role};
use crate::runtime::{
    IgnoreReason, RequestOrchestrator, SessionConfig, Submission, QUICK_QUESTIONS,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::time::Duration;
use thiserror::Error;

type Orchestrator = RequestOrchestrator<LoggingChatService<HttpChatService>>;

/// Errors surfaced by the binary
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("readline error: {0}")]
    Readline(#[from] ReadlineError),
    #[error("failed to encode transcript: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("question is empty; usage: camfeed-chat ask <QUERY>...")]
    EmptyQuery,
}

/// Chat client for the Camera Feed Query assistant
#[derive(Parser, Debug)]
#[command(name = "camfeed-chat", version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the assistant service (overrides CAMFEED_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request deadline in seconds, 0 to wait indefinitely
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Send the conversation id as thread_id with every query
    #[arg(long, global = true)]
    pub threaded: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive conversation (default).
    Chat,
    /// Ask a single question and print the answer.
    Ask {
        /// The question to send
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Run every quick question in order.
    Demo,
    /// Show service health and documentation links.
    Info,
    /// List the quick questions.
    Questions,
}

impl Cli {
    /// Merge CLI overrides into the environment configuration
    pub fn resolve_config(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if self.threaded {
            config.thread_mode = ThreadMode::PerConversation;
        }
        config
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config(ClientConfig::from_env()?);
    tracing::debug!(?config, "Configuration resolved");

    let service = LoggingChatService::new(HttpChatService::new(
        &config.api_base_url,
        config.connect_timeout,
    )?);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let orch = RequestOrchestrator::new(service, SessionConfig::from(&config));
            interactive(&orch).await
        }
        Command::Ask { query } => {
            let query = join_query(&query)?;
            let orch = RequestOrchestrator::new(service, SessionConfig::from(&config));
            ask(&orch, &query).await;
            Ok(())
        }
        Command::Demo => {
            let orch = RequestOrchestrator::new(service, SessionConfig::from(&config));
            demo(&orch).await;
            Ok(())
        }
        Command::Info => {
            info(&service, &config).await;
            Ok(())
        }
        Command::Questions => {
            print_questions();
            Ok(())
        }
    }
}

async fn interactive(orch: &Orchestrator) -> Result<(), CliError> {
    let mut rl = DefaultEditor::new()?;

    println!("{}", "Camera Feed Query Assistant".bold().green());
    println!(
        "Type {} to exit, {} for the transcript, {} to ask a quick question.\n",
        "/quit".yellow(),
        "/transcript".yellow(),
        "/1 to /5".yellow()
    );
    for message in orch.snapshot().await {
        println!("{}\n", render(&message));
    }
    print_questions();
    println!();

    let prompt = format!("{}> ", "you".cyan());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(trimmed) {
                    tracing::debug!(error = %e, "Failed to record history entry");
                }

                match parse_input(trimmed) {
                    Input::Quit => break,
                    Input::Transcript => {
                        println!("{}", serde_json::to_string_pretty(&orch.snapshot().await)?);
                    }
                    Input::Quick(index) => match QUICK_QUESTIONS.get(index) {
                        Some(question) => {
                            println!("{} {question}", "you:".cyan().bold());
                            submit_and_print(orch, question).await;
                        }
                        None => eprintln!(
                            "{}: choose a question between 1 and {}",
                            "error".red(),
                            QUICK_QUESTIONS.len()
                        ),
                    },
                    Input::Query(text) => submit_and_print(orch, text).await,
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    orch.discard();
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Join `ask` arguments into one query, rejecting blank input
fn join_query(words: &[String]) -> Result<String, CliError> {
    let query = words.join(" ");
    if query.trim().is_empty() {
        return Err(CliError::EmptyQuery);
    }
    Ok(query)
}

async fn ask(orch: &Orchestrator, query: &str) {
    if let Some(message) = submit(orch, query).await {
        println!("{}", message.text);
    }
}

async fn demo(orch: &Orchestrator) {
    for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
        println!("{} {question}", format!("[{}]", i + 1).yellow());
        if let Some(message) = submit(orch, question).await {
            println!("{}\n", render(&message));
        }
    }
}

async fn info(service: &impl ChatService, config: &ClientConfig) {
    println!("{} {}", "service:".bold(), service.endpoint());
    match service.health().await {
        Ok(status) if status.is_healthy() => println!(
            "{} {} ({})",
            "health:".bold(),
            status.status.as_str().green(),
            status.service.as_deref().unwrap_or("unknown service")
        ),
        Ok(status) => println!("{} {}", "health:".bold(), status.status.as_str().yellow()),
        Err(e) => println!("{} {} ({e})", "health:".bold(), "unreachable".red()),
    }
    println!("{} {}", "health endpoint:".bold(), config.health_url());
    println!("{} {}", "api docs:".bold(), config.docs_url());
}

fn print_questions() {
    println!("{}", "Quick questions:".bold());
    for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
        println!("  {} {question}", format!("/{}", i + 1).yellow());
    }
}

async fn submit_and_print(orch: &Orchestrator, text: &str) {
    println!("{}", "thinking...".dimmed());
    if let Some(message) = submit(orch, text).await {
        println!("{}\n", render(&message));
    }
}

/// Submit and return the finalized assistant message, if any
async fn submit(orch: &Orchestrator, text: &str) -> Option<Message> {
    match orch.submit_query(text).await {
        Submission::Resolved { message_id, .. } => orch
            .snapshot()
            .await
            .into_iter()
            .find(|m| m.id == message_id),
        Submission::Ignored(IgnoreReason::AwaitingResponse) => {
            eprintln!("{}", "still waiting for the previous answer".yellow());
            None
        }
        Submission::Ignored(_) | Submission::Abandoned { .. } => None,
    }
}

fn render(message: &Message) -> String {
    let label = match message.role {
        Role::User => "you:".cyan().bold(),
        Role::Assistant => "assistant:".green().bold(),
    };
    match message.status {
        MessageStatus::Final => format!("{label} {}", message.text),
        MessageStatus::Pending => format!("{label} {}", "...".dimmed()),
    }
}

/// A parsed REPL line
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Transcript,
    /// Zero-based quick question index
    Quick(usize),
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line {
        "/quit" | "/exit" => Input::Quit,
        "/transcript" => Input::Transcript,
        _ => match line.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
            Some(n) => Input::Quick(n.wrapping_sub(1)),
            None => Input::Query(line),
        },
    }
}
