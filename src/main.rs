use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod app;
mod chat;
mod config;
mod groq;
mod handler;
mod tui;
mod ui;

use app::App;
use chat::{Conversation, Failure};
use config::Config;
use groq::{GroqClient, DEFAULT_MODEL};

#[derive(Parser)]
#[command(name = "conversa")]
#[command(about = "Terminal chat for Groq language models", version)]
struct Cli {
    /// Model to use (overrides the configured default)
    #[arg(short, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// List models available on the API
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command {
        Some(Commands::Ask { question }) => {
            init_cli_tracing()?;
            ask(&config, cli.model, &question).await?;
        }
        Some(Commands::Models) => {
            init_cli_tracing()?;
            list_models(&config).await?;
        }
        None => run_tui(config, cli.model).await?,
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
}

fn init_cli_tracing() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// The terminal belongs to ratatui while the TUI runs, so diagnostics go
/// to a log file under the config directory instead.
fn init_tui_tracing() -> Result<()> {
    let dir = Config::dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = std::sync::Arc::new(std::fs::File::create(dir.join("conversa.log"))?);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .with_writer(file)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run_tui(config: Config, model: Option<String>) -> Result<()> {
    init_tui_tracing()?;

    let mut app = App::new(&config, model)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(Duration::from_millis(250));

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    tui::restore()?;
    Ok(())
}

async fn ask(config: &Config, model: Option<String>, question: &str) -> Result<()> {
    let client = client_from(config)?;
    let model = model
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut conversation = Conversation::new();
    conversation.set_draft(question);
    let payload = conversation
        .begin_turn()
        .ok_or_else(|| anyhow!("question is empty"))?;

    println!("🤖 Consultando {}...\n", model.bold().magenta());

    match client.chat(&model, &payload).await {
        Ok(Some(reply)) => println!("{}", reply),
        Ok(None) => println!("{}", Failure::Generation.placeholder().red()),
        Err(e) => {
            println!("{}", Failure::Communication.placeholder().red());
            println!("{}: {}", "Detalhe".dimmed(), e);
        }
    }

    Ok(())
}

async fn list_models(config: &Config) -> Result<()> {
    let client = client_from(config)?;

    println!("\n{}", "🤖 Modelos disponíveis".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    match client.list_models().await {
        Ok(models) => {
            for model in models {
                println!("  • {}", model.green());
            }
        }
        Err(e) => {
            println!("{}: {}", "Erro ao listar modelos".red(), e);
        }
    }

    Ok(())
}

fn client_from(config: &Config) -> Result<GroqClient> {
    let key = config.resolve_api_key().ok_or_else(|| {
        anyhow!(
            "no API key found: set {} or add api_key to the config file",
            config::API_KEY_ENV
        )
    })?;
    GroqClient::new(&key)
}
