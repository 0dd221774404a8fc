mod logging;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use medassist_core::{AgentError, AgentEvent, LoopStatus};
use medassist_llm::Config;
use medassist_loop::{Conversation, LoopOutput};

#[derive(Parser)]
#[command(name = "medassist")]
#[command(about = "Medical front-desk assistant backed by Gemini")]
#[command(version)]
struct Cli {
    /// Config file (.json or .toml) used instead of the default locations
    #[arg(long, env = "MEDASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Ask a single question
    Ask {
        /// Message content
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let config = load_config(&cli);
    let conversation = Conversation::builder(config)
        .build()
        .context("failed to start conversation")?;

    if cli.debug {
        eprintln!(
            "{}",
            format!("[DEBUG] Session ID: {}", conversation.session_id().await).dimmed()
        );
    }

    match cli.command {
        Commands::Chat => run_interactive_chat(&conversation, cli.debug).await,
        Commands::Ask { message } => {
            let output = run_turn(&conversation, &message, cli.debug).await?;
            print_answer(&output);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) if path.extension().is_some_and(|ext| ext == "json") => {
            Config::load_from(Some(path.as_path()), None)
        }
        Some(path) => Config::load_from(None, Some(path.as_path())),
        None => Config::new(),
    };
    if cli.config.is_some() {
        config.apply_env_overrides(|key| std::env::var(key).ok());
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    config
}

/// Submits one message, printing progress events as they arrive.
///
/// Ctrl-C while the turn is running cancels it.
async fn run_turn(
    conversation: &Conversation,
    message: &str,
    debug: bool,
) -> anyhow::Result<LoopOutput> {
    let (event_tx, mut event_rx) = mpsc::channel::<AgentEvent>(32);
    let cancel_token = CancellationToken::new();

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event, debug);
        }
    });

    let interrupt = {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel_token.cancel();
            }
        })
    };

    let start = Instant::now();
    let result = conversation.submit(message, &event_tx, &cancel_token).await;
    interrupt.abort();
    drop(event_tx);
    let _ = printer.await;

    if debug {
        eprintln!(
            "{}",
            format!("[DEBUG] Turn finished in {:?}", start.elapsed()).dimmed()
        );
    }

    result.map_err(anyhow::Error::from)
}

fn print_event(event: &AgentEvent, debug: bool) {
    match event {
        AgentEvent::ToolStart {
            tool_name,
            arguments,
            ..
        } => {
            println!("{}", format!("🔧 Executing tool: {}", tool_name).yellow());
            if !arguments.as_object().is_some_and(|args| args.is_empty()) {
                println!("{}", format!("   Args: {}", arguments).dimmed());
            }
        }
        AgentEvent::ToolComplete {
            tool_name, result, ..
        } => {
            println!("{}", format!("✅ {} finished", tool_name).green());
            if debug {
                println!("{}", format!("   Result: {}", result).dimmed());
            }
        }
        AgentEvent::ToolError {
            tool_name, error, ..
        } => {
            println!("{}", format!("❌ {} failed: {}", tool_name, error).red());
        }
        AgentEvent::Complete { rounds, .. } => {
            if debug {
                eprintln!(
                    "{}",
                    format!("[DEBUG] Completed after {} tool rounds", rounds).dimmed()
                );
            }
        }
        AgentEvent::Error { message } => {
            if debug {
                eprintln!("{}", format!("[DEBUG] Error event: {}", message).dimmed());
            }
        }
    }
}

fn print_answer(output: &LoopOutput) {
    match output.status {
        LoopStatus::Completed => println!("{}", output.text),
        LoopStatus::RoundLimitExceeded => println!("{}", output.text.yellow()),
    }
}

async fn run_interactive_chat(conversation: &Conversation, debug: bool) -> anyhow::Result<()> {
    println!("{}", "🩺 MedAssist".cyan().bold());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        if input.is_empty() {
            continue;
        }

        match run_turn(conversation, input, debug).await {
            Ok(output) => {
                println!("{}", "Assistant:".green().bold());
                print_answer(&output);
            }
            Err(e) if matches!(e.downcast_ref::<AgentError>(), Some(AgentError::Cancelled)) => {
                println!("{}", "⏹ Cancelled".yellow());
            }
            Err(e) => {
                if debug {
                    eprintln!("{}", format!("[DEBUG] Error: {:?}", e).dimmed());
                }
                println!("{}", format!("❌ Error: {}", e).red());
                if e.downcast_ref::<AgentError>()
                    .is_some_and(AgentError::is_retryable)
                {
                    println!("{}", "   You can try sending that again.".dimmed());
                }
            }
        }

        println!();
    }

    Ok(())
}
