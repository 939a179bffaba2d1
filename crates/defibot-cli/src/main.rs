//! defibot CLI — interactive chat, onboarding, and status commands.
//!
//! Usage:
//!   defibot chat             — Start an interactive chat session
//!   defibot onboard          — Create a default configuration
//!   defibot status           — Show current configuration
//!   defibot sessions         — List or delete saved sessions

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::time::Duration;

use defibot_core::config::Config;
use defibot_core::dialog::DialogManager;
use defibot_core::provider::openai::OpenAiProvider;
use defibot_core::recognizer::{IntentRecognizer, LocalRecognizer, RemoteRecognizer, Strategy};
use defibot_core::session::SessionManager;

#[derive(Parser)]
#[command(
    name = "defibot",
    version,
    about = "A conversational assistant for Aptos DeFi actions",
    long_about = "defibot — create pools and tokens, join pools and look up info by chatting.\n\nEvery action is summarized and needs an explicit yes before it is considered ready."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Session name (default: "default")
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Intent recognizer: local or remote (overrides config)
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Model for the remote recognizer (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Create or reset the default configuration
    Onboard,

    /// Show configuration status
    Status,

    /// Manage conversation sessions
    Sessions {
        #[command(subcommand)]
        action: Option<SessionCommands>,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List all sessions
    List,
    /// Delete a session
    Delete {
        /// Session key
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep chat output clean unless RUST_LOG asks for more.
    let default_level = match cli.command {
        Some(Commands::Chat { .. }) | None => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Some(Commands::Chat {
            session,
            strategy,
            model,
        }) => cmd_chat(&session, strategy, model).await?,
        Some(Commands::Onboard) => cmd_onboard()?,
        Some(Commands::Status) => cmd_status()?,
        Some(Commands::Sessions { action }) => cmd_sessions(action)?,
        None => cmd_chat("default", None, None).await?,
    }

    Ok(())
}

// ── Shared Setup ────────────────────────────────────────────────────

fn validate_config(config: &Config, strategy: Strategy) -> Result<()> {
    if let Err(errors) = config.validate(strategy) {
        eprintln!("\n  \x1b[31m❌ Configuration errors:\x1b[0m");
        for e in &errors {
            eprintln!("     • {}", e);
        }
        eprintln!();
        anyhow::bail!("Fix the above {} error(s) before starting", errors.len());
    }
    Ok(())
}

/// Build the recognizer for `strategy`. The remote strategy needs an API
/// key; its absence is fatal.
fn setup_recognizer(
    config: &Config,
    strategy: Strategy,
    model_override: Option<String>,
) -> Result<Box<dyn IntentRecognizer>> {
    match strategy {
        Strategy::Local => Ok(Box::new(LocalRecognizer::new())),
        Strategy::Remote => {
            let api_key = config.require_api_key()?;
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.provider.timeout_seconds))
                .build()?;
            let provider = OpenAiProvider::new(
                &config.provider.name,
                api_key,
                config.provider.api_base.as_deref(),
                &config.provider.model,
                client,
            );
            let recognizer = RemoteRecognizer::new(Box::new(provider))
                .with_model(model_override)
                .with_sampling(config.provider.max_tokens, config.provider.temperature);
            Ok(Box::new(recognizer))
        }
    }
}

// ── Chat Command ────────────────────────────────────────────────────

async fn cmd_chat(
    session_key: &str,
    strategy_override: Option<Strategy>,
    model_override: Option<String>,
) -> Result<()> {
    let config = Config::load()?;
    let strategy = strategy_override.unwrap_or(config.recognizer.strategy);
    validate_config(&config, strategy)?;

    let model = model_override
        .clone()
        .unwrap_or_else(|| config.provider.model.clone());
    let manager = DialogManager::new(setup_recognizer(&config, strategy, model_override)?);
    let mut sessions = SessionManager::new(&config.sessions_path());

    println!();
    println!("  🪙 defibot v{}", env!("CARGO_PKG_VERSION"));
    match strategy {
        Strategy::Local => println!("  Recognizer: {}", manager.recognizer_name()),
        Strategy::Remote => println!(
            "  Recognizer: {} | Provider: {} | Model: {}",
            manager.recognizer_name(),
            config.provider.name,
            model
        ),
    }
    println!("  Session: {}", session_key);
    println!();
    println!("  Welcome to Aptos Assistant DeFi Suite chatbot!");
    println!("  Type your message, /reset to start over, or /quit to exit.");
    println!("  ─────────────────────────────────────");
    println!();

    let stdin = io::stdin();
    loop {
        print!("  \x1b[36m>\x1b[0m ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" | "/q" => {
                println!("  Goodbye! 👋");
                break;
            }
            "/reset" => {
                sessions.get_or_create(session_key).clear();
                sessions.save(session_key)?;
                println!("  Session cleared.");
                continue;
            }
            "/state" => {
                let session = sessions.get_or_create(session_key);
                println!("  Phase: {}", session.state.phase());
                continue;
            }
            _ => {}
        }

        let session = sessions.get_or_create(session_key);
        let turn = manager.handle(&mut session.state, input).await;
        session.add_message("user", input);
        session.add_message("assistant", &turn.reply);

        println!("\n  \x1b[32m{}\x1b[0m\n", turn.reply);

        if let Some(action) = &turn.confirmed {
            // Hand-off point for on-chain execution.
            tracing::info!(
                intent = %action.intent,
                entities = ?action.entities,
                "Action ready for execution"
            );
        }

        if let Err(e) = sessions.save(session_key) {
            tracing::warn!(session = session_key, error = %e, "Failed to save session");
        }
    }

    Ok(())
}

// ── Onboard Command ─────────────────────────────────────────────────

fn cmd_onboard() -> Result<()> {
    let path = Config::write_default_template()?;
    println!();
    println!("  ✅ Configuration created at:");
    println!("     {}", path.display());
    println!();
    println!("  Next steps:");
    println!("  1. For the LLM recognizer, add your API key (or set OPENAI_API_KEY)");
    println!("     and set recognizer.strategy to \"remote\"");
    println!("  2. Run `defibot chat` to start chatting");
    println!();
    Ok(())
}

// ── Status Command ──────────────────────────────────────────────────

fn cmd_status() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load()?;

    println!();
    println!("  🪙 defibot status");
    println!("  ─────────────────────────────────────");

    if config_path.exists() {
        println!("  Config:     {}", config_path.display());
    } else {
        println!("  Config:     ⚠️  Not found, using defaults (run `defibot onboard`)");
    }

    println!("  Recognizer: {}", config.recognizer.strategy);
    match config.require_api_key() {
        Ok(_) => println!("  API key:    ✅ {} configured", config.provider.name),
        Err(_) => println!("  API key:    ❌ Not configured (needed for the remote recognizer)"),
    }
    println!("  Model:      {}", config.provider.model);

    let sessions = SessionManager::new(&config.sessions_path());
    println!(
        "  Sessions:   {} saved in {}",
        sessions.list_sessions().len(),
        config.sessions_path().display()
    );

    println!();
    Ok(())
}

// ── Session Commands ────────────────────────────────────────────────

fn cmd_sessions(action: Option<SessionCommands>) -> Result<()> {
    let config = Config::load()?;
    let mut mgr = SessionManager::new(&config.sessions_path());

    match action {
        Some(SessionCommands::Delete { key }) => {
            if mgr.delete(&key) {
                println!("  ✅ Session deleted: {}", key);
            } else {
                println!("  ❌ Session not found: {}", key);
            }
        }
        Some(SessionCommands::List) | None => {
            let sessions = mgr.list_sessions();
            if sessions.is_empty() {
                println!("  No saved sessions.");
            } else {
                println!();
                for (key, updated) in sessions {
                    println!("  📝 {} (updated: {})", key, updated);
                }
                println!();
            }
        }
    }

    Ok(())
}
