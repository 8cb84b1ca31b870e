use std::path::PathBuf;

use anyhow::Result;
use atrium_core::auth::RegisterRequest;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod render;
mod repl;

use context::ClientContext;

#[derive(Parser)]
#[command(name = "atrium")]
#[command(about = "Chat with Atrium Consulting personas from the terminal", long_about = None)]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true, env = "ATRIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Relay server base URL, overrides the config file
    #[arg(long, global = true, env = "ATRIUM_SERVER_URL")]
    server: Option<String>,

    /// Local state file holding conversations, guest id and token
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat with a persona
    Chat {
        #[arg(short, long, default_value = "strategist")]
        persona: String,
    },
    /// List available personas
    Personas,
    /// Print the stored conversation with a persona
    History {
        #[arg(short, long)]
        persona: String,
    },
    /// Clear the stored conversation with a persona
    Reset {
        #[arg(short, long)]
        persona: String,
    },
    /// Log in and store the access token
    Login {
        email: String,
        /// Prompted for if omitted
        #[arg(long, env = "ATRIUM_PASSWORD")]
        password: Option<String>,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long, env = "ATRIUM_PASSWORD")]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Show the identity behind the stored token
    Whoami,
    /// Forget the stored token
    Logout,
    /// Write a default config.toml
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::InitConfig = cli.command {
        return commands::init_config(cli.config);
    }

    let ctx = ClientContext::load(cli.config, cli.server, cli.state_file)?;

    let result = match cli.command {
        Commands::Chat { persona } => repl::run(&ctx, &persona).await,
        Commands::Personas => commands::personas(&ctx).await,
        Commands::History { persona } => commands::history(&ctx, &persona).await,
        Commands::Reset { persona } => commands::reset(&ctx, &persona).await,
        Commands::Login { email, password } => {
            let password = password_or_prompt(password, || rpassword::prompt_password("password: "))?;
            commands::login(&ctx, &email, &password).await
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            nickname,
        } => {
            let request = RegisterRequest {
                password: password_or_prompt(password, || rpassword::prompt_password("password: "))?,
                email,
                first_name,
                last_name,
                nickname,
            };
            commands::register(&ctx, request).await
        }
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::InitConfig => Ok(()),
    };

    if let Err(e) = &result {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
    Ok(())
}

/// Uses `--password` when given, otherwise asks without echoing input.
fn password_or_prompt<F>(password: Option<String>, prompt: F) -> Result<String>
where
    F: FnOnce() -> std::io::Result<String>,
{
    match password {
        Some(password) => Ok(password),
        None => Ok(prompt()?),
    }
}
