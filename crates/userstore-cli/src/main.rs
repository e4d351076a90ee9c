//! userstore - command line access to the user backend.
//!
//! Loads configuration, builds one shared `DataStore`, and runs a single
//! subcommand against it. JSON results go to stdout, logs to stderr.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use userstore_core::auth::KeyringTokenStore;
use userstore_core::config::base_url_from_origin;
use userstore_core::{
    ApiClient, Config, DataStore, NewUser, TokenProvider, TokenSource, UserId, UserUpdate,
};

#[derive(Debug, Parser)]
#[command(name = "userstore", version, about = "Cached, authenticated access to the user backend")]
struct Cli {
    /// Backend base URL, e.g. https://example.com/
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Page URL whose origin (`<scheme>://<host>/`) serves the backend
    #[arg(long, global = true, conflicts_with = "base_url")]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and print all users
    Users,
    /// Load users and select one by id
    Select { id: UserId },
    /// Create a user
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Update fields of an existing user
    Update {
        id: UserId,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user
    Delete { id: UserId },
    /// Manage the stored bearer token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Debug, Subcommand)]
enum TokenAction {
    /// Save a token to the configured token source
    Set { token: String },
    /// Remove the stored token
    Clear,
    /// Print whether a token is available
    Show,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    apply_url_flags(&mut config, &cli)?;

    run(&config, cli.command).await
}

/// `--base-url` is used as given; `--origin` is reduced to its origin first
fn apply_url_flags(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(ref url) = cli.base_url {
        config.base_url = url.clone();
    } else if let Some(ref page) = cli.origin {
        config.base_url = base_url_from_origin(page)?.to_string();
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<DataStore>> {
    let store = DataStore::shared(ApiClient::from_config(config)?);
    info!(base_url = %store.api().base_url(), "Store ready");
    Ok(store)
}

async fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Users => {
            let store = open_store(config)?;
            store.initialize().await;
            print_json(&store.users())?;
            info!(age = %store.users_age(), "Users cached");
        }
        Command::Select { id } => {
            let store = open_store(config)?;
            store.fetch_all_users().await?;
            store.select_user_by_id(id);
            print_json(&store.selected_user())?;
        }
        Command::Create { email, name, password } => {
            let message = open_store(config)?
                .create_user(&NewUser { email, name, password })
                .await?;
            print_json(&message)?;
        }
        Command::Update { id, email, name, password } => {
            let update = UserUpdate { email, name, password };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass --email, --name or --password");
            }
            let message = open_store(config)?.update_user(id, &update).await?;
            print_json(&message)?;
        }
        Command::Delete { id } => {
            let message = open_store(config)?.delete_user(id).await?;
            print_json(&message)?;
        }
        Command::Token { action } => run_token(config, action)?,
    }
    Ok(())
}

fn run_token(config: &Config, action: TokenAction) -> Result<()> {
    match (config.token_source, action) {
        (TokenSource::File, TokenAction::Set { token }) => {
            let store = config.token_file_store()?;
            store.store(&token)?;
            info!(path = %store.path().display(), "Token saved");
        }
        (TokenSource::File, TokenAction::Clear) => config.token_file_store()?.clear()?,
        (TokenSource::Keyring, TokenAction::Set { token }) => KeyringTokenStore::default().store(&token)?,
        (TokenSource::Keyring, TokenAction::Clear) => KeyringTokenStore::default().clear()?,
        (_, TokenAction::Show) => {
            let present = config.token_provider()?.current_token()?.is_some();
            print_json(&serde_json::json!({ "token_present": present }))?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
