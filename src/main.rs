//! kanbansync CLI
//!
//! Operates on a board database the same way the API does, acting as one
//! user.
//!
//! # Commands
//!
//! - `add-user` - Find or create a user for a provider login
//! - `register` - Create an unverified email/password account
//! - `verify` - Verify an account with its emailed token
//! - `list` - List the user's boards
//! - `show` - Print a full board as JSON
//! - `sync` - Apply a sync payload file
//! - `import` - Import a board export file from the web client
//! - `delete` - Delete a board

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use kanbansync_lib::commands::{boards, users};
use kanbansync_lib::migrations::board_export::{snapshot_from_export, ImportTarget};
use kanbansync_lib::{Config, SyncPayload, UserId};

/// Personal Kanban board database tools.
#[derive(Parser)]
#[command(name = "kanbansync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file (defaults to DATABASE_PATH or kanban.db)
    #[arg(global = true, short, long)]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find or create the user for a provider login and print it
    AddUser {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "local")]
        provider: String,
        #[arg(long)]
        provider_id: String,
    },

    /// Create an unverified email/password account and print its token
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        /// Password hash produced by the auth layer
        #[arg(long)]
        password_hash: String,
        /// Hours until the verification token expires
        #[arg(long, default_value_t = 24)]
        expires_in_hours: i64,
    },

    /// Verify an account with its verification token
    Verify { token: String },

    /// List boards owned by a user
    List {
        #[arg(short, long)]
        user: UserId,
    },

    /// Print a full board as JSON
    Show {
        #[arg(short, long)]
        user: UserId,
        board: String,
    },

    /// Apply a sync payload ({"boards": [...]}) from a file
    Sync {
        #[arg(short, long)]
        user: UserId,
        file: PathBuf,
    },

    /// Import a board export file as a new board
    Import {
        #[arg(short, long)]
        user: UserId,
        file: PathBuf,
    },

    /// Delete a board
    Delete {
        #[arg(short, long)]
        user: UserId,
        board: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env();
    if let Some(path) = cli.database {
        config = config.with_database_path(path);
    }
    let ctx = kanbansync_lib::open(&config)?;

    match cli.command {
        Commands::AddUser {
            email,
            name,
            provider,
            provider_id,
        } => {
            let user = users::login_with_provider(&ctx, &email, &name, &provider, &provider_id)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::Register {
            email,
            name,
            password_hash,
            expires_in_hours,
        } => {
            let token = Uuid::new_v4().to_string();
            let expires = Utc::now() + Duration::hours(expires_in_hours);
            let user = users::register(&ctx, &email, &password_hash, &name, &token, expires)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            println!("verification token: {token}");
        }
        Commands::Verify { token } => {
            let user = users::verify_email(&ctx, &token, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Commands::List { user } => {
            let boards = boards::get_boards(&ctx, user)?;
            println!("{}", serde_json::to_string_pretty(&boards)?);
        }
        Commands::Show { user, board } => {
            let board = boards::get_full_board(&ctx, user, &board)?;
            println!("{}", serde_json::to_string_pretty(&board)?);
        }
        Commands::Sync { user, file } => {
            let body = fs::read_to_string(&file)?;
            let response = boards::sync(&ctx, user, &body)?;
            println!("{}", serde_json::to_string(&response)?);
        }
        Commands::Import { user, file } => {
            let content = fs::read_to_string(&file)?;
            let fallback = file
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::trim)
                .filter(|stem| !stem.is_empty())
                .unwrap_or("Imported board");
            let snapshot = snapshot_from_export(&content, &ImportTarget::new(fallback))?;
            let board_id = snapshot.id;
            ctx.reconciler.sync_boards(
                user,
                &SyncPayload {
                    boards: vec![snapshot],
                },
            )?;
            println!("{board_id}");
        }
        Commands::Delete { user, board } => {
            boards::delete_board(&ctx, user, &board)?;
        }
    }

    Ok(())
}
