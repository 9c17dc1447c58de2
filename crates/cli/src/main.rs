//! Stock Proxy CLI - Migrations and request signing.
//!
//! # Usage
//!
//! ```bash
//! # Create the shopify_sessions table
//! sp-cli migrate
//!
//! # Sign an app proxy query for manual testing
//! sp-cli sign shop=demo.myshopify.com variant=123 country=US
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run session database migrations
//! - `sign` - Print a signed app proxy query string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(author, version, about = "Stock proxy CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run session database migrations (reads `DATABASE_URL`)
    Migrate,
    /// Sign app proxy query parameters (reads `SHOPIFY_API_SECRET`)
    Sign {
        /// Query parameters as `key=value`
        #[arg(required = true)]
        params: Vec<String>,

        /// Add `timestamp=<now>` like Shopify does
        #[arg(short, long)]
        timestamp: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sign { params, timestamp } => commands::sign::run(&params, timestamp)?,
    }
    Ok(())
}
