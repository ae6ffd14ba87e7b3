//! Tokoku CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (tables and the session store)
//! tokoku migrate
//!
//! # Grant or revoke the admin role
//! tokoku admin grant -e admin@example.com
//! tokoku admin revoke -e admin@example.com
//!
//! # Load catalog products from YAML
//! tokoku seed products -f products.yaml
//!
//! # Inspect and override orders
//! tokoku orders list --owner customer@example.com
//! tokoku orders show 42
//! tokoku orders set-status 42 cancelled
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tokoku")]
#[command(author, version, about = "Tokoku operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Inspect and override orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing user the admin role
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin to the customer role
    Revoke {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog products
    Products {
        /// YAML file with a `products` list
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders placed by this email
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show one order with its line items
    Show {
        /// Order ID
        id: i64,
    },
    /// Set an order's status, bypassing ownership checks
    SetStatus {
        /// Order ID
        id: i64,
        /// `pending_payment`, `completed` or `cancelled`
        status: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::grant(&email).await?,
            AdminAction::Revoke { email } => commands::admin::revoke(&email).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { owner } => commands::orders::list(owner.as_deref()).await?,
            OrdersAction::Show { id } => commands::orders::show(id).await?,
            OrdersAction::SetStatus { id, status } => {
                commands::orders::set_status(id, &status).await?;
            }
        },
    }
    Ok(())
}
