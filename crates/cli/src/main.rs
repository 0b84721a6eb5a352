//! eshop CLI - Operator tools for a storefront data directory.
//!
//! # Usage
//!
//! ```bash
//! # Fill an empty data directory with the demo store
//! eshop-cli seed
//!
//! # Replace the demo catalog with one from YAML, overwriting existing data
//! eshop-cli seed --catalog catalog.yaml --force
//!
//! # Work the order queue
//! eshop-cli orders list --status pending
//! eshop-cli orders set-status 1004 processing --notes "Packed"
//!
//! # Move data between installs
//! eshop-cli orders export --output orders.json
//! eshop-cli products import products.json
//! eshop-cli users export --output users.json
//!
//! # Bootstrap an admin (password from ESHOP_ADMIN_PASSWORD)
//! eshop-cli admin create -u owner -n "Store Owner" -e owner@shop.example
//! ```
//!
//! # Environment Variables
//!
//! See `eshop_storefront::config`. `RUST_LOG` overrides the default filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eshop_storefront::config::{SentryConfig, StorefrontConfig};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "eshop-cli")]
#[command(author, version, about = "eshop storefront operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the data directory with the demo store
    Seed {
        /// YAML list of products to use instead of the demo catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Overwrite existing data
        #[arg(long)]
        force: bool,
    },
    /// Work with orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Work with the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Work with customer and staff accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest last
    List {
        /// Only orders in this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Order counts and revenue
    Stats,
    /// Move an order to a new status
    SetStatus {
        id: i32,
        status: String,

        /// Replace the order notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Write all orders as JSON
    Export {
        /// File to write; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all orders from a JSON file
    Import { file: PathBuf },
    /// Write a timestamped backup file
    Backup {
        /// Directory for the backup file
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List the catalog
    List,
    /// Write the catalog as JSON
    Export {
        /// File to write; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the catalog from a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List accounts
    List,
    /// Write all accounts as JSON
    Export {
        /// File to write; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all accounts from a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account
    Create {
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            sample_rate: config.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eshop_cli=info,eshop_storefront=info,eshop_admin=info".into());

    // JSON lines when ESHOP_LOG_FORMAT=json, text otherwise
    let json = std::env::var("ESHOP_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be up before the subscriber so the layer has a client
    let _sentry_guard = init_sentry(&config.sentry);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        e.report();
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Seed { catalog, force } => {
            commands::seed::run(config, catalog.as_deref(), force).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::orders::list(config, status.as_deref())?,
            OrdersAction::Stats => commands::orders::stats(config)?,
            OrdersAction::SetStatus { id, status, notes } => {
                commands::orders::set_status(config, id, &status, notes.as_deref())?;
            }
            OrdersAction::Export { output } => {
                commands::orders::export(config, output.as_deref()).await?;
            }
            OrdersAction::Import { file } => commands::orders::import(config, &file).await?,
            OrdersAction::Backup { dir } => commands::orders::backup(config, &dir).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(config)?,
            ProductsAction::Export { output } => {
                commands::products::export(config, output.as_deref()).await?;
            }
            ProductsAction::Import { file } => commands::products::import(config, &file).await?,
        },
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list(config)?,
            UsersAction::Export { output } => {
                commands::users::export(config, output.as_deref()).await?;
            }
            UsersAction::Import { file } => commands::users::import(config, &file).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                name,
                email,
            } => commands::admin::create_user(config, &username, &name, &email)?,
        },
    }
    Ok(())
}
