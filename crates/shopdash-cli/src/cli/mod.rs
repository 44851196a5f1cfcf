//! CLI entry and dispatch.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use shopdash_core::api::{DATE_FORMAT, Segment};
use shopdash_core::config;

use crate::context::AppContext;
use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "shopdash")]
#[command(version = "0.1")]
#[command(about = "Analytics for your Shopify store, in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long, env = "SHOPDASH_EMAIL")]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "SHOPDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account for a store and sign in
    Signup {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "SHOPDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        store_name: String,
        /// e.g. my-store.myshopify.com
        #[arg(long)]
        shopify_domain: String,
        /// Admin API access token of the store
        #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
        shopify_access_token: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Revenue, orders and top customers
    Dashboard {
        /// First day of the orders series (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Last day of the orders series (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
    },

    /// Customer table with segment filter and search
    Customers {
        /// all, high, medium or low
        #[arg(long, default_value = "all")]
        segment: Segment,
        #[arg(long)]
        search: Option<String>,
        /// 1-based page number
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Product stats, best sellers and stock levels
    Products,

    /// Pull fresh data from Shopify, then show the dashboard
    Sync,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print the effective configuration
    Show,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| format!("invalid date '{value}' (expected YYYY-MM-DD): {e}"))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands never touch the API.
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Show => {
                commands::config::show(&config::Config::load().context("load config")?)
            }
        };
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.logging);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli.command, config).await })
}

async fn dispatch(command: Commands, config: config::Config) -> Result<()> {
    let mut ctx = AppContext::new(config)?;

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(&mut ctx, &email, password).await
        }
        Commands::Signup {
            email,
            password,
            store_name,
            shopify_domain,
            shopify_access_token,
        } => {
            commands::auth::signup(
                &mut ctx,
                commands::auth::SignupArgs {
                    email,
                    password,
                    store_name,
                    shopify_domain,
                    shopify_access_token,
                },
            )
            .await
        }
        Commands::Logout => {
            commands::auth::logout(&mut ctx);
            Ok(())
        }
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Dashboard { start, end } => {
            let range = commands::pages::date_range(start, end)?;
            commands::pages::dashboard(&mut ctx, range).await
        }
        Commands::Customers {
            segment,
            search,
            page,
        } => commands::pages::customers(&mut ctx, segment, search, page - 1).await,
        Commands::Products => commands::pages::products(&mut ctx).await,
        Commands::Sync => commands::pages::sync(&mut ctx).await,
        // Handled before the runtime starts.
        Commands::Config { .. } => Ok(()),
    }
}
