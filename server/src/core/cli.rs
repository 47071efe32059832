use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use super::config::StoreBackend;
use super::constants::{ENV_CONFIG, ENV_DATABASE_URL, ENV_PAGE_SIZE, ENV_STORE_BACKEND};
use crate::data::types::OrdBy;

#[derive(Parser)]
#[command(name = "userz")]
#[command(version, about = "User directory with filtered, paginated listings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Store backend (memory or postgres)
    #[arg(long, global = true, env = ENV_STORE_BACKEND, value_parser = parse_store_backend)]
    pub store: Option<StoreBackend>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, env = ENV_DATABASE_URL)]
    pub database_url: Option<String>,

    /// Default page size for listings
    #[arg(long, global = true, env = ENV_PAGE_SIZE)]
    pub default_page_size: Option<u64>,
}

/// User fields accepted by `add` and `update`
#[derive(Args, Debug, Clone, Default)]
pub struct UserArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub nickname: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
}

/// Filter expressions, one per field: `--filter 'country=in (US,UK)'`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long = "filter", short = 'f', value_name = "FIELD=EXPR", value_parser = parse_filter_arg)]
    pub filters: Vec<(String, String)>,

    /// Restrict to a single user id
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a user
    Add(UserArgs),
    /// Change the provided fields of a user
    Update {
        id: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Delete a user
    Remove { id: String },
    /// Walk every page of a filtered listing
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Users per page
        #[arg(long)]
        page_size: Option<u64>,
    },
    /// Fetch a single page at an explicit offset
    Page {
        #[command(flatten)]
        filter: FilterArgs,
        /// Users per page
        #[arg(long)]
        size: Option<u64>,
        /// Number of users to skip
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Sort column
        #[arg(long, value_parser = parse_ord_by)]
        order_by: Option<OrdBy>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
}

/// Parse a `field=expression` pair; the expression may itself contain `=`
pub fn parse_filter_arg(s: &str) -> Result<(String, String), String> {
    let (field, expr) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=EXPR, got '{}'", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((field.to_string(), expr.to_string()))
}

fn parse_store_backend(s: &str) -> Result<StoreBackend, String> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(StoreBackend::Memory),
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        _ => Err(format!(
            "invalid store backend '{}', expected 'memory' or 'postgres'",
            s
        )),
    }
}

fn parse_ord_by(s: &str) -> Result<OrdBy, String> {
    match s.to_lowercase().as_str() {
        "first_name" => Ok(OrdBy::FirstName),
        "last_name" => Ok(OrdBy::LastName),
        "nickname" => Ok(OrdBy::Nickname),
        "email" => Ok(OrdBy::Email),
        "created_at" => Ok(OrdBy::CreatedAt),
        "updated_at" => Ok(OrdBy::UpdatedAt),
        _ => Err(format!("invalid sort column '{}'", s)),
    }
}

/// Configuration extracted from CLI arguments
#[derive(Debug, Default, Clone)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub store: Option<StoreBackend>,
    pub database_url: Option<String>,
    pub default_page_size: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        store: cli.store,
        database_url: cli.database_url,
        default_page_size: cli.default_page_size,
    };
    (config, cli.command)
}
