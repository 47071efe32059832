//! Core application

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands, FilterArgs, UserArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{CRATE_TARGET, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::filters::{Filter, parse_filter};
use crate::data::types::{OrdDir, Order, PageParams, UserData};
use crate::data::{DataError, StoreService, UserStore};
use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, retry_transient};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub store: Arc<StoreService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config).await?;
        app.shutdown.install_signal_handlers();

        let result = app.execute(command).await;
        app.shutdown.shutdown().await;
        result
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let store = Arc::new(
            StoreService::init(config.store.backend, config.store.postgres.as_ref())
                .await
                .context("Failed to initialize store")?,
        );
        tracing::debug!(backend = store.backend_name(), "Store initialized");

        let shutdown = ShutdownService::new(store.clone());
        Ok(Self {
            shutdown,
            config,
            store,
        })
    }

    async fn execute(&self, command: Commands) -> Result<()> {
        let store = self.store.store();
        let cancel = self.shutdown.token();

        match command {
            Commands::Add(args) => {
                let user = store.add(cancel, &user_data(args)).await?;
                print_json(&user)
            }
            Commands::Update { id, user } => {
                let updated = store.update(cancel, &id, &user_data(user)).await?;
                print_json(&updated.with_context(|| format!("User not found: {}", id))?)
            }
            Commands::Remove { id } => {
                let removed = store.remove(cancel, &id).await?;
                print_json(&removed.with_context(|| format!("User not found: {}", id))?)
            }
            Commands::List { filter, page_size } => {
                let filter = build_filter(filter)?;
                let page_size = page_size.unwrap_or(self.config.default_page_size);
                self.list(store.as_ref(), filter.as_ref(), page_size).await
            }
            Commands::Page {
                filter,
                size,
                offset,
                order_by,
                desc,
            } => {
                let filter = build_filter(filter)?;
                let params = PageParams {
                    size: size.unwrap_or(self.config.default_page_size),
                    offset,
                    order: Order::new(
                        order_by.unwrap_or_default(),
                        if desc { OrdDir::Desc } else { OrdDir::Asc },
                    ),
                };
                let users = store.page(cancel, filter.as_ref(), &params).await?;
                print_json(&users)
            }
        }
    }

    /// Print every page as a JSON array, then the pagination summary on stderr
    async fn list(
        &self,
        store: &dyn UserStore,
        filter: Option<&Filter>,
        page_size: u64,
    ) -> Result<()> {
        let cancel = self.shutdown.token();
        let it = store.list(filter, page_size).await?;

        loop {
            let page = retry_transient(
                DEFAULT_MAX_ATTEMPTS,
                DEFAULT_BASE_DELAY_MS,
                DataError::is_transient,
                || it.next(cancel),
            )
            .await?;
            let Some(users) = page else {
                break;
            };
            print_json(&users)?;
        }

        if let Some(pagination) = it.pagination().await {
            eprintln!(
                "{} users in {} pages of {}",
                pagination.total_elements, pagination.total_pages, pagination.page_size
            );
        }
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", CRATE_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn user_data(args: UserArgs) -> UserData {
    UserData {
        first_name: args.first_name,
        last_name: args.last_name,
        nickname: args.nickname,
        password: args.password,
        email: args.email,
        country: args.country,
    }
}

/// Filter from `--filter` pairs and `--id`; `None` when neither is given
fn build_filter(args: FilterArgs) -> Result<Option<Filter>> {
    let input: HashMap<String, String> = args.filters.into_iter().collect();
    let mut filter = parse_filter(&input)?;

    if let Some(id) = args.id {
        filter.get_or_insert_with(Filter::default).id = Some(id);
    }
    Ok(filter)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
