// =============================================================================
// Application Identity
// =============================================================================

/// Crate name as it appears in tracing targets
pub const CRATE_TARGET: &str = "userz_server";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "userz.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "USERZ_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "USERZ_LOG";

// =============================================================================
// Store Backends
// =============================================================================

/// Environment variable for the store backend (memory or postgres)
pub const ENV_STORE_BACKEND: &str = "USERZ_STORE";

/// Environment variable for PostgreSQL connection URL
pub const ENV_DATABASE_URL: &str = "USERZ_DATABASE_URL";

/// Environment variable for the database used by PostgreSQL-backed tests
pub const ENV_TEST_DATABASE_URL: &str = "USERZ_TEST_DATABASE_URL";

// =============================================================================
// PostgreSQL Database
// =============================================================================

/// PostgreSQL default max connections
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL default min connections (keep warm for low latency)
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// PostgreSQL default connection acquire timeout in seconds
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL idle connection timeout in seconds (release unused connections)
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// PostgreSQL max connection lifetime in seconds (cycle connections to prevent stale state)
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// PostgreSQL statement timeout in seconds (prevent runaway queries, 0 = disabled)
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Pagination
// =============================================================================

/// Environment variable for the default page size
pub const ENV_PAGE_SIZE: &str = "USERZ_PAGE_SIZE";

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u64 = 10_000;
