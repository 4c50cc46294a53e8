use std::time::Duration;

// Configuration file name
pub const CONFIG_FILENAME: &str = "pgshift.yaml";

// Environment fallbacks for the two databases
pub const SOURCE_URL_ENV: &str = "SOURCE_DATABASE_URL";
pub const TARGET_URL_ENV: &str = "TARGET_DATABASE_URL";

// Connection pool sizing
pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 30_000;

// Retry policy
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(200);
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

// Suggested delays by failure category
pub const SERIALIZATION_RETRY_DELAY: Duration = Duration::from_millis(100);
pub const DEADLOCK_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const TOO_MANY_CONNECTIONS_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const CONNECTION_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const TIMEOUT_RETRY_DELAY: Duration = Duration::from_secs(1);

// Output files written by `generate`
pub const DEFAULT_MIGRATION_FILE: &str = "migration.sql";
pub const DEFAULT_ROLLBACK_FILE: &str = "rollback.sql";
