//! Database connectivity: connections, pooling, retries and execution.

pub mod connection;
pub mod error_context;
pub mod executor;
pub mod pool;
pub mod retry;

pub use connection::{ConnectionInfo, PgConnectionFactory, mask_url_password};
pub use executor::{ExecutionReport, MigrationExecutor};
pub use pool::{PgPool, PoolConfig, PoolRegistry};
pub use retry::RetryPolicy;
