//! Compare PostgreSQL schema snapshots and generate ordered migration and
//! rollback scripts.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod diff;
pub mod error;
pub mod error_handler;
pub mod migrate;
pub mod migration;
pub mod render;
pub mod snapshot;

pub use error::{PgShiftError, Result};
