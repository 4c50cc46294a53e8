// Integration tests for pgshift

pub mod cli;
pub mod helpers;
pub mod integration;
pub mod unit;
