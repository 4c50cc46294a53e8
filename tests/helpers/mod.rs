pub mod applier;
pub mod cli;
pub mod fixtures;
