//! Command handlers for auditor CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod audit;
pub mod build;
pub mod configure;
pub mod history;
