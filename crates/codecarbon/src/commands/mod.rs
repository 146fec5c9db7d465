//! Command implementations for the CodeCarbon CLI.
//!
//! Each command module handles the CLI interface and delegates to the
//! library crates for the actual implementation.

pub mod lsp;
pub mod monitor;
