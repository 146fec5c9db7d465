//! CodeCarbon Language Server Protocol adapter.
//!
//! This crate wraps the emissions-measurement session from
//! `codecarbon-tracker` with the tower-lsp framework. The editor drives the
//! session through two custom requests:
//!
//! - `codecarbon.startTracker` begins a measurement session,
//! - `codecarbon.stopTracker` ends it and responds with
//!   `{ "emissions": <kg CO2e>, "emissions_file": <path> }`.
//!
//! Settings arrive once, as `initializationOptions` on the `initialize`
//! request, and are resolved per workspace by `codecarbon-lsp-core`. Status
//! and errors are relayed to the editor via `window/logMessage`, with
//! `window/showMessage` notifications gated by the `showNotifications`
//! setting.
//!
//! # Usage
//!
//! The server is invoked via the `codecarbon lsp` subcommand:
//!
//! ```bash
//! codecarbon lsp
//! ```
//!
//! Or programmatically:
//!
//! ```rust,ignore
//! codecarbon_lsp::run_server().await;
//! ```

pub mod capabilities;
pub mod server;

pub use server::{START_TRACKER_REQUEST, STOP_TRACKER_REQUEST, run_server};
