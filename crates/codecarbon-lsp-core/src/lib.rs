//! Transport-agnostic settings resolution for the CodeCarbon language server.
//!
//! This crate holds the core logic of the server without any LSP protocol
//! dependencies: the per-workspace settings model as sent by the editor,
//! the document-to-workspace resolution, and the formatting of emissions
//! values for editor-facing messages.
//!
//! # Usage
//!
//! ```rust
//! use std::path::Path;
//! use codecarbon_lsp_core::SettingsStore;
//!
//! let mut store = SettingsStore::new();
//! store.replace_all(Vec::new(), Path::new("/srv/project"));
//!
//! // A document outside every workspace falls back to global defaults.
//! let record = store.settings_for_document(Some(Path::new("/tmp/scratch.rs")));
//! assert_eq!(record.cwd, Path::new("/tmp"));
//! ```

pub mod format;
pub mod settings;

pub use format::format_emissions;
pub use settings::{
    GlobalSettings, OutputFileDir, SettingsStore, ShowNotifications, WorkspaceSettings,
};
