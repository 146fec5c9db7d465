//! LSP capability negotiation.

use tower_lsp::lsp_types::{
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind,
};

/// Get the server capabilities to report to the client.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // The server tracks measurement sessions, not text: the tracker
        // requests arrive as custom methods, so no document sync is needed.
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::NONE)),
        ..Default::default()
    }
}
