//! LSP server implementation using tower-lsp.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use codecarbon_lsp_core::{
    GlobalSettings, SettingsStore, ShowNotifications, WorkspaceSettings, format_emissions,
};
use codecarbon_tracker::{EmissionsTracker, TrackerConfig, TrackerError};

/// Request issued by the editor to begin a tracking session.
pub const START_TRACKER_REQUEST: &str = "codecarbon.startTracker";
/// Request issued by the editor to stop the session and collect the estimate.
pub const STOP_TRACKER_REQUEST: &str = "codecarbon.stopTracker";

/// Environment override for the notification policy, honored when the
/// editor did not configure `showNotifications`.
const SHOW_NOTIFICATION_ENV: &str = "LS_SHOW_NOTIFICATION";

/// Payload of a successful stop request.
#[derive(Debug, Serialize)]
pub struct StopTrackerResponse {
    /// Estimated emissions of the stopped session, in kg CO2e.
    pub emissions: f64,
    /// Path of the emissions CSV the session was recorded to.
    pub emissions_file: String,
}

/// The editor's `initializationOptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InitializationOptions {
    global_settings: GlobalSettings,
    settings: Vec<WorkspaceSettings>,
}

/// The CodeCarbon language server.
pub struct CodeCarbonLanguageServer {
    /// The LSP client for sending log and notification messages.
    client: Client,
    /// Per-workspace settings resolved at initialize.
    settings: Arc<RwLock<SettingsStore>>,
    /// The single tracked measurement session, constructed lazily.
    tracker: Arc<RwLock<Option<EmissionsTracker>>>,
}

impl CodeCarbonLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            settings: Arc::new(RwLock::new(SettingsStore::new())),
            tracker: Arc::new(RwLock::new(None)),
        }
    }

    /// Begin a tracking session, constructing the tracker first if the one
    /// from initialize is missing.
    pub async fn start_tracker(&self, _params: Option<Value>) -> Result<Value> {
        let mut guard = self.tracker.write().await;
        if guard.is_none() {
            drop(guard);
            if let Err(err) = self.initialize_tracker().await {
                self.log_error(format!("Failed to initialize emissions tracker: {err}"))
                    .await;
                return Err(Error::internal_error());
            }
            guard = self.tracker.write().await;
        }

        if let Some(tracker) = guard.as_mut() {
            tracker.start();
        }
        drop(guard);

        self.log_to_output("Emissions tracking started.").await;
        Ok(Value::Null)
    }

    /// Stop the running session and report its estimate.
    ///
    /// Responds with JSON null when no session is running, matching the
    /// editor-side contract.
    pub async fn stop_tracker(&self, _params: Option<Value>) -> Result<Option<StopTrackerResponse>> {
        let mut guard = self.tracker.write().await;
        let Some(tracker) = guard.as_mut().filter(|tracker| tracker.is_running()) else {
            drop(guard);
            self.log_to_output("Emissions tracking not started. Nothing to do here.")
                .await;
            return Ok(None);
        };

        let emissions_file = tracker.output_path();
        let emissions = match tracker.stop() {
            Ok(emissions) => emissions,
            Err(err) => {
                drop(guard);
                self.log_error(format!("Failed to stop emissions tracker: {err}"))
                    .await;
                return Err(Error::internal_error());
            }
        };
        drop(guard);

        // Make the tracker ready for the next session. The recorded data is
        // already on disk, so a construction failure only loses the restart.
        if let Err(err) = self.initialize_tracker().await {
            self.log_warning(format!("Failed to re-initialize emissions tracker: {err}"))
                .await;
        }

        self.log_always(format!(
            "Emissions tracking stopped. Emissions: {}",
            format_emissions(emissions, 2)
        ))
        .await;

        Ok(Some(StopTrackerResponse {
            emissions,
            emissions_file: emissions_file.to_string_lossy().into_owned(),
        }))
    }

    /// Construct the tracker from the no-document settings record.
    async fn initialize_tracker(&self) -> std::result::Result<(), TrackerError> {
        let record = self.settings.read().await.settings_for_document(None);
        let output_dir = record.output_dir();

        self.log_to_output(format!(
            "Tracking emissions for workspace: {}",
            record.cwd.display()
        ))
        .await;
        self.log_to_output(format!("Output directory: {}", output_dir.display()))
            .await;

        let tracker = EmissionsTracker::new(TrackerConfig::new(output_dir))?;
        *self.tracker.write().await = Some(tracker);
        Ok(())
    }

    /// Effective notification policy: the editor-configured setting, unless
    /// the `LS_SHOW_NOTIFICATION` environment variable overrides it.
    async fn notification_level(&self) -> ShowNotifications {
        if let Some(level) = std::env::var(SHOW_NOTIFICATION_ENV)
            .ok()
            .as_deref()
            .and_then(ShowNotifications::parse)
        {
            return level;
        }
        self.settings.read().await.global().show_notifications
    }

    async fn log_to_output(&self, message: impl std::fmt::Display) {
        self.client.log_message(MessageType::LOG, message).await;
    }

    async fn log_error(&self, message: impl std::fmt::Display) {
        tracing::error!("{message}");
        self.client.log_message(MessageType::ERROR, &message).await;
        if notifies_at(self.notification_level().await, MessageType::ERROR) {
            self.client.show_message(MessageType::ERROR, message).await;
        }
    }

    async fn log_warning(&self, message: impl std::fmt::Display) {
        tracing::warn!("{message}");
        self.client.log_message(MessageType::WARNING, &message).await;
        if notifies_at(self.notification_level().await, MessageType::WARNING) {
            self.client.show_message(MessageType::WARNING, message).await;
        }
    }

    async fn log_always(&self, message: impl std::fmt::Display) {
        self.client.log_message(MessageType::INFO, &message).await;
        if notifies_at(self.notification_level().await, MessageType::INFO) {
            self.client.show_message(MessageType::INFO, message).await;
        }
    }
}

/// Whether a message of `severity` is surfaced as a `window/showMessage`
/// notification under the given policy.
fn notifies_at(level: ShowNotifications, severity: MessageType) -> bool {
    match level {
        ShowNotifications::Off => false,
        ShowNotifications::OnError => severity == MessageType::ERROR,
        ShowNotifications::OnWarning => {
            severity == MessageType::ERROR || severity == MessageType::WARNING
        }
        ShowNotifications::Always => true,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for CodeCarbonLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Ok(cwd) = std::env::current_dir() {
            self.log_to_output(format!("Server working directory: {}", cwd.display()))
                .await;
        }

        let options = match params.initialization_options {
            Some(value) => match serde_json::from_value::<InitializationOptions>(value) {
                Ok(options) => options,
                Err(err) => {
                    self.log_error(format!("Malformed initializationOptions: {err}"))
                        .await;
                    InitializationOptions::default()
                }
            },
            None => InitializationOptions::default(),
        };

        if let Ok(json) = serde_json::to_string_pretty(&options.settings) {
            self.log_to_output(format!("Settings used to run server:\n{json}"))
                .await;
        }
        if let Ok(json) = serde_json::to_string_pretty(&options.global_settings) {
            self.log_to_output(format!("Global settings:\n{json}")).await;
        }

        let fallback_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        {
            let mut store = self.settings.write().await;
            store.set_global(options.global_settings);
            store.replace_all(options.settings, &fallback_cwd);
        }

        // Tracker construction failure must not fail the handshake; start
        // requests retry it.
        if let Err(err) = self.initialize_tracker().await {
            self.log_error(format!("Failed to initialize emissions tracker: {err}"))
                .await;
        }

        Ok(InitializeResult {
            capabilities: crate::capabilities::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "codecarbon-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "CodeCarbon language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Run the LSP server over stdio.
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(CodeCarbonLanguageServer::new)
        .custom_method(START_TRACKER_REQUEST, CodeCarbonLanguageServer::start_tracker)
        .custom_method(STOP_TRACKER_REQUEST, CodeCarbonLanguageServer::stop_tracker)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;
}
