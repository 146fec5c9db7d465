//! Workspace settings resolution.
//!
//! Settings arrive from the editor as LSP `initializationOptions`: one
//! record per workspace folder plus optional global defaults. The store
//! keys records by workspace filesystem path and resolves a document to the
//! record of the innermost workspace containing it, synthesizing a record
//! from global defaults for documents outside every workspace.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// When to surface log messages as editor notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShowNotifications {
    #[default]
    Off,
    OnError,
    OnWarning,
    Always,
}

impl ShowNotifications {
    /// Parse the wire representation (`"off"`, `"onError"`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(Self::Off),
            "onError" => Some(Self::OnError),
            "onWarning" => Some(Self::OnWarning),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// Where the emissions CSV is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFileDir {
    /// The workspace's working directory.
    Cwd,
    /// The user's home directory.
    #[default]
    UserHome,
}

/// Defaults applied to documents that fall outside every workspace folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    pub args: Vec<String>,
    pub path: Vec<String>,
    pub show_notifications: ShowNotifications,
    pub output_file_dir: OutputFileDir,
    pub launch_on_startup: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            path: Vec::new(),
            show_notifications: ShowNotifications::Off,
            output_file_dir: OutputFileDir::UserHome,
            launch_on_startup: true,
        }
    }
}

/// Settings for a single workspace folder, as sent by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSettings {
    /// Working directory for the workspace (its filesystem root).
    pub cwd: PathBuf,
    /// Workspace folder URI.
    pub workspace: String,
    pub args: Vec<String>,
    pub path: Vec<String>,
    pub show_notifications: ShowNotifications,
    pub output_file_dir: OutputFileDir,
    pub launch_on_startup: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self::from_global(PathBuf::new(), &GlobalSettings::default())
    }
}

impl WorkspaceSettings {
    /// Synthesize a record rooted at `cwd` from global defaults.
    pub fn from_global(cwd: impl Into<PathBuf>, global: &GlobalSettings) -> Self {
        let cwd = cwd.into();
        let workspace = uri_from_path(&cwd);
        Self {
            cwd,
            workspace,
            args: global.args.clone(),
            path: global.path.clone(),
            show_notifications: global.show_notifications,
            output_file_dir: global.output_file_dir,
            launch_on_startup: global.launch_on_startup,
        }
    }

    /// Directory the emissions CSV is written to for this workspace.
    ///
    /// Falls back to the workspace cwd when no home directory is known.
    pub fn output_dir(&self) -> PathBuf {
        match self.output_file_dir {
            OutputFileDir::Cwd => self.cwd.clone(),
            OutputFileDir::UserHome => dirs::home_dir().unwrap_or_else(|| self.cwd.clone()),
        }
    }
}

fn uri_from_path(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

fn path_from_uri(uri: &str) -> Option<PathBuf> {
    Url::parse(uri).ok()?.to_file_path().ok()
}

/// Per-workspace settings, keyed by workspace filesystem path.
///
/// Insertion order is preserved: the first record is the fallback when no
/// document is in play (for example when initializing the tracker).
#[derive(Debug, Default)]
pub struct SettingsStore {
    global: GlobalSettings,
    workspaces: IndexMap<PathBuf, WorkspaceSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn set_global(&mut self, global: GlobalSettings) {
        self.global = global;
    }

    /// Replace all workspace records.
    ///
    /// An empty list synthesizes a single record rooted at `fallback_cwd`
    /// from global defaults, so resolution always has a record to land on.
    pub fn replace_all(&mut self, settings: Vec<WorkspaceSettings>, fallback_cwd: &Path) {
        self.workspaces.clear();
        if settings.is_empty() {
            let record = WorkspaceSettings::from_global(fallback_cwd, &self.global);
            self.workspaces.insert(fallback_cwd.to_path_buf(), record);
            return;
        }

        for record in settings {
            let key = path_from_uri(&record.workspace).unwrap_or_else(|| record.cwd.clone());
            self.workspaces.insert(key, record);
        }
    }

    /// Workspace root containing `document`, if any.
    ///
    /// Walks the document path upwards until it matches a known workspace
    /// root, so nested workspace folders resolve to the innermost one.
    pub fn key_for_document(&self, document: &Path) -> Option<&Path> {
        document.ancestors().find_map(|ancestor| {
            self.workspaces
                .get_key_value(ancestor)
                .map(|(key, _)| key.as_path())
        })
    }

    /// Resolve the settings record for a document.
    ///
    /// `None` resolves to the first stored record. A document outside every
    /// workspace gets a record synthesized from global defaults, rooted at
    /// the document's parent directory.
    pub fn settings_for_document(&self, document: Option<&Path>) -> WorkspaceSettings {
        let Some(document) = document else {
            return self
                .workspaces
                .first()
                .map(|(_, record)| record.clone())
                .unwrap_or_else(|| {
                    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                    WorkspaceSettings::from_global(cwd, &self.global)
                });
        };

        if let Some(key) = self.key_for_document(document) {
            return self.workspaces[key].clone();
        }

        // Non-workspace file, or no workspace at all.
        let parent = document.parent().unwrap_or(document);
        WorkspaceSettings::from_global(parent, &self.global)
    }
}
