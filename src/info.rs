//! Descriptive metadata for apps and commands.

use std::env;
use std::path::Path;

/// Usage fallback for single-command apps and for individual commands.
pub const DEFAULT_COMMAND_USAGE: &str = "[arguments ...]";

/// Usage fallback for the parent of a multi-command app.
pub const DEFAULT_PARENT_COMMAND_USAGE: &str = "<command> [arguments ...]";

/// Descriptive information about an application.
///
/// An empty `name` is replaced with the running executable's base name,
/// an empty `usage` with the default for the app kind. Both are fixed at
/// construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub summary: String,
    pub usage: String,
    pub version: String,
}

/// Descriptive information about a single command of a multi-command app.
///
/// `name` is required and unique within the app. An empty `usage` is
/// replaced with [`DEFAULT_COMMAND_USAGE`] at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub summary: String,
    pub usage: String,
}

impl AppInfo {
    pub(crate) fn with_defaults(mut self, default_usage: &str) -> Self {
        if self.name.is_empty() {
            self.name = infer_app_name();
        }
        if self.usage.is_empty() {
            self.usage = default_usage.to_string();
        }
        self
    }
}

impl CommandInfo {
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.usage.is_empty() {
            self.usage = DEFAULT_COMMAND_USAGE.to_string();
        }
        self
    }
}

/// Base name of the running executable, falling back to `argv[0]`.
pub(crate) fn infer_app_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|path| base_name(&path))
        .or_else(|| env::args().next().and_then(|arg0| base_name(Path::new(&arg0))))
        .unwrap_or_else(|| String::from("app"))
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
