//! Messages pushed to browser clients over the reload socket.

use serde::{Deserialize, Serialize};

/// Reason attached to reloads triggered by the watcher.
pub const FILE_CHANGE: &str = "file-change";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// `{"type":"reload","reason":...,"files":[...]}`
    Reload { reason: String, files: Vec<String> },

    /// `{"type":"error","title":...,"message":...,"file":...}`
    Error {
        title: String,
        message: String,
        file: String,
    },

    /// Sent once before the server closes connections.
    Shutdown { reason: String },
}

impl ReloadMessage {
    pub fn file_change(files: Vec<String>) -> Self {
        Self::Reload {
            reason: FILE_CHANGE.to_string(),
            files,
        }
    }

    pub fn compile_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            title: "Compilation failed".to_string(),
            message: message.into(),
            file: file.into(),
        }
    }

    pub fn shutdown() -> Self {
        Self::Shutdown {
            reason: "server-shutdown".to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
