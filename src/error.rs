use serde::Serialize;
use thiserror::Error;

/// Message shown when the scanner could not be reached or replied with garbage.
pub const TRANSPORT_FAILURE: &str = "Failed to connect to scanner server.";

/// Fallback when an error reply carries no `error` field.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// A failed scan attempt as the operator sees it.
///
/// Application errors are reported by the scanning service and shown verbatim.
/// Transport errors cover everything where no usable reply arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ScanError {
    #[error("{0}")]
    Application(String),

    #[error("Failed to connect to scanner server.")]
    Transport,
}

impl ScanError {
    /// Text carried by the error row.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ScanError::Transport)
    }
}
