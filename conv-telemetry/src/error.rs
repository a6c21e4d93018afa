//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use conv_utils::error::with_source;
use tracing::warn;

// Telemetry read errors.
//
// These are failures of the read itself, as opposed to a value that doesn't
// match its expectation yet.
#[derive(Debug)]
pub enum TelemetryReadError {
    Io { path: String, error: std::io::Error },
    Parse { path: String, error: serde_json::Error },
    Decode { path: String, error: serde_json::Error },
}

// ===== impl TelemetryReadError =====

impl TelemetryReadError {
    pub fn log(&self) {
        match self {
            TelemetryReadError::Io { path, error } => {
                warn!(%path, error = %with_source(error), "{}", self);
            }
            TelemetryReadError::Parse { path, error }
            | TelemetryReadError::Decode { path, error } => {
                warn!(%path, error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for TelemetryReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryReadError::Io { .. } => {
                write!(f, "failed to read telemetry snapshot")
            }
            TelemetryReadError::Parse { .. } => {
                write!(f, "failed to parse telemetry snapshot")
            }
            TelemetryReadError::Decode { path, .. } => {
                write!(f, "failed to decode telemetry data at {path}")
            }
        }
    }
}

impl std::error::Error for TelemetryReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryReadError::Io { error, .. } => Some(error),
            TelemetryReadError::Parse { error, .. }
            | TelemetryReadError::Decode { error, .. } => Some(error),
        }
    }
}
