//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// ===== global functions =====

/// Formats an error followed by its chain of sources, each one enclosed in
/// parentheses.
pub fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}

// ===== unit tests =====
