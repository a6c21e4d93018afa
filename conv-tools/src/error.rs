//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Invalid command-line input.
#[derive(Debug)]
pub enum Error {
    ReadFile {
        path: String,
        error: std::io::Error,
    },
    ParseToml {
        path: String,
        error: toml::de::Error,
    },
    InvalidArgument {
        name: &'static str,
        value: String,
    },
}

// ===== impl Error =====

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReadFile { path, .. } => {
                write!(f, "failed to read {path}")
            }
            Error::ParseToml { path, .. } => {
                write!(f, "failed to parse {path}")
            }
            Error::InvalidArgument { name, value } => {
                write!(f, "invalid value for --{name}: {value}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadFile { error, .. } => Some(error),
            Error::ParseToml { error, .. } => Some(error),
            Error::InvalidArgument { .. } => None,
        }
    }
}
