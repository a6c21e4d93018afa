//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use conv_utils::poll::PollPolicy;
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: Logging,
    pub poll: PollPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub file: LoggingFile,
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFile {
    pub enabled: bool,
    pub dir: String,
    pub name: String,
    pub rotation: LoggingFileRotation,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
    pub enabled: bool,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFmt {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_thread_id: bool,
    pub show_source: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFileRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "conv-wait.toml";

    // Without --config, the file is looked up in the working directory. A
    // missing configuration file isn't an error, a malformed one is.
    pub(crate) fn load(config_file: Option<&str>) -> Result<Config, Error> {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|error| Error::ParseToml {
                    path: config_file.to_owned(),
                    error,
                })
            }
            Err(err) => {
                eprintln!("Failed to load configuration file: {err}");
                eprintln!("Falling back to default configuration...");
                Ok(Config::default())
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            logging: Default::default(),
            poll: Default::default(),
        }
    }
}

// ===== impl LoggingFile =====

impl Default for LoggingFile {
    fn default() -> LoggingFile {
        LoggingFile {
            enabled: false,
            dir: ".".to_owned(),
            name: "conv-wait.log".to_owned(),
            rotation: Default::default(),
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingStdout =====

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout {
            enabled: true,
            fmt: LoggingFmt {
                style: LoggingFmtStyle::Compact,
                ..Default::default()
            },
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Full,
            colors: false,
            show_thread_id: false,
            show_source: false,
        }
    }
}

// ===== unit tests =====
