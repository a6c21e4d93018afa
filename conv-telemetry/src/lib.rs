//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod check;
pub mod error;
pub mod expected;
pub mod metrics;
pub mod source;
pub mod table;

pub use error::TelemetryReadError;
pub use expected::ExpectedState;
pub use source::{JsonFileSource, MemorySource, TelemetryPath, TelemetrySource};
