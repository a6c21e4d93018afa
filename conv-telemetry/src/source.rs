//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::error::TelemetryReadError;

/// Location of a telemetry subtree, as a sequence of keys.
///
/// Keys are kept separate rather than joined into a single string because
/// interface names such as `Ethernet1/1` contain the separator.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TelemetryPath(Vec<String>);

/// Provider of live telemetry, read one subtree at a time.
///
/// Implementations must be safe to call repeatedly: predicates re-read the
/// same paths on every poll attempt.
pub trait TelemetrySource {
    /// Returns the value stored at `path`, or `None` if nothing is there yet.
    fn get(
        &self,
        path: &TelemetryPath,
    ) -> Result<Option<Value>, TelemetryReadError>;
}

/// In-memory telemetry document.
///
/// Clones share the same document, so one handle can be updated while
/// another one is being polled.
#[derive(Clone, Debug, Default)]
pub struct MemorySource(Arc<Mutex<Value>>);

/// Telemetry snapshot stored in a JSON file.
///
/// The file is read again on every access, so an external collector can
/// keep replacing it while a poll is in progress.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

// ===== impl TelemetryPath =====

impl TelemetryPath {
    pub fn new<I, K>(keys: I) -> TelemetryPath
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        TelemetryPath(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn push(mut self, key: impl Into<String>) -> TelemetryPath {
        self.0.push(key.into());
        self
    }

    // Returns the value stored at this path inside the given document.
    pub(crate) fn lookup<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.keys().try_fold(doc, |value, key| value.get(key))
    }
}

impl std::fmt::Display for TelemetryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for key in &self.0 {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

// ===== impl TelemetrySource =====

impl<T> TelemetrySource for &T
where
    T: TelemetrySource + ?Sized,
{
    fn get(
        &self,
        path: &TelemetryPath,
    ) -> Result<Option<Value>, TelemetryReadError> {
        (**self).get(path)
    }
}

impl<T> TelemetrySource for Arc<T>
where
    T: TelemetrySource + ?Sized,
{
    fn get(
        &self,
        path: &TelemetryPath,
    ) -> Result<Option<Value>, TelemetryReadError> {
        (**self).get(path)
    }
}

// ===== impl MemorySource =====

impl MemorySource {
    pub fn new(doc: Value) -> MemorySource {
        MemorySource(Arc::new(Mutex::new(doc)))
    }

    /// Stores `value` at `path`, creating intermediate objects as needed.
    ///
    /// Any non-object value found along the way is replaced.
    pub fn set(&self, path: &TelemetryPath, value: Value) {
        let mut doc = self.lock();
        let mut node = &mut *doc;
        for key in path.keys() {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                unreachable!();
            };
            node = map.entry(key).or_insert(Value::Null);
        }
        *node = value;
    }

    /// Removes the value stored at `path`, returning it.
    pub fn remove(&self, path: &TelemetryPath) -> Option<Value> {
        let mut keys = path.keys().collect::<Vec<_>>();
        let last = keys.pop()?;
        let mut doc = self.lock();
        let mut node = &mut *doc;
        for key in keys {
            node = node.get_mut(key)?;
        }
        node.as_object_mut()?.remove(last)
    }

    // The document stays valid JSON even if a writer panicked mid-update, so
    // a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Value> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TelemetrySource for MemorySource {
    fn get(
        &self,
        path: &TelemetryPath,
    ) -> Result<Option<Value>, TelemetryReadError> {
        let doc = self.lock();
        Ok(path.lookup(&doc).cloned())
    }
}

// ===== impl JsonFileSource =====

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileSource {
        JsonFileSource { path: path.into() }
    }
}

impl TelemetrySource for JsonFileSource {
    fn get(
        &self,
        path: &TelemetryPath,
    ) -> Result<Option<Value>, TelemetryReadError> {
        let file = self.path.display().to_string();
        let data = std::fs::read_to_string(&self.path).map_err(|error| {
            TelemetryReadError::Io {
                path: file.clone(),
                error,
            }
        })?;
        let doc = serde_json::from_str::<Value>(&data)
            .map_err(|error| TelemetryReadError::Parse { path: file, error })?;
        Ok(path.lookup(&doc).cloned())
    }
}

// ===== unit tests =====
