//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{debug, info, warn};

use crate::error::with_source;

/// Interval and timeout governing a single poll operation.
#[serde_as]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollPolicy {
    /// Time to sleep between two predicate evaluations.
    #[serde(rename = "interval-ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub interval: Duration,
    /// Maximum time to wait, measured from the first evaluation.
    #[serde(rename = "timeout-ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
}

/// Result of polling an infallible predicate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Converged,
    TimedOut,
}

/// Result of polling a fallible predicate.
#[derive(Debug)]
pub enum PollError<E> {
    /// The condition didn't become true before the deadline.
    Timeout {
        condition: String,
        elapsed: Duration,
        attempts: u32,
    },
    /// The predicate failed, aborting the poll.
    Predicate { condition: String, error: E },
}

// ===== impl PollPolicy =====

impl PollPolicy {
    pub const DFLT_INTERVAL: Duration = Duration::from_millis(500);
    pub const DFLT_TIMEOUT: Duration = Duration::from_secs(30);

    pub const fn new(interval: Duration, timeout: Duration) -> PollPolicy {
        PollPolicy { interval, timeout }
    }

    pub const fn with_interval(mut self, interval: Duration) -> PollPolicy {
        self.interval = interval;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> PollPolicy {
        self.timeout = timeout;
        self
    }

    // Returns whether the predicate should be evaluated again after a false
    // evaluation. Evaluations continue until the deadline has passed, except
    // when the interval alone exceeds the timeout.
    fn retry_allowed(&self, elapsed: Duration) -> bool {
        self.interval <= self.timeout && elapsed < self.timeout
    }
}

impl Default for PollPolicy {
    fn default() -> PollPolicy {
        PollPolicy {
            interval: PollPolicy::DFLT_INTERVAL,
            timeout: PollPolicy::DFLT_TIMEOUT,
        }
    }
}

// ===== impl Outcome =====

impl Outcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Converged)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }
}

impl From<Result<(), PollError<Infallible>>> for Outcome {
    fn from(result: Result<(), PollError<Infallible>>) -> Outcome {
        match result {
            Ok(()) => Outcome::Converged,
            Err(PollError::Timeout { .. }) => Outcome::TimedOut,
            Err(PollError::Predicate { error, .. }) => match error {},
        }
    }
}

// ===== impl PollError =====

impl<E> PollError<E>
where
    E: std::error::Error,
{
    pub fn log(&self) {
        match self {
            PollError::Timeout {
                condition,
                elapsed,
                attempts,
            } => {
                warn!(%condition, ?elapsed, %attempts, "{}", self);
            }
            PollError::Predicate { condition, error } => {
                warn!(%condition, error = %with_source(error), "{}", self);
            }
        }
    }
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}

impl<E> std::fmt::Display for PollError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Timeout { condition, .. } => {
                write!(f, "timeout occurred while waiting for {condition}")
            }
            PollError::Predicate { condition, .. } => {
                write!(f, "error while waiting for {condition}")
            }
        }
    }
}

impl<E> std::error::Error for PollError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollError::Predicate { error, .. } => Some(error),
            PollError::Timeout { .. } => None,
        }
    }
}

// ===== global functions =====

/// Repeatedly evaluates `predicate` until it returns true or the policy's
/// timeout elapses, blocking the calling thread in between.
///
/// The predicate is always evaluated at least once, so a condition that
/// already holds is detected without sleeping.
pub fn poll<F>(policy: PollPolicy, mut predicate: F) -> Outcome
where
    F: FnMut() -> bool,
{
    wait_for("condition", policy, || Ok::<_, Infallible>(predicate())).into()
}

/// Fallible variant of [`poll`].
///
/// An error returned by the predicate aborts the poll immediately and is
/// reported as [`PollError::Predicate`], so a failed telemetry read is never
/// mistaken for a condition that isn't true yet.
pub fn wait_for<F, E>(
    condition: &str,
    policy: PollPolicy,
    mut predicate: F,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Result<bool, E>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        let done = predicate().map_err(|error| PollError::Predicate {
            condition: condition.to_owned(),
            error,
        })?;
        let elapsed = start.elapsed();
        if done {
            info!(%condition, ?elapsed, %attempts, "done waiting");
            return Ok(());
        }
        if !policy.retry_allowed(elapsed) {
            return Err(PollError::Timeout {
                condition: condition.to_owned(),
                elapsed,
                attempts,
            });
        }
        debug!(%condition, ?elapsed, %attempts, "condition not met yet");
        std::thread::sleep(policy.interval);
    }
}

/// Asynchronous variant of [`poll`], sleeping on the tokio timer instead of
/// blocking the thread.
pub async fn poll_async<F, Fut>(policy: PollPolicy, mut predicate: F) -> Outcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    wait_for_async("condition", policy, || {
        let fut = predicate();
        async move { Ok::<_, Infallible>(fut.await) }
    })
    .await
    .into()
}

/// Asynchronous variant of [`wait_for`].
pub async fn wait_for_async<F, Fut, E>(
    condition: &str,
    policy: PollPolicy,
    mut predicate: F,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let start = tokio::time::Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        let done = predicate().await.map_err(|error| PollError::Predicate {
            condition: condition.to_owned(),
            error,
        })?;
        let elapsed = start.elapsed();
        if done {
            info!(%condition, ?elapsed, %attempts, "done waiting");
            return Ok(());
        }
        if !policy.retry_allowed(elapsed) {
            return Err(PollError::Timeout {
                condition: condition.to_owned(),
                elapsed,
                attempts,
            });
        }
        debug!(%condition, ?elapsed, %attempts, "condition not met yet");
        tokio::time::sleep(policy.interval).await;
    }
}

// ===== unit tests =====
