//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cell::Cell;
use std::sync::Once;
use std::time::Duration;

use conv_utils::poll::{
    Outcome, PollError, PollPolicy, poll, poll_async, wait_for, wait_for_async,
};
use tokio::time::Instant;

static INIT: Once = Once::new();

#[derive(Debug)]
struct ReadError;

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "telemetry read failed")
    }
}

impl std::error::Error for ReadError {}

// Initializes tracing subscriber.
fn setup() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::Subscriber::builder()
            .with_target(false)
            .with_ansi(false)
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

//
// Blocking poller.
//

#[test]
fn converged_without_sleeping() {
    setup();
    let calls = Cell::new(0);
    // An interval this long would make the test hang if the poller slept.
    let policy =
        PollPolicy::new(Duration::from_secs(60), Duration::from_secs(60));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || {
        calls.set(calls.get() + 1);
        true
    });
    assert_eq!(outcome, Outcome::Converged);
    assert_eq!(calls.get(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn converged_after_retries() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(ms(10), Duration::from_secs(5));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || {
        calls.set(calls.get() + 1);
        calls.get() > 3
    });
    assert!(outcome.is_converged());
    assert_eq!(calls.get(), 4);
    assert!(start.elapsed() >= ms(30));
}

#[test]
fn timed_out() {
    setup();
    let policy = PollPolicy::new(ms(100), Duration::from_secs(1));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || {
        // Slow telemetry read.
        std::thread::sleep(ms(1));
        false
    });
    let elapsed = start.elapsed();
    assert!(outcome.is_timed_out());
    let deadline = policy.timeout + policy.interval;
    assert!(
        elapsed >= policy.timeout && elapsed <= deadline,
        "{elapsed:?}"
    );
}

#[test]
fn converged_in_last_interval() {
    setup();
    // Condition becomes true shortly before the deadline, after the last
    // evaluation that could start before it.
    let policy = PollPolicy::new(ms(100), Duration::from_secs(1));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || {
        std::thread::sleep(ms(1));
        start.elapsed() >= ms(950)
    });
    let elapsed = start.elapsed();
    assert_eq!(outcome, Outcome::Converged);
    assert!(
        elapsed >= ms(950) && elapsed <= policy.timeout + policy.interval,
        "{elapsed:?}"
    );
}

#[test]
fn converged_after_flip() {
    setup();
    // Condition becomes true 2.1s after the poll starts.
    let policy = PollPolicy::new(ms(500), Duration::from_secs(3));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || start.elapsed() >= ms(2100));
    let elapsed = start.elapsed();
    assert_eq!(outcome, Outcome::Converged);
    assert!(elapsed >= ms(2100) && elapsed < ms(2600), "{elapsed:?}");
}

#[test]
fn timeout_below_interval_single_attempt() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(Duration::from_secs(60), ms(100));
    let start = std::time::Instant::now();
    let outcome = poll(policy, || {
        calls.set(calls.get() + 1);
        false
    });
    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(calls.get(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn zero_timeout_single_attempt() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(ms(10), Duration::ZERO);
    let outcome = poll(policy, || {
        calls.set(calls.get() + 1);
        false
    });
    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(calls.get(), 1);
}

#[test]
fn repeated_polls_are_independent() {
    setup();
    let policy = PollPolicy::default();
    assert_eq!(poll(policy, || true), Outcome::Converged);
    assert_eq!(poll(policy, || true), Outcome::Converged);
}

#[test]
fn predicate_error_aborts_poll() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(ms(10), Duration::from_secs(5));
    let result = wait_for("LAG to come up", policy, || {
        calls.set(calls.get() + 1);
        if calls.get() == 2 {
            Err(ReadError)
        } else {
            Ok(false)
        }
    });
    let error = result.unwrap_err();
    assert!(!error.is_timeout());
    assert!(matches!(error, PollError::Predicate { .. }));
    assert_eq!(error.to_string(), "error while waiting for LAG to come up");
    assert_eq!(calls.get(), 2);
}

#[test]
fn wait_for_timeout_reports_attempts() {
    setup();
    let policy = PollPolicy::new(ms(10), ms(50));
    let result = wait_for("BGP sessions", policy, || Ok::<_, ReadError>(false));
    match result {
        Err(PollError::Timeout {
            condition,
            attempts,
            ..
        }) => {
            assert_eq!(condition, "BGP sessions");
            assert!(attempts >= 2);
        }
        _ => panic!("expected a timeout"),
    }
}

#[test]
#[should_panic(expected = "telemetry unavailable")]
fn predicate_panic_propagates() {
    setup();
    poll(PollPolicy::default(), || panic!("telemetry unavailable"));
}

//
// Asynchronous poller, driven by a paused clock.
//

#[tokio::test(start_paused = true)]
async fn async_converged_without_sleeping() {
    setup();
    let start = Instant::now();
    let outcome = poll_async(PollPolicy::default(), || async { true }).await;
    assert_eq!(outcome, Outcome::Converged);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn async_converged_after_flip() {
    setup();
    // Condition becomes true 2.1s after the poll starts.
    let policy = PollPolicy::new(ms(500), Duration::from_secs(3));
    let start = Instant::now();
    let outcome = poll_async(policy, || async move {
        start.elapsed() >= ms(2100)
    })
    .await;
    let elapsed = start.elapsed();
    assert_eq!(outcome, Outcome::Converged);
    assert!(elapsed >= ms(2000) && elapsed <= ms(2500), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn async_converged_after_n_false() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(ms(500), Duration::from_secs(10));
    let start = Instant::now();
    let outcome = poll_async(policy, || {
        calls.set(calls.get() + 1);
        let done = calls.get() > 4;
        async move { done }
    })
    .await;
    assert_eq!(outcome, Outcome::Converged);
    let elapsed = start.elapsed();
    assert_eq!(calls.get(), 5);
    assert!(elapsed >= ms(2000) && elapsed < ms(2100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn async_timed_out() {
    setup();
    let policy =
        PollPolicy::new(Duration::from_secs(1), Duration::from_secs(60));
    let start = Instant::now();
    let outcome = poll_async(policy, || async { false }).await;
    let elapsed = start.elapsed();
    assert_eq!(outcome, Outcome::TimedOut);
    assert!(
        elapsed >= Duration::from_secs(60)
            && elapsed <= Duration::from_secs(61),
        "{elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn async_timeout_below_interval_single_attempt() {
    setup();
    let calls = Cell::new(0);
    let policy = PollPolicy::new(Duration::from_secs(1), ms(100));
    let start = Instant::now();
    let outcome = poll_async(policy, || {
        calls.set(calls.get() + 1);
        async { false }
    })
    .await;
    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn async_predicate_error_aborts_poll() {
    setup();
    let policy = PollPolicy::new(ms(500), Duration::from_secs(60));
    let start = Instant::now();
    let result = wait_for_async("ISIS adjacencies", policy, || async move {
        if start.elapsed() >= Duration::from_secs(5) {
            Err(ReadError)
        } else {
            Ok(false)
        }
    })
    .await;
    let elapsed = start.elapsed();
    assert!(matches!(result, Err(PollError::Predicate { .. })));
    assert!(elapsed >= ms(5000) && elapsed < ms(5500), "{elapsed:?}");
}
