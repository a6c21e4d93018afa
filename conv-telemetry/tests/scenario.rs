//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Once;
use std::time::Duration;

use conv_telemetry::check::{dut_bundles_ok, lags_ok, state_ok};
use conv_telemetry::expected::{ExpectedLacp, ExpectedLag};
use conv_telemetry::metrics::{dut_path, otg_path};
use conv_telemetry::{ExpectedState, MemorySource, TelemetryReadError};
use conv_utils::poll::{PollError, PollPolicy, wait_for, wait_for_async};
use serde_json::{Value, json};
use tokio::time::Instant;

static INIT: Once = Once::new();

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

fn lag(member_ports_up: u32) -> Value {
    let oper_status = if member_ports_up > 0 { "up" } else { "down" };
    json!({
        "oper-status": oper_status,
        "member-ports-up": member_ports_up
    })
}

fn bundle(members: &[&str]) -> Value {
    let members = members
        .iter()
        .map(|interface| {
            json!({
                "interface": interface,
                "collecting": true,
                "distributing": true,
                "synchronization": "in-sync"
            })
        })
        .collect::<Vec<_>>();
    json!({ "members": members })
}

fn policy() -> PollPolicy {
    PollPolicy::new(Duration::from_secs(1), Duration::from_secs(60))
}

// Brings a LAG member down and back up, polling the LAG and bundle state
// after each step while the telemetry catches up in the background.
#[tokio::test(start_paused = true)]
async fn lag_member_failover() {
    setup();
    let source = MemorySource::default();
    source.set(&otg_path("lag", "lag1"), lag(2));
    source.set(
        &dut_path("lacp", "Port-Channel1"),
        bundle(&["Ethernet1", "Ethernet2"]),
    );

    let baseline = ExpectedState::default()
        .with_lag("lag1", ExpectedLag::up(2))
        .with_dut_bundle("Port-Channel1", ["Ethernet1", "Ethernet2"]);
    let start = Instant::now();
    let result = wait_for_async("LAG up", policy(), || {
        let result = state_ok(&source, &baseline);
        async move { result }
    })
    .await;
    assert!(result.is_ok());
    assert_eq!(start.elapsed(), Duration::ZERO);

    // Member goes down, telemetry follows 5 seconds later.
    let degraded = baseline
        .clone()
        .with_lag("lag1", ExpectedLag::up(1))
        .without_dut_bundle_member("Port-Channel1", "Ethernet2");
    let writer = source.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        writer.set(&otg_path("lag", "lag1"), lag(1));
        writer.set(&dut_path("lacp", "Port-Channel1"), bundle(&["Ethernet1"]));
    });
    let start = Instant::now();
    let result = wait_for_async("LAG degraded", policy(), || {
        let result = state_ok(&source, &degraded);
        async move { result }
    })
    .await;
    assert!(result.is_ok());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed <= Duration::from_secs(6));

    // Member comes back, telemetry follows 10 seconds later.
    let writer = source.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        writer.set(&otg_path("lag", "lag1"), lag(2));
        writer.set(
            &dut_path("lacp", "Port-Channel1"),
            bundle(&["Ethernet2", "Ethernet1"]),
        );
    });
    let start = Instant::now();
    let result = wait_for_async("LAG restored", policy(), || {
        let result = state_ok(&source, &baseline);
        async move { result }
    })
    .await;
    assert!(result.is_ok());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed <= Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn lag_never_converges() {
    setup();
    let source = MemorySource::default();
    source.set(&otg_path("lag", "lag1"), lag(1));
    let expected =
        ExpectedState::default().with_lag("lag1", ExpectedLag::up(2));

    let start = Instant::now();
    let result = wait_for_async("LAG up", policy(), || {
        let result = lags_ok(&source, &expected);
        async move { result }
    })
    .await;
    match result {
        Err(PollError::Timeout {
            condition,
            elapsed,
            attempts,
        }) => {
            assert_eq!(condition, "LAG up");
            assert_eq!(elapsed, Duration::from_secs(60));
            assert_eq!(attempts, 61);
        }
        result => panic!("unexpected result: {result:?}"),
    }
    assert_eq!(start.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn corrupted_telemetry_aborts_poll() {
    setup();
    let source = MemorySource::default();
    source.set(&otg_path("lag", "lag1"), lag(1));
    let expected =
        ExpectedState::default().with_lag("lag1", ExpectedLag::up(2));

    let writer = source.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        writer.set(&otg_path("lag", "lag1"), json!({ "member-ports-up": -1 }));
    });
    let start = Instant::now();
    let result = wait_for_async("LAG up", policy(), || {
        let result = lags_ok(&source, &expected);
        async move { result }
    })
    .await;
    match result {
        Err(PollError::Predicate {
            error: TelemetryReadError::Decode { path, .. },
            ..
        }) => assert_eq!(path, "/otg/lag/lag1"),
        result => panic!("unexpected result: {result:?}"),
    }
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn blocking_poll_on_converged_state() {
    setup();
    let source = MemorySource::default();
    source.set(
        &dut_path("lacp", "Port-Channel1"),
        bundle(&["Ethernet2", "Ethernet1"]),
    );
    source.set(
        &otg_path("lacp", "port1"),
        json!({
            "lag-name": "lag1",
            "synchronization": "in-sync",
            "collecting": true,
            "distributing": true
        }),
    );
    let expected = ExpectedState::default()
        .with_dut_bundle("Port-Channel1", ["Ethernet1", "Ethernet2"])
        .with_lacp("port1", ExpectedLacp::active("lag1"));

    let result = wait_for("bundles", policy(), || {
        dut_bundles_ok(&source, &expected)
    });
    assert!(result.is_ok());
    let result = wait_for("state", policy(), || state_ok(&source, &expected));
    assert!(result.is_ok());
}
