//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Convergence predicates.
//!
//! Every check reads live telemetry for the entries listed in an
//! [`ExpectedState`] section and returns whether all of them match. A record
//! that isn't present yet counts as a mismatch, never as an error: only a
//! failed read is reported as [`TelemetryReadError`]. The observed records
//! are logged at debug level, so the last state seen before a timeout ends up
//! in the logs.

use std::collections::BTreeMap;

use conv_utils::set;
use itertools::Itertools;
use tracing::debug;

use crate::error::TelemetryReadError;
use crate::expected::{
    ExpectedBgp, ExpectedBgpPrefixes, ExpectedFlow, ExpectedIsis,
    ExpectedLacp, ExpectedLag, ExpectedPort, ExpectedState,
};
use crate::metrics::{
    BgpMetric, BgpPrefixState, FlowMetric, InterfaceState, IsisMetric,
    LacpMemberMetric, LagMetric, OperStatus, PortMetric, Telemetry,
};
use crate::source::TelemetrySource;
use crate::table::{
    Table, bgp_table, dut_lacp_table, flow_table, isis_table, lacp_table,
    lag_table, port_table,
};

pub type CheckResult = Result<bool, TelemetryReadError>;

// ===== global functions =====

pub fn ports_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.ports, |name| telemetry.port(name), port_matches)?;
    log_table(port_table(observed.iter().map(|(name, m)| (*name, m))));
    Ok(ok)
}

pub fn flows_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.flows, |name| telemetry.flow(name), flow_matches)?;
    log_table(flow_table(observed.iter().map(|(name, m)| (*name, m))));
    Ok(ok)
}

/// Checks that the listed flows received, in total, the expected number of
/// frames.
pub fn traffic_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let Some(traffic) = &expected.traffic else {
        return Ok(true);
    };

    let telemetry = Telemetry::new(source);
    let mut observed = Vec::with_capacity(traffic.flows.len());
    let mut complete = true;
    for name in &traffic.flows {
        match telemetry.flow(name)? {
            Some(metric) => observed.push((name.as_str(), metric)),
            None => complete = false,
        }
    }
    log_table(flow_table(observed.iter().map(|(name, m)| (*name, m))));

    let frames_rx = observed.iter().map(|(_, m)| m.frames_rx).sum::<u64>();
    debug!(
        expected = %traffic.frames_rx,
        actual = %frames_rx,
        "total frames received"
    );
    Ok(complete && frames_rx == traffic.frames_rx)
}

pub fn bgp4_sessions_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.bgp4, |peer| telemetry.bgp4(peer), bgp_matches)?;
    log_table(bgp_table(
        "BGPv4 Metrics",
        observed.iter().map(|(name, m)| (*name, m)),
    ));
    Ok(ok)
}

pub fn bgp6_sessions_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.bgp6, |peer| telemetry.bgp6(peer), bgp_matches)?;
    log_table(bgp_table(
        "BGPv6 Metrics",
        observed.iter().map(|(name, m)| (*name, m)),
    ));
    Ok(ok)
}

pub fn bgp_prefixes_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) = collect(
        &expected.bgp_prefixes,
        |peer| telemetry.bgp_prefixes(peer),
        |state: &BgpPrefixState, exp: &ExpectedBgpPrefixes| {
            state.ipv4_unicast.len() == exp.ipv4
                && state.ipv6_unicast.len() == exp.ipv6
        },
    )?;
    for (peer, state) in &observed {
        debug!(
            %peer,
            ipv4 = %state.ipv4_unicast.len(),
            ipv6 = %state.ipv6_unicast.len(),
            "received prefixes"
        );
    }
    Ok(ok)
}

pub fn isis_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.isis, |router| telemetry.isis(router), isis_matches)?;
    log_table(isis_table(observed.iter().map(|(name, m)| (*name, m))));
    Ok(ok)
}

pub fn lags_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) =
        collect(&expected.lags, |name| telemetry.lag(name), lag_matches)?;
    log_table(lag_table(observed.iter().map(|(name, m)| (*name, m))));
    Ok(ok)
}

pub fn lacp_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) = collect(
        &expected.lacp,
        |port| telemetry.lacp_member(port),
        lacp_matches,
    )?;
    log_table(lacp_table(observed.iter().map(|(name, m)| (*name, m))));
    Ok(ok)
}

pub fn dut_interfaces_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let (observed, ok) = collect(
        &expected.dut_interfaces,
        |name| telemetry.dut_interface(name),
        |iface: &InterfaceState, status: &OperStatus| {
            iface.oper_status == *status
        },
    )?;
    for (name, iface) in &observed {
        debug!(%name, oper_status = %iface.oper_status, "DUT interface");
    }
    Ok(ok)
}

/// Checks that every DUT bundle has exactly the expected members, in any
/// order.
pub fn dut_bundles_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let mut ok = true;
    for (bundle, expected_members) in &expected.dut_bundles {
        let members = telemetry
            .dut_lacp_members(bundle)?
            .into_iter()
            .map(|member| member.interface)
            .collect::<Vec<_>>();
        debug!(
            %bundle,
            members = %members.iter().join(", "),
            "bundled ports"
        );
        ok &= set::unordered_eq(expected_members, &members);
    }
    Ok(ok)
}

pub fn dut_lacp_members_ok<S>(
    source: &S,
    expected: &ExpectedState,
) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let mut ok = true;
    for (bundle, expected_members) in &expected.dut_lacp_members {
        let members = telemetry.dut_lacp_members(bundle)?;
        log_table(dut_lacp_table(bundle, &members));
        for (name, exp) in expected_members {
            ok &= members.iter().any(|member| {
                member.interface == *name
                    && member.collecting == exp.collecting
                    && member.distributing == exp.distributing
            });
        }
    }
    Ok(ok)
}

/// Checks that the traffic generator resolved every expected neighbor MAC
/// address.
pub fn neighbors_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let telemetry = Telemetry::new(source);
    let mut ok = true;
    if !expected.ipv4_neighbor_macs.is_empty() {
        let macs = telemetry
            .ipv4_neighbors()?
            .into_iter()
            .filter_map(|neighbor| neighbor.mac)
            .collect::<Vec<_>>();
        debug!(
            expected = %expected.ipv4_neighbor_macs.iter().join(", "),
            actual = %macs.iter().join(", "),
            "IPv4 neighbor MAC entries"
        );
        ok &= set::contains_all(&expected.ipv4_neighbor_macs, &macs);
    }
    if !expected.ipv6_neighbor_macs.is_empty() {
        let macs = telemetry
            .ipv6_neighbors()?
            .into_iter()
            .filter_map(|neighbor| neighbor.mac)
            .collect::<Vec<_>>();
        debug!(
            expected = %expected.ipv6_neighbor_macs.iter().join(", "),
            actual = %macs.iter().join(", "),
            "IPv6 neighbor MAC entries"
        );
        ok &= set::contains_all(&expected.ipv6_neighbor_macs, &macs);
    }
    Ok(ok)
}

/// Runs every check whose section of `expected` isn't empty, stopping at the
/// first one that doesn't hold.
pub fn state_ok<S>(source: &S, expected: &ExpectedState) -> CheckResult
where
    S: TelemetrySource + ?Sized,
{
    let checks: [(bool, fn(&S, &ExpectedState) -> CheckResult); 13] = [
        (!expected.ports.is_empty(), ports_ok::<S>),
        (!expected.flows.is_empty(), flows_ok::<S>),
        (expected.traffic.is_some(), traffic_ok::<S>),
        (!expected.bgp4.is_empty(), bgp4_sessions_ok::<S>),
        (!expected.bgp6.is_empty(), bgp6_sessions_ok::<S>),
        (!expected.bgp_prefixes.is_empty(), bgp_prefixes_ok::<S>),
        (!expected.isis.is_empty(), isis_ok::<S>),
        (!expected.lags.is_empty(), lags_ok::<S>),
        (!expected.lacp.is_empty(), lacp_ok::<S>),
        (!expected.dut_interfaces.is_empty(), dut_interfaces_ok::<S>),
        (!expected.dut_bundles.is_empty(), dut_bundles_ok::<S>),
        (!expected.dut_lacp_members.is_empty(), dut_lacp_members_ok::<S>),
        (
            !expected.ipv4_neighbor_macs.is_empty()
                || !expected.ipv6_neighbor_macs.is_empty(),
            neighbors_ok::<S>,
        ),
    ];

    for (enabled, check) in checks {
        if enabled && !check(source, expected)? {
            return Ok(false);
        }
    }
    Ok(true)
}

// ===== helper functions =====

// Reads the record of every expected entry, returning the records that were
// found and whether all expected entries match.
fn collect<'a, T, X>(
    expected: &'a BTreeMap<String, X>,
    mut read: impl FnMut(&str) -> Result<Option<T>, TelemetryReadError>,
    matches: impl Fn(&T, &X) -> bool,
) -> Result<(Vec<(&'a str, T)>, bool), TelemetryReadError> {
    let mut observed = Vec::with_capacity(expected.len());
    let mut ok = true;
    for (name, exp) in expected {
        match read(name)? {
            Some(record) => {
                ok &= matches(&record, exp);
                observed.push((name.as_str(), record));
            }
            None => {
                debug!(%name, "no telemetry yet");
                ok = false;
            }
        }
    }
    Ok((observed, ok))
}

fn log_table(table: Table) {
    if !table.is_empty() {
        debug!("{}", table);
    }
}

fn port_matches(metric: &PortMetric, exp: &ExpectedPort) -> bool {
    exp.frames_rx.is_none_or(|frames| metric.frames_rx == frames)
        && exp.link.is_none_or(|link| metric.link == link)
}

fn flow_matches(metric: &FlowMetric, exp: &ExpectedFlow) -> bool {
    exp.frames_rx.is_none_or(|frames| metric.frames_rx == frames)
        && exp.frames_rx_rate.is_none_or(|rate| metric.frames_rx_rate == rate)
}

fn bgp_matches(metric: &BgpMetric, exp: &ExpectedBgp) -> bool {
    metric.session_state == exp.state
        && exp
            .routes_advertised
            .is_none_or(|routes| metric.routes_advertised == routes)
        && exp
            .routes_received
            .is_none_or(|routes| metric.routes_received == routes)
}

fn isis_matches(metric: &IsisMetric, exp: &ExpectedIsis) -> bool {
    exp.l1_sessions_up.is_none_or(|n| metric.l1_sessions_up == n)
        && exp.l2_sessions_up.is_none_or(|n| metric.l2_sessions_up == n)
        && exp.l1_database_size.is_none_or(|n| metric.l1_database_size == n)
        && exp.l2_database_size.is_none_or(|n| metric.l2_database_size == n)
}

fn lag_matches(metric: &LagMetric, exp: &ExpectedLag) -> bool {
    metric.oper_status == exp.oper_status
        && metric.member_ports_up == exp.member_ports_up
}

fn lacp_matches(metric: &LacpMemberMetric, exp: &ExpectedLacp) -> bool {
    metric.lag_name == exp.lag
        && metric.collecting == exp.collecting
        && metric.distributing == exp.distributing
        && exp
            .synchronization
            .is_none_or(|sync| metric.synchronization == sync)
}
