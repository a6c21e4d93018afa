//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use conv_utils::mac_addr::MacAddr;
use derive_new::new;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TelemetryReadError;
use crate::source::{TelemetryPath, TelemetrySource};

// Physical link state of a traffic generator port.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkState {
    Up,
    #[default]
    Down,
}

// Operational status of an interface or LAG.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperStatus {
    Up,
    #[default]
    Down,
    LowerLayerDown,
    Dormant,
    Testing,
    NotPresent,
    Unknown,
}

// BGP session state as reported by the traffic generator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BgpSessionState {
    Up,
    #[default]
    Down,
}

// LACP synchronization state of a LAG member.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LacpSynchronization {
    InSync,
    #[default]
    OutSync,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PortMetric {
    pub frames_tx: u64,
    pub frames_rx: u64,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
    pub frames_tx_rate: f32,
    pub frames_rx_rate: f32,
    pub link: LinkState,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FlowMetric {
    pub frames_tx: u64,
    pub frames_rx: u64,
    pub frames_tx_rate: f32,
    pub frames_rx_rate: f32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BgpMetric {
    pub session_state: BgpSessionState,
    pub flaps: u64,
    pub routes_advertised: u64,
    pub routes_received: u64,
    pub route_withdraws_sent: u64,
    pub route_withdraws_received: u64,
    pub keepalives_sent: u64,
    pub keepalives_received: u64,
}

// Unicast prefixes learned by an emulated BGP peer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BgpPrefixState {
    pub ipv4_unicast: Vec<String>,
    pub ipv6_unicast: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IsisMetric {
    pub l1_sessions_up: u32,
    pub l1_sessions_flap: u64,
    pub l1_database_size: u32,
    pub l2_sessions_up: u32,
    pub l2_sessions_flap: u64,
    pub l2_database_size: u32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LagMetric {
    pub oper_status: OperStatus,
    pub member_ports_up: u32,
    pub frames_tx: u64,
    pub frames_rx: u64,
}

// LACP state of a traffic generator LAG member port.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LacpMemberMetric {
    pub lag_name: String,
    pub synchronization: LacpSynchronization,
    pub collecting: bool,
    pub distributing: bool,
    pub system_id: Option<MacAddr>,
    pub partner_id: Option<MacAddr>,
}

// Neighbor (ARP or ND) cache entry. The MAC address is missing until the
// entry is resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Neighbor {
    pub interface: String,
    pub address: IpAddr,
    #[serde(default)]
    pub mac: Option<MacAddr>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InterfaceState {
    pub oper_status: OperStatus,
}

// LACP state of a DUT bundle member.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LacpMember {
    pub interface: String,
    pub collecting: bool,
    pub distributing: bool,
    pub synchronization: LacpSynchronization,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
struct LacpInterface {
    members: Vec<LacpMember>,
}

/// Typed reader over a [`TelemetrySource`].
///
/// Traffic generator state lives under `/otg`, device state under `/dut`.
#[derive(Debug, new)]
pub struct Telemetry<'a, S: ?Sized> {
    source: &'a S,
}

// ===== impl LinkState =====

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Up => write!(f, "up"),
            LinkState::Down => write!(f, "down"),
        }
    }
}

// ===== impl OperStatus =====

impl std::fmt::Display for OperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperStatus::Up => write!(f, "up"),
            OperStatus::Down => write!(f, "down"),
            OperStatus::LowerLayerDown => write!(f, "lower-layer-down"),
            OperStatus::Dormant => write!(f, "dormant"),
            OperStatus::Testing => write!(f, "testing"),
            OperStatus::NotPresent => write!(f, "not-present"),
            OperStatus::Unknown => write!(f, "unknown"),
        }
    }
}

// ===== impl BgpSessionState =====

impl std::fmt::Display for BgpSessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BgpSessionState::Up => write!(f, "up"),
            BgpSessionState::Down => write!(f, "down"),
        }
    }
}

// ===== impl LacpSynchronization =====

impl std::fmt::Display for LacpSynchronization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LacpSynchronization::InSync => write!(f, "in-sync"),
            LacpSynchronization::OutSync => write!(f, "out-sync"),
        }
    }
}

// ===== impl Telemetry =====

impl<S> Telemetry<'_, S>
where
    S: TelemetrySource + ?Sized,
{
    pub fn port(
        &self,
        name: &str,
    ) -> Result<Option<PortMetric>, TelemetryReadError> {
        self.read(otg_path("port", name))
    }

    pub fn flow(
        &self,
        name: &str,
    ) -> Result<Option<FlowMetric>, TelemetryReadError> {
        self.read(otg_path("flow", name))
    }

    pub fn bgp4(
        &self,
        peer: &str,
    ) -> Result<Option<BgpMetric>, TelemetryReadError> {
        self.read(otg_path("bgp4", peer))
    }

    pub fn bgp6(
        &self,
        peer: &str,
    ) -> Result<Option<BgpMetric>, TelemetryReadError> {
        self.read(otg_path("bgp6", peer))
    }

    pub fn bgp_prefixes(
        &self,
        peer: &str,
    ) -> Result<Option<BgpPrefixState>, TelemetryReadError> {
        self.read(otg_path("bgp-prefixes", peer))
    }

    pub fn isis(
        &self,
        router: &str,
    ) -> Result<Option<IsisMetric>, TelemetryReadError> {
        self.read(otg_path("isis", router))
    }

    pub fn lag(
        &self,
        name: &str,
    ) -> Result<Option<LagMetric>, TelemetryReadError> {
        self.read(otg_path("lag", name))
    }

    pub fn lacp_member(
        &self,
        port: &str,
    ) -> Result<Option<LacpMemberMetric>, TelemetryReadError> {
        self.read(otg_path("lacp", port))
    }

    pub fn ipv4_neighbors(&self) -> Result<Vec<Neighbor>, TelemetryReadError> {
        self.read(otg_path("neighbors", "ipv4"))
            .map(Option::unwrap_or_default)
    }

    pub fn ipv6_neighbors(&self) -> Result<Vec<Neighbor>, TelemetryReadError> {
        self.read(otg_path("neighbors", "ipv6"))
            .map(Option::unwrap_or_default)
    }

    pub fn dut_interface(
        &self,
        name: &str,
    ) -> Result<Option<InterfaceState>, TelemetryReadError> {
        self.read(dut_path("interface", name))
    }

    /// Returns the members of a DUT bundle, in the order the device reports
    /// them.
    pub fn dut_lacp_members(
        &self,
        bundle: &str,
    ) -> Result<Vec<LacpMember>, TelemetryReadError> {
        self.read::<LacpInterface>(dut_path("lacp", bundle))
            .map(|iface| iface.unwrap_or_default().members)
    }

    fn read<T>(
        &self,
        path: TelemetryPath,
    ) -> Result<Option<T>, TelemetryReadError>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.source.get(&path)? else {
            return Ok(None);
        };
        serde_json::from_value(value).map(Some).map_err(|error| {
            TelemetryReadError::Decode {
                path: path.to_string(),
                error,
            }
        })
    }
}

// ===== global functions =====

pub fn otg_path(kind: &str, name: &str) -> TelemetryPath {
    TelemetryPath::new(["otg", kind, name])
}

pub fn dut_path(kind: &str, name: &str) -> TelemetryPath {
    TelemetryPath::new(["dut", kind, name])
}
