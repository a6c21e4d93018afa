//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use conv_utils::mac_addr::MacAddr;
use conv_utils::set;
use serde::{Deserialize, Serialize};

use crate::metrics::{
    BgpSessionState, LacpSynchronization, LinkState, OperStatus,
};

/// State that telemetry is expected to converge to.
///
/// Each scenario step builds its own value, usually derived from the previous
/// step's one through the `with_*` methods, and hands it to the predicates by
/// reference. Sections left empty aren't checked.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedState {
    pub ports: BTreeMap<String, ExpectedPort>,
    pub flows: BTreeMap<String, ExpectedFlow>,
    pub traffic: Option<ExpectedTraffic>,
    pub bgp4: BTreeMap<String, ExpectedBgp>,
    pub bgp6: BTreeMap<String, ExpectedBgp>,
    pub bgp_prefixes: BTreeMap<String, ExpectedBgpPrefixes>,
    pub isis: BTreeMap<String, ExpectedIsis>,
    pub lags: BTreeMap<String, ExpectedLag>,
    pub lacp: BTreeMap<String, ExpectedLacp>,
    pub dut_interfaces: BTreeMap<String, OperStatus>,
    pub dut_bundles: BTreeMap<String, Vec<String>>,
    pub dut_lacp_members: BTreeMap<String, ExpectedLacpMembers>,
    pub ipv4_neighbor_macs: BTreeSet<MacAddr>,
    pub ipv6_neighbor_macs: BTreeSet<MacAddr>,
}

// Expected LACP state of the members of a DUT bundle, keyed by interface.
pub type ExpectedLacpMembers = BTreeMap<String, ExpectedLacpMember>;

// Fields set to `None` aren't checked.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedPort {
    pub frames_rx: Option<u64>,
    pub link: Option<LinkState>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedFlow {
    pub frames_rx: Option<u64>,
    pub frames_rx_rate: Option<f32>,
}

// Every frame sent by the listed flows must have been received.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedTraffic {
    pub flows: BTreeSet<String>,
    pub frames_rx: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedBgp {
    pub state: BgpSessionState,
    #[serde(default)]
    pub routes_advertised: Option<u64>,
    #[serde(default)]
    pub routes_received: Option<u64>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedBgpPrefixes {
    pub ipv4: usize,
    pub ipv6: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedIsis {
    pub l1_sessions_up: Option<u32>,
    pub l2_sessions_up: Option<u32>,
    pub l1_database_size: Option<u32>,
    pub l2_database_size: Option<u32>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedLag {
    pub oper_status: OperStatus,
    pub member_ports_up: u32,
}

// Expected LACP state of a traffic generator LAG member port.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedLacp {
    pub lag: String,
    pub collecting: bool,
    pub distributing: bool,
    #[serde(default)]
    pub synchronization: Option<LacpSynchronization>,
}

// Expected LACP state of a DUT bundle member.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExpectedLacpMember {
    pub collecting: bool,
    pub distributing: bool,
}

// ===== impl ExpectedState =====

impl ExpectedState {
    pub fn is_empty(&self) -> bool {
        *self == ExpectedState::default()
    }

    pub fn with_port(mut self, name: &str, port: ExpectedPort) -> Self {
        self.ports.insert(name.to_owned(), port);
        self
    }

    pub fn with_flow(mut self, name: &str, flow: ExpectedFlow) -> Self {
        self.flows.insert(name.to_owned(), flow);
        self
    }

    pub fn with_traffic(mut self, traffic: ExpectedTraffic) -> Self {
        self.traffic = Some(traffic);
        self
    }

    pub fn with_bgp4(mut self, peer: &str, bgp: ExpectedBgp) -> Self {
        self.bgp4.insert(peer.to_owned(), bgp);
        self
    }

    pub fn with_bgp6(mut self, peer: &str, bgp: ExpectedBgp) -> Self {
        self.bgp6.insert(peer.to_owned(), bgp);
        self
    }

    pub fn with_bgp_prefixes(
        mut self,
        peer: &str,
        prefixes: ExpectedBgpPrefixes,
    ) -> Self {
        self.bgp_prefixes.insert(peer.to_owned(), prefixes);
        self
    }

    pub fn with_isis(mut self, router: &str, isis: ExpectedIsis) -> Self {
        self.isis.insert(router.to_owned(), isis);
        self
    }

    pub fn with_lag(mut self, name: &str, lag: ExpectedLag) -> Self {
        self.lags.insert(name.to_owned(), lag);
        self
    }

    pub fn with_lacp(mut self, port: &str, lacp: ExpectedLacp) -> Self {
        self.lacp.insert(port.to_owned(), lacp);
        self
    }

    pub fn with_dut_interface(
        mut self,
        name: &str,
        status: OperStatus,
    ) -> Self {
        self.dut_interfaces.insert(name.to_owned(), status);
        self
    }

    pub fn with_dut_bundle<I, M>(mut self, bundle: &str, members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.dut_bundles.insert(bundle.to_owned(), members);
        self
    }

    /// Removes `member` from the expected members of `bundle`, typically
    /// after its port was brought down.
    pub fn without_dut_bundle_member(
        mut self,
        bundle: &str,
        member: &str,
    ) -> Self {
        if let Some(members) = self.dut_bundles.get_mut(bundle) {
            *members = set::without(members, &member.to_owned());
        }
        self
    }

    pub fn with_dut_lacp_member(
        mut self,
        bundle: &str,
        member: &str,
        lacp: ExpectedLacpMember,
    ) -> Self {
        self.dut_lacp_members
            .entry(bundle.to_owned())
            .or_default()
            .insert(member.to_owned(), lacp);
        self
    }

    pub fn with_ipv4_neighbor_mac(mut self, mac: MacAddr) -> Self {
        self.ipv4_neighbor_macs.insert(mac);
        self
    }

    pub fn with_ipv6_neighbor_mac(mut self, mac: MacAddr) -> Self {
        self.ipv6_neighbor_macs.insert(mac);
        self
    }
}

// ===== impl ExpectedBgp =====

impl ExpectedBgp {
    pub fn up(routes_advertised: u64, routes_received: u64) -> ExpectedBgp {
        ExpectedBgp {
            state: BgpSessionState::Up,
            routes_advertised: Some(routes_advertised),
            routes_received: Some(routes_received),
        }
    }

    pub fn down() -> ExpectedBgp {
        ExpectedBgp {
            state: BgpSessionState::Down,
            routes_advertised: None,
            routes_received: None,
        }
    }
}

// ===== impl ExpectedLag =====

impl ExpectedLag {
    pub fn up(member_ports_up: u32) -> ExpectedLag {
        ExpectedLag {
            oper_status: OperStatus::Up,
            member_ports_up,
        }
    }

    pub fn down() -> ExpectedLag {
        ExpectedLag {
            oper_status: OperStatus::Down,
            member_ports_up: 0,
        }
    }
}

// ===== impl ExpectedLacp =====

impl ExpectedLacp {
    pub fn active(lag: &str) -> ExpectedLacp {
        ExpectedLacp {
            lag: lag.to_owned(),
            collecting: true,
            distributing: true,
            synchronization: Some(LacpSynchronization::InSync),
        }
    }

    pub fn inactive(lag: &str) -> ExpectedLacp {
        ExpectedLacp {
            lag: lag.to_owned(),
            collecting: false,
            distributing: false,
            synchronization: None,
        }
    }
}
