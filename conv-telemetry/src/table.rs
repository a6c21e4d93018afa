//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use conv_utils::mac_addr::MacAddr;
use derive_new::new;

use crate::metrics::{
    BgpMetric, FlowMetric, IsisMetric, LacpMember, LacpMemberMetric,
    LagMetric, PortMetric,
};

// Fixed-width text table used to log the last observed telemetry.
#[derive(Debug, new)]
pub struct Table {
    title: &'static str,
    width: usize,
    columns: Vec<(&'static str, usize)>,
    #[new(default)]
    rows: Vec<Vec<String>>,
}

// ===== impl Table =====

impl Table {
    pub fn row<I>(&mut self, cells: I)
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.rows
            .push(cells.into_iter().map(|cell| cell.to_string()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn write_row<'a>(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        cells: impl Iterator<Item = &'a str>,
    ) -> std::fmt::Result {
        for (&(_, width), cell) in self.columns.iter().zip(cells) {
            write!(f, "{cell:<width$}")?;
        }
        writeln!(f)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "-".repeat(self.width);
        writeln!(f)?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{rule}")?;
        self.write_row(f, self.columns.iter().map(|(name, _)| *name))?;
        for row in &self.rows {
            self.write_row(f, row.iter().map(String::as_str))?;
        }
        writeln!(f, "{rule}")
    }
}

// ===== global functions =====

pub fn port_table<'a>(
    ports: impl IntoIterator<Item = (&'a str, &'a PortMetric)>,
) -> Table {
    let mut table = Table::new(
        "Port Metrics",
        120,
        vec![
            ("Name", 25),
            ("Frames Tx", 15),
            ("Frames Rx", 15),
            ("Bytes Tx", 15),
            ("Bytes Rx", 15),
            ("FPS Tx", 15),
            ("FPS Rx", 15),
            ("Link", 15),
        ],
    );
    for (name, m) in ports {
        table.row([
            name.to_owned(),
            m.frames_tx.to_string(),
            m.frames_rx.to_string(),
            m.bytes_tx.to_string(),
            m.bytes_rx.to_string(),
            m.frames_tx_rate.to_string(),
            m.frames_rx_rate.to_string(),
            m.link.to_string(),
        ]);
    }
    table
}

pub fn flow_table<'a>(
    flows: impl IntoIterator<Item = (&'a str, &'a FlowMetric)>,
) -> Table {
    let mut table = Table::new(
        "Flow Metrics",
        80,
        vec![
            ("Name", 25),
            ("Frames Tx", 15),
            ("Frames Rx", 15),
            ("FPS Tx", 15),
            ("FPS Rx", 15),
        ],
    );
    for (name, m) in flows {
        table.row([
            name.to_owned(),
            m.frames_tx.to_string(),
            m.frames_rx.to_string(),
            m.frames_tx_rate.to_string(),
            m.frames_rx_rate.to_string(),
        ]);
    }
    table
}

pub fn bgp_table<'a>(
    title: &'static str,
    peers: impl IntoIterator<Item = (&'a str, &'a BgpMetric)>,
) -> Table {
    let mut table = Table::new(
        title,
        140,
        vec![
            ("Name", 15),
            ("State", 15),
            ("Flaps", 15),
            ("Routes Tx", 15),
            ("Routes Rx", 15),
            ("Route Withdraws Tx", 20),
            ("Route Withdraws Rx", 20),
            ("Keepalives Tx", 20),
            ("Keepalives Rx", 15),
        ],
    );
    for (name, m) in peers {
        table.row([
            name.to_owned(),
            m.session_state.to_string(),
            m.flaps.to_string(),
            m.routes_advertised.to_string(),
            m.routes_received.to_string(),
            m.route_withdraws_sent.to_string(),
            m.route_withdraws_received.to_string(),
            m.keepalives_sent.to_string(),
            m.keepalives_received.to_string(),
        ]);
    }
    table
}

pub fn isis_table<'a>(
    routers: impl IntoIterator<Item = (&'a str, &'a IsisMetric)>,
) -> Table {
    let mut table = Table::new(
        "ISIS Metrics",
        120,
        vec![
            ("Name", 15),
            ("L1 Ups", 15),
            ("L1 Flaps", 15),
            ("L1 DB Size", 15),
            ("L2 Ups", 15),
            ("L2 Flaps", 15),
            ("L2 DB Size", 15),
        ],
    );
    for (name, m) in routers {
        table.row([
            name.to_owned(),
            m.l1_sessions_up.to_string(),
            m.l1_sessions_flap.to_string(),
            m.l1_database_size.to_string(),
            m.l2_sessions_up.to_string(),
            m.l2_sessions_flap.to_string(),
            m.l2_database_size.to_string(),
        ]);
    }
    table
}

pub fn lag_table<'a>(
    lags: impl IntoIterator<Item = (&'a str, &'a LagMetric)>,
) -> Table {
    let mut table = Table::new(
        "LAG Metrics",
        120,
        vec![
            ("Name", 25),
            ("Oper Status", 15),
            ("Member Ports UP", 20),
            ("Frames Tx", 15),
            ("Frames Rx", 15),
        ],
    );
    for (name, m) in lags {
        table.row([
            name.to_owned(),
            m.oper_status.to_string(),
            m.member_ports_up.to_string(),
            m.frames_tx.to_string(),
            m.frames_rx.to_string(),
        ]);
    }
    table
}

pub fn lacp_table<'a>(
    members: impl IntoIterator<Item = (&'a str, &'a LacpMemberMetric)>,
) -> Table {
    let mut table = Table::new(
        "LACP Metrics",
        120,
        vec![
            ("LAG", 10),
            ("Member Port", 15),
            ("Synchronization", 18),
            ("Collecting", 15),
            ("Distributing", 15),
            ("System Id", 20),
            ("Partner Id", 20),
        ],
    );
    for (port, m) in members {
        table.row([
            m.lag_name.clone(),
            port.to_owned(),
            m.synchronization.to_string(),
            m.collecting.to_string(),
            m.distributing.to_string(),
            optional_mac(m.system_id),
            optional_mac(m.partner_id),
        ]);
    }
    table
}

pub fn dut_lacp_table<'a>(
    bundle: &str,
    members: impl IntoIterator<Item = &'a LacpMember>,
) -> Table {
    let mut table = Table::new(
        "DUT LACP Members",
        80,
        vec![
            ("Bundle", 20),
            ("Member", 20),
            ("Synchronization", 18),
            ("Collecting", 12),
            ("Distributing", 12),
        ],
    );
    for m in members {
        table.row([
            bundle.to_owned(),
            m.interface.clone(),
            m.synchronization.to_string(),
            m.collecting.to_string(),
            m.distributing.to_string(),
        ]);
    }
    table
}

// ===== helper functions =====

fn optional_mac(mac: Option<MacAddr>) -> String {
    mac.map(|mac| mac.to_string())
        .unwrap_or_else(|| "-".to_owned())
}

// ===== unit tests =====
