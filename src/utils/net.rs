// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! LAN address discovery for the client hint.

use std::net::{IpAddr, UdpSocket};

use tracing::debug;

/// Any routable address works; no packet is sent by `connect` on UDP.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Address of the interface the default route would use, if any.
pub fn local_ip() -> Option<IpAddr> {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(PROBE_ADDR)?;
        Ok(socket.local_addr()?.ip())
    };
    match probe() {
        Ok(ip) => Some(ip),
        Err(err) => {
            debug!(error = %err, "could not determine local address");
            None
        }
    }
}
