// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Shared helper utilities reused by the CLI and business logic.

pub mod command;
pub mod net;
pub mod paths;
pub mod size;

/// Run external programs behind a mockable interface.
pub use command::{CommandRunner, SystemRunner};
/// Discover the host's LAN address.
pub use net::local_ip;
/// Expand `~/` in configured paths.
pub use paths::expand_tilde;
/// Parse `10M`-style size strings into bytes.
pub use size::parse_size;
