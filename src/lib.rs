// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Import SSH public keys into a restricted, rsync-only `authorized_keys`
//! entry and provision a size-limited FAT share for incoming transfers.

pub mod app;
pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod output;
pub mod utils;
