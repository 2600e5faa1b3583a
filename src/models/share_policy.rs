// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Forced-command options written in front of every imported key.

use std::fmt;
use std::path::Path;

use crate::models::PublicKey;

/// `authorized_keys` options restricting a key to rsync uploads into the
/// public directory: no shell, no pty, no agent or port forwarding.
///
/// Change with care: loosening these options grants the key holder a shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharePolicy {
    options: String,
}

impl SharePolicy {
    /// Build the policy for `public_dir`. The directory is rendered with a
    /// trailing `/` so rsync treats it as the destination directory.
    pub fn new(public_dir: &Path) -> Self {
        let mut dir = public_dir.to_string_lossy().into_owned();
        if !dir.ends_with('/') {
            dir.push('/');
        }
        Self {
            options: format!(
                "command=\"rsync --server -e.LsfxC . {dir}\",no-pty,no-agent-forwarding,no-port-forwarding"
            ),
        }
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// The full `authorized_keys` line for `key`, without the newline.
    pub fn entry_for(&self, key: &PublicKey) -> String {
        format!("{} {}", self.options, key.as_str())
    }
}

impl fmt::Display for SharePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.options)
    }
}
