// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Home-relative path helpers for configuration values.

use std::path::{Path, PathBuf};

/// Expand a leading `~` or `~/` against `home`; other paths pass through.
pub fn expand_tilde(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        home.to_path_buf()
    } else if let Some(rest) = value.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(value)
    }
}
