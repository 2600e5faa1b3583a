// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Classification of a single line of `--import` input.
//!
//! The checks run in a fixed order and the first match wins:
//! existing path, web URL, GitHub username, literal key. Input that is
//! ambiguous (a username that is also a file in the working directory, say)
//! resolves by that order.

use std::path::Path;

/// Longest username GitHub accepts.
const MAX_USERNAME_LEN: usize = 39;

/// Only this algorithm prefix is kept out of the username branch.
const RSA_PREFIX: &str = "ssh-rsa";

/// Where the keys for one input line come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource<'a> {
    FilePath(&'a Path),
    WebUrl(&'a str),
    GitHubUser(&'a str),
    LiteralKey(&'a str),
}

impl<'a> KeySource<'a> {
    /// Classify one (already trimmed) input line.
    pub fn classify(line: &'a str) -> Self {
        let path = Path::new(line);
        if !line.is_empty() && path.exists() {
            Self::FilePath(path)
        } else if is_valid_web_url(line) {
            Self::WebUrl(line)
        } else if is_valid_username(line) && !line.starts_with(RSA_PREFIX) {
            Self::GitHubUser(line)
        } else {
            Self::LiteralKey(line)
        }
    }
}

/// Prefix match for `(https?://)?<alnum>+.<tld>`.
///
/// Only the start of the string is inspected, so anything after the first
/// dot (paths, ports, queries) is accepted as-is.
pub fn is_valid_web_url(value: &str) -> bool {
    let with_scheme = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(host_then_dot);
    with_scheme || host_then_dot(value)
}

fn host_then_dot(value: &str) -> bool {
    let bytes = value.as_bytes();
    let host_len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    host_len > 0 && bytes.get(host_len) == Some(&b'.')
}

/// GitHub username rules: ASCII alphanumerics or single hyphens, no hyphen at
/// either end, at most 39 characters.
pub fn is_valid_username(username: &str) -> bool {
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return false;
    }
    if !username
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return false;
    }
    !(username.starts_with('-') || username.ends_with('-') || username.contains("--"))
}
