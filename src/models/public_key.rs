// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Validated OpenSSH public key lines.

use std::fmt;
use std::str::FromStr;

use ssh_key::HashAlg;

use crate::error::{Error, Result};

/// Characters kept from the start of a key when previewing it.
const PREVIEW_HEAD: usize = 40;
/// Characters kept from the end of a key when previewing it.
const PREVIEW_TAIL: usize = 20;

/// A public key line that parsed as `<algorithm> <base64> [comment]`.
///
/// The original text is kept verbatim: two keys are equal only when their
/// lines are byte-identical, which is also how the authorized-keys store
/// detects duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    line: String,
    algorithm: String,
    fingerprint: String,
}

impl PublicKey {
    /// Validate `line` as an OpenSSH public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKey`] for blank input and [`Error::InvalidKey`]
    /// when the algorithm is unsupported or the encoded key is malformed.
    pub fn parse(line: &str) -> Result<Self> {
        if line.is_empty() {
            return Err(Error::EmptyKey);
        }
        let parsed = ssh_key::PublicKey::from_openssh(line)?;
        Ok(Self {
            line: line.to_string(),
            algorithm: parsed.algorithm().to_string(),
            fingerprint: parsed.fingerprint(HashAlg::Sha256).to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Algorithm identifier, e.g. `ssh-ed25519`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// SHA-256 fingerprint in the `SHA256:...` form printed by `ssh-keygen -l`.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Shortened rendering for terminal output: the first 40 and last 20
    /// characters around a `...<trimmed>...` marker.
    pub fn preview(&self) -> String {
        let chars: Vec<char> = self.line.chars().collect();
        if chars.len() <= PREVIEW_HEAD + PREVIEW_TAIL {
            return self.line.clone();
        }
        let head: String = chars[..PREVIEW_HEAD].iter().collect();
        let tail: String = chars[chars.len() - PREVIEW_TAIL..].iter().collect();
        format!("{head}...<trimmed>...{tail}")
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
