// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Idempotent registration of keys in an `authorized_keys` file.
//!
//! Entries are appended as `<policy> <key>`; existing lines are never
//! rewritten or reordered. Lines written by other tools are only read when
//! scanning for duplicates.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{PublicKey, SharePolicy};

/// An `authorized_keys` file managed under a fixed [`SharePolicy`].
#[derive(Clone, Debug)]
pub struct AuthorizedKeys {
    path: PathBuf,
    policy: SharePolicy,
}

impl AuthorizedKeys {
    pub fn new(path: impl Into<PathBuf>, policy: SharePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &SharePolicy {
        &self.policy
    }

    /// Whether the file holds the policy-wrapped entry for `key`.
    ///
    /// A missing file simply means nothing is registered yet.
    ///
    /// # Errors
    ///
    /// [`Error::AuthorizedKeys`] when the file exists but cannot be read.
    pub fn is_registered(&self, key: &PublicKey) -> Result<bool> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(contains_entry(
                &String::from_utf8_lossy(&bytes),
                &self.policy.entry_for(key),
            )),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Append the entry for `key` unless it is already present.
    ///
    /// Returns the key when a line was written and `None` when it was
    /// already registered. The check and the append happen under an
    /// exclusive lock on the file. Missing files are created with mode
    /// `0600` (and a missing parent directory with `0700`).
    ///
    /// # Errors
    ///
    /// [`Error::AuthorizedKeys`] on any I/O failure; nothing is retried.
    pub fn register(&self, key: &PublicKey) -> Result<Option<PublicKey>> {
        self.ensure_parent_dir()?;

        let mut file = open_for_append(&self.path).map_err(|e| self.io_error(e))?;
        file.lock().map_err(|e| self.io_error(e))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| self.io_error(e))?;
        let contents = String::from_utf8_lossy(&bytes);

        let entry = self.policy.entry_for(key);
        if contains_entry(&contents, &entry) {
            debug!(fingerprint = key.fingerprint(), "key already registered");
            return Ok(None);
        }

        let mut line = String::with_capacity(entry.len() + 2);
        // Don't glue the entry onto a final line that lacks its newline.
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&entry);
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| self.io_error(e))?;

        info!(
            fingerprint = key.fingerprint(),
            path = %self.path.display(),
            "registered key"
        );
        Ok(Some(key.clone()))
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                let mut builder = fs::DirBuilder::new();
                builder.recursive(true);
                #[cfg(unix)]
                {
                    use std::os::unix::fs::DirBuilderExt;
                    builder.mode(0o700);
                }
                builder.create(parent).map_err(|e| self.io_error(e))
            }
            _ => Ok(()),
        }
    }

    fn io_error(&self, source: io::Error) -> Error {
        Error::AuthorizedKeys {
            path: self.path.clone(),
            source,
        }
    }
}

fn open_for_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Lines are split on `\n` only; a `\r\n`-terminated copy is not a match.
fn contains_entry(contents: &str, entry: &str) -> bool {
    contents.split('\n').any(|line| line == entry)
}
