// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Domain error types shared by the key, store, and share layers.

use std::io;
use std::path::PathBuf;

/// Errors raised by lansync's domain logic.
///
/// Key resolution never surfaces these to callers; they are logged and the
/// offending line is skipped. Store and share errors are fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("empty key string")]
    EmptyKey,

    #[error("invalid key: {0}")]
    InvalidKey(#[from] ssh_key::Error),

    #[error("invalid size: {0:?}")]
    InvalidSize(String),

    #[error("invalid unit {unit:?} in size {input:?} (expected one of K, M, G, T)")]
    InvalidUnit { input: String, unit: String },

    #[error("failed to access authorized keys file {path:?}: {source}")]
    AuthorizedKeys {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("share image {0:?} already exists; remove it to provision a new one")]
    ShareExists(PathBuf),

    #[error("share size of {size} bytes is below the minimum of {min} bytes")]
    ShareTooSmall { size: u64, min: u64 },

    #[error("failed to create share image {path:?}: {source}")]
    ShareIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
