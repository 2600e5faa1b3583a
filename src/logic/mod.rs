// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Business logic: key resolution, authorized-keys management, and share images.

pub mod authorized_keys;
pub mod fetch;
pub mod resolver;
pub mod share;

pub use authorized_keys::AuthorizedKeys;
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use resolver::KeyResolver;
pub use share::{ShareImage, ShareProvisioner};
