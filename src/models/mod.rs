// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Domain layer: key, key-source, and policy types shared by the resolver and the store.

pub mod key_source;
pub mod public_key;
pub mod share_policy;

pub use key_source::KeySource;
pub use public_key::PublicKey;
pub use share_policy::SharePolicy;
