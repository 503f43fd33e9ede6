// SPDX-License-Identifier: Apache-2.0

//! Secret source: Vault KV mount discovery and secret reads.

pub mod client;
pub mod mounts;

pub use client::VaultClient;
pub use mounts::{Mount, SecretKind, VaultSecret};
