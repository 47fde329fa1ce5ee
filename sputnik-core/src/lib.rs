//! Sputnik Core - Artifact triage for OSINT lookups
//!
//! This crate provides the foundational primitives:
//! - Defang reversal and normalization of user-supplied artifacts
//! - Ordered type detection (IP, hash, URL, domain)
//! - Lookup tool registry keyed by artifact type

pub mod artifacts;
pub mod services;

pub use artifacts::*;
pub use services::*;

/// Number of tool tabs that can be opened without extra confirmation
pub const OPEN_ALL_CONFIRM_THRESHOLD: usize = 5;
