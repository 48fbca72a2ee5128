//! Shared utilities.
//!
//! Hashing, canonical JSON, log redaction and test helpers.

pub mod canonical;
pub mod hash;
pub mod redact;

#[cfg(test)]
pub mod testutil;
