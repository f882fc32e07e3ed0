//! Integration tests for the bridge witness
//!
//! This test suite validates:
//! - The end-to-end path from chain events to served attestations
//! - Idempotent signing under redelivery
//! - Checkpoint recovery across restarts and interrupted batches
//! - Byte-identical signatures from the persistent and stateless paths

pub mod test_utils;

#[cfg(test)]
mod attestation_flow_tests;

#[cfg(test)]
mod recovery_tests;

#[cfg(test)]
mod signing_path_tests;
