//! Fixtures for unit tests.

#![allow(dead_code)]

pub use crate::synthetic::{Field, NoiseRng};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
pub fn init_tracing() {
    common::init_test_tracing();
}
