//! Shared building blocks for the skyscan workspace.

pub mod buffer2;
pub mod log_setup;

pub use buffer2::{Buffer2, ShapeError};
pub use log_setup::{LogConfig, LogSetupError, init_test_tracing, setup_logging};
