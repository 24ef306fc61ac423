pub mod common;
pub mod e2e;
pub mod integration;

// Re-export common utilities
pub use common::{init, mock::*, test_utils::*};
