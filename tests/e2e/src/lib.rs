//! Cadence End-to-End Test Support
//!
//! Shared harness and fixtures for the journey and property tests.

pub mod harness;
pub mod mocks;

pub use harness::TestStoreManager;
pub use mocks::CatalogFactory;
