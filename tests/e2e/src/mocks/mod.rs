//! Test data

mod fixtures;

pub use fixtures::CatalogFactory;
