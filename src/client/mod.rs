//! Catalog service client module.

pub mod api;
pub mod models;

pub use api::{ApiClientError, CatalogApi, CatalogClient, PAGE_SIZE};
