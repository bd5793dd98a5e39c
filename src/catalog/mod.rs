//! Catalog service integration.
//!
//! `entities` defines the resource and draft types, `client` the transport
//! trait plus the shared pagination and blocking-wait helpers, `http` the
//! reqwest implementation, and `memory` a test double that mimics the
//! service's observable behavior.

pub mod client;
pub mod entities;
pub mod http;
pub mod memory;

pub use client::{await_bounded, query_all, CatalogClient, QUERY_ALL_PAGE_SIZE};
pub use http::HttpCatalogClient;
pub use memory::InMemoryCatalog;
