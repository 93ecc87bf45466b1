//! `ruleboard-catalog-client` — HTTP client for the rule service.
//!
//! Blocking reqwest client (no Tokio runtime required). Covers the full
//! editor lifecycle: catalog fetch → rows fetch per device/type pair →
//! submit of the edited data set.

mod client;

pub use client::{CatalogClient, ClientError};
