//! Storedesk HTTP client
//!
//! Authenticated access to the storedesk admin API: credential storage,
//! single-flight token refresh and typed wrappers for each resource family.

pub mod client;
pub mod types;

pub use client::{AdminClient, AdminClientBuilder, ClientError};
