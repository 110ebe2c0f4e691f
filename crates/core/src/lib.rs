//! Storedesk core types and utilities

pub mod config;
pub mod error;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod validation;

pub use crate::config::{AdminConfig, ApiConfig, AuthConfig, LoggingConfig, StoreConfig, StoreKind};
pub use crate::error::{CoreError, CoreResult};
pub use crate::validation::{ValidateConfig, validators};
