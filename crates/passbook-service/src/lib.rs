//! Passbook Service — domain registry and account operations.
//!
//! Generic over [`RecordStore`] implementations so the same operation set
//! runs unchanged against the in-memory, file, and remote backends.
//!
//! [`RecordStore`]: passbook_core::RecordStore

pub mod accounts;
pub mod config;
pub mod password;
pub mod registry;

pub use accounts::{AccountService, Scope};
pub use config::ServiceConfig;
pub use registry::DomainRegistry;
