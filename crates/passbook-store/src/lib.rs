//! Passbook Store — [`RecordStore`] backends.
//!
//! Three backends share one logical layout (named collections of keyed
//! JSON records):
//! - [`MemoryStore`] — process-local, for tests and single-node use
//! - [`JsonFileStore`] — one JSON document on local disk, version-checked
//! - [`RemoteDocumentStore`] — one JSON document on a remote host that
//!   rejects writes carrying a stale revision token
//!
//! [`RecordStore`]: passbook_core::RecordStore

mod collections;
pub mod jsonfile;
pub mod memory;
pub mod remote;

pub use jsonfile::JsonFileStore;
pub use memory::MemoryStore;
pub use remote::{RemoteDocumentStore, RemoteStoreConfig};
