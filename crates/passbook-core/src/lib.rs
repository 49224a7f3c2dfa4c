//! Passbook Core — domain models, error taxonomy, and the record store
//! contract shared by every backend and service layer.

pub mod error;
pub mod id;
pub mod models;
pub mod store;
pub mod validate;

pub use error::{PassbookError, PassbookResult};
pub use store::{Record, RecordStore, StoreError, StoreResult};
