//! Domain models for accounts and tenant domains.

pub mod account;
pub mod domain;
