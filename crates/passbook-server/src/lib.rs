//! HTTP surface over the account service.

pub mod api;
pub mod app;
pub mod config;
