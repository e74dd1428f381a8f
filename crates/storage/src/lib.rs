//! Storage layer for Outfit Planner
//!
//! This crate provides the secure key-value store the auth client uses to keep
//! session credentials between launches.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod secure_store;

pub use secure_store::{FileStore, MemoryStore, SecureStore, StoreConfig, StoreError};
