//! In-memory store driver for docmodel.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreDriver`
//! trait. It evaluates the document store's filter, sort and update syntax on records
//! kept in async-aware read-write locks, which makes it a stand-in for a real server in
//! development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Store-native syntax** - Comparison, membership and logical filter operators
//! - **Native errors** - Duplicate keys and unknown operators surface as [`MemoryStoreError`]
//! - **Round-trip counting** - [`MemoryDriver::round_trips`] shows how often the store was hit
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::MemoryDriver};
//!
//! let adapter = Adapter::connect(mapper, MemoryDriver::builder("memory://app")).await?;
//! let users: Vec<User> = adapter.all("users").await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_memory;

pub mod driver;
pub mod error;
mod evaluator;

pub use driver::{MemoryDriver, MemoryDriverBuilder};
pub use error::MemoryStoreError;
