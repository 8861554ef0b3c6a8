//! MongoDB store driver for docmodel.
//!
//! This crate provides a MongoDB-based implementation of the `StoreDriver` trait. Filters,
//! sorts and update documents are handed to the server as they are, so everything the
//! server's query language supports can be used from a query builder.
//!
//! To use this driver, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmodel = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The connection string names the database, as in `mongodb://localhost:27017/app`.
//! Server failures are passed through as `AdapterError::Store` wrapping the driver's
//! own `mongodb::error::Error`.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::{prelude::*, mongodb::MongoDriver};
//!
//! let adapter = Adapter::connect(mapper, MongoDriver::builder("mongodb://localhost:27017/app")).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_mongodb;

pub mod store;

pub use store::{MongoDriver, MongoDriverBuilder};
