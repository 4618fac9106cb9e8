//! `PostgreSQL` data store implementation for the event registration system.
//!
//! This crate provides [`PostgresDataStore`], an implementation of the
//! `DataStore` trait from `eventreg-core`. Every logical table lives in one
//! `store_items` table of JSONB documents, and supports:
//!
//! - Conditional inserts (key and unique-attribute conditions)
//! - Atomic, optionally bounded counter increments
//! - Containment scans backed by a GIN index
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use eventreg_core::TableNames;
//! use eventreg_postgres::PostgresDataStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresDataStore::new("postgres://localhost/eventreg", TableNames::default()).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod data_store;

pub use data_store::PostgresDataStore;
