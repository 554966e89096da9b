//! # propdoc-store
//!
//! Store clients for the propdoc attachment engine.
//!
//! This crate provides:
//! - `PgRecordStore`: record metadata in PostgreSQL `jsonb` columns, with
//!   narrow field reads and guarded (compare-and-swap) writes
//! - `HostedObjectStore`: Supabase-style storage REST API client
//! - `LocalObjectStore`: filesystem backend for development
//! - `memory`: in-memory doubles with failure injection for tests

pub mod memory;
pub mod object_fs;
pub mod object_http;
pub mod pool;
pub mod records;

pub use object_fs::LocalObjectStore;
pub use object_http::{HostedObjectStore, HostedObjectStoreConfig};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use records::PgRecordStore;
