//! # navbridge Store
//!
//! Durable key/value store used to carry state across host-process restarts.
//!
//! The store is a flat map of string keys to string values. It does not
//! interpret what it stores; higher layers own the key layout.
//!
//! ## Design Principles
//!
//! - Values survive process exit once a write call returns
//! - Multi-key writes land atomically (all or nothing)
//! - Must be `Send + Sync` so it can be shared with a host's main loop
//! - A store-wide exclusive lock lets exactly one process consume a record
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral state
//! - [`FileStore`] - JSON file written with write-then-rename
//!
//! ## Example
//!
//! ```rust
//! use navbridge_store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("swap.pending", "1700000000").unwrap();
//! assert_eq!(store.get("swap.pending").unwrap().as_deref(), Some("1700000000"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{KeyValueStore, StoreLock};
