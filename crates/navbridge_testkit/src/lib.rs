//! # navbridge Testkit
//!
//! Test utilities for navbridge.
//!
//! This crate provides:
//! - A fake native library that tracks every allocation and release
//! - Fixtures for geometry, sessions and module file pairs
//! - Scripted hosts and flaky file layers for swap scenarios
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use navbridge_testkit::prelude::*;
//!
//! #[test]
//! fn quad_builds() {
//!     let mut session = fake_session(SessionConfig::default());
//!     let (vertices, triangles) = quad();
//!     let result = session.build(&GeometryBuffer::new(&vertices, &triangles), &BuildSettings::default());
//!     assert!(result.success());
//!     assert_eq!(fake::counters().live_allocations, 0);
//! }
//! ```

#![warn(missing_docs)]

pub mod doubles;
pub mod fake;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fake::{self, FakeCounters, FakeFailures, FakeLoader};
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use doubles::*;
pub use fake::{FakeCounters, FakeFailures, FakeLoader, RecordedBuild};
pub use fixtures::*;
pub use generators::*;
