//! # GuideStore Testkit
//!
//! Test utilities for GuideStore.
//!
//! This crate provides:
//! - Temporary stores, in memory or in a temp directory
//! - Entity builders with sensible defaults
//! - A blob store that records deletes and fails on demand
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use guidestore_testkit::prelude::*;
//!
//! let store = TestStore::memory();
//! let mut guide = GuideBuilder::new("Reset a router").step("Unplug", "").build();
//! store.guides().insert(&mut guide).unwrap();
//! assert_eq!(store.guides().count().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod blobs;
pub mod builders;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::blobs::*;
    pub use crate::builders::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use blobs::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
