//! Secondary indexes.
//!
//! Indexes are derived data: they are rebuilt from the log every time the
//! file is opened and maintained on every write afterwards. Nothing about
//! them is persisted, so declaring an index on an existing file is free.
//!
//! # Index Types
//!
//! - [`HashIndex`]: equality lookup
//! - [`BTreeIndex`]: equality lookup plus ordered traversal and ranges
//!
//! Keys are [`IndexValue`]s extracted from the stored document. Text is
//! case-folded on extraction, which makes every text index
//! case-insensitive.

mod btree;
mod hash;
mod traits;
mod value;

pub use btree::BTreeIndex;
pub use hash::HashIndex;
pub use traits::{Index, IndexKey, IndexSpec};
pub use value::IndexValue;
