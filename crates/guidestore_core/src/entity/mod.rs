//! Document identity.

mod id;

pub use id::EntityId;
