//! Catalog entities.
//!
//! Every entity is a serde document. Timestamps are stored as integer
//! milliseconds so the engine's BTree indexes order them numerically.

mod category;
mod guide;
mod progress;
mod setting;
mod user;

pub use category::Category;
pub use guide::{Guide, Step};
pub use progress::{Progress, ProgressState, MAX_NOTES_LEN};
pub use setting::AppSetting;
pub use user::{ParseRoleError, User, UserRole};
