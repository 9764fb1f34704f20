//! Property-based test generators using proptest.

use guidestore::EntityId;
use proptest::prelude::*;

/// Strategy for generating entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>())
        .prop_filter_map("nil ids mean unassigned", |bytes| {
            EntityId::from_slice(&bytes).filter(|id| !id.is_nil())
        })
}

/// Strategy for category names in mixed case, some differing only in case.
pub fn category_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Networking", "networking", "NETWORKING", "Hardware", "hardware", "Accounts", "Printers",
        "printers", "Security", "Mobile",
    ])
    .prop_map(str::to_string)
}

/// Strategy for guide titles.
pub fn guide_title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,23}").expect("Invalid regex")
}

/// Strategy for a progress history: completion minutes, `None` for
/// records still in progress.
pub fn progress_history_strategy() -> impl Strategy<Value = Vec<Option<u32>>> {
    prop::collection::vec(prop::option::of(1u32..600), 0..20)
}
