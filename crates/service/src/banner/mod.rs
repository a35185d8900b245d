//! Organization-wide banner messages stored as host-scoped settings.

pub mod entry;
pub mod manager;

pub use entry::{banner_key, merge_entry, BannerEntry, BannerOverrides, FieldUpdate};
pub use manager::{BannerManager, BannerUpdate, NewBanner, DEFAULT_NAMESPACE};
