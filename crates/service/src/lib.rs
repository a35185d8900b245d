//! Service layer for banner administration.
//! - `settings`: key/value settings store contract plus HTTP and JSON-file adapters.
//! - `dates`: expiration date normalization.
//! - `banner`: banner CRUD built on the two collaborators above.

pub mod errors;
pub mod settings;
pub mod dates;
pub mod banner;
#[cfg(test)]
pub mod test_support;

pub use banner::{BannerEntry, BannerManager, BannerUpdate, NewBanner};
pub use dates::{ChronoDateNormalizer, DateNormalizer};
pub use errors::ServiceError;
pub use settings::{HttpSettingsStore, JsonFileSettingsStore, SettingsStore, UserScope};
