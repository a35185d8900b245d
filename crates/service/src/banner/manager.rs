use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, info};
use uuid::Uuid;

use super::entry::{banner_key, merge_entry, BannerEntry, BannerOverrides, FieldUpdate};
use crate::dates::DateNormalizer;
use crate::errors::ServiceError;
use crate::settings::{Entries, SettingsStore, UserScope};

/// Setting key prefix for banners. `configs::DEFAULT_NAMESPACE` must stay equal to this.
pub const DEFAULT_NAMESPACE: &str = "GlobalMessageBanners";

const UPDATE_FIELDS_REQUIRED: &str =
    "At least one of the following arguments need to be supplied: --message, --type, --expiration.";

/// Input for creating a banner.
#[derive(Debug, Clone, Default)]
pub struct NewBanner {
    pub message: String,
    pub level: Option<String>,
    /// Generated when `None` or empty.
    pub id: Option<String>,
    /// Raw date expression, normalized before storage.
    pub expiration: Option<String>,
}

/// Input for updating a banner. An empty `expiration` clears the stored expiration.
#[derive(Debug, Clone, Default)]
pub struct BannerUpdate {
    pub message: Option<String>,
    pub level: Option<String>,
    pub expiration: Option<String>,
}

/// Banner CRUD on top of a settings store.
///
/// Every banner lives at `host` scope under `<namespace>/<id>`. Writes always
/// replace the whole entry; updates read the current entry first and merge.
#[derive(Clone)]
pub struct BannerManager {
    store: Arc<dyn SettingsStore>,
    dates: Arc<dyn DateNormalizer>,
    namespace: String,
}

impl BannerManager {
    pub fn new(store: Arc<dyn SettingsStore>, dates: Arc<dyn DateNormalizer>) -> Self {
        Self::with_namespace(store, dates, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(
        store: Arc<dyn SettingsStore>,
        dates: Arc<dyn DateNormalizer>,
        namespace: impl Into<String>,
    ) -> Self {
        Self { store, dates, namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    /// All banners as stored, keyed by id.
    pub async fn list(&self) -> Result<Entries, ServiceError> {
        let entries = self.store.list(UserScope::Host, &self.namespace).await?;
        debug!(namespace = %self.namespace, count = entries.len(), "listed banners");
        Ok(entries)
    }

    /// The stored value of one banner as `{id: value}`.
    pub async fn show(&self, id: &str) -> Result<Entries, ServiceError> {
        check_id(id)?;
        let mut entries = self.list().await?;
        let value = entries.remove(id).ok_or_else(|| ServiceError::banner_not_found(id))?;
        Ok(Entries::from([(id.to_string(), value)]))
    }

    /// Create (or overwrite) a banner; returns `{id: entry}`.
    pub async fn add(&self, banner: NewBanner) -> Result<BTreeMap<String, BannerEntry>, ServiceError> {
        if banner.message.trim().is_empty() {
            return Err(ServiceError::validation("--message must not be empty."));
        }
        check_level(banner.level.as_deref())?;
        let expiration_date = banner
            .expiration
            .as_deref()
            .map(|e| self.dates.normalize(e))
            .transpose()?;
        let id = match banner.id {
            Some(id) if !id.is_empty() => {
                check_id(&id)?;
                id
            }
            _ => Uuid::new_v4().to_string(),
        };
        let entry = BannerEntry { message: Some(banner.message), level: banner.level, expiration_date };

        self.write(&id, &entry).await?;
        info!(banner_id = %id, op = "add", "banner saved");
        Ok(BTreeMap::from([(id, entry)]))
    }

    /// Merge the supplied fields into an existing banner; returns `{id: entry}`.
    pub async fn update(
        &self,
        id: &str,
        update: BannerUpdate,
    ) -> Result<BTreeMap<String, BannerEntry>, ServiceError> {
        check_id(id)?;
        let overrides = self.overrides(update)?;
        if overrides.is_empty() {
            return Err(ServiceError::validation(UPDATE_FIELDS_REQUIRED));
        }

        let existing = self.list().await?;
        let current = existing.get(id).ok_or_else(|| ServiceError::banner_not_found(id))?;
        let entry = merge_entry(&BannerEntry::from_value(current), &overrides);

        self.write(id, &entry).await?;
        info!(banner_id = %id, op = "update", "banner saved");
        Ok(BTreeMap::from([(id.to_string(), entry)]))
    }

    /// Delete a banner. Missing ids are left to the store to report.
    pub async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        check_id(id)?;
        self.store.remove(UserScope::Host, &banner_key(&self.namespace, id)).await?;
        info!(banner_id = %id, op = "remove", "banner removed");
        Ok(())
    }

    fn overrides(&self, update: BannerUpdate) -> Result<BannerOverrides, ServiceError> {
        if update.message.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ServiceError::validation("--message must not be empty."));
        }
        check_level(update.level.as_deref())?;
        let expiration_date = match update.expiration.as_deref() {
            None => FieldUpdate::Keep,
            Some(e) if e.trim().is_empty() => FieldUpdate::Clear,
            Some(e) => FieldUpdate::Set(self.dates.normalize(e)?),
        };
        Ok(BannerOverrides { message: update.message, level: update.level, expiration_date })
    }

    async fn write(&self, id: &str, entry: &BannerEntry) -> Result<(), ServiceError> {
        let entries = Entries::from([(banner_key(&self.namespace, id), entry.to_value())]);
        self.store.add_or_update(UserScope::Host, entries).await?;
        Ok(())
    }
}

fn check_level(level: Option<&str>) -> Result<(), ServiceError> {
    if level.is_some_and(|l| l.trim().is_empty()) {
        return Err(ServiceError::validation("--type must not be empty."));
    }
    Ok(())
}

fn check_id(id: &str) -> Result<(), ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::validation("--id must be supplied."));
    }
    if id.contains('/') {
        return Err(ServiceError::validation(format!("Banner id must not contain '/': {id}")));
    }
    if id == "." || id == ".." {
        return Err(ServiceError::validation(format!("Banner id must not be '{id}'.")));
    }
    Ok(())
}
