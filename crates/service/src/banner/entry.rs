use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored shape of a banner setting. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl BannerEntry {
    /// Read the known string fields out of a stored value.
    /// Anything else in the value (extra keys, non-string fields, non-objects) is dropped.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            message: field("message"),
            level: field("level"),
            expiration_date: field("expirationDate"),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Tri-state change for a field that can be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool { matches!(self, FieldUpdate::Keep) }
}

/// Fields supplied to an update, already validated and normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerOverrides {
    pub message: Option<String>,
    pub level: Option<String>,
    pub expiration_date: FieldUpdate<String>,
}

impl BannerOverrides {
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.level.is_none() && self.expiration_date.is_keep()
    }
}

/// Overlay `overrides` onto `existing`: supplied fields win, the rest carry forward.
pub fn merge_entry(existing: &BannerEntry, overrides: &BannerOverrides) -> BannerEntry {
    BannerEntry {
        message: overrides.message.clone().or_else(|| existing.message.clone()),
        level: overrides.level.clone().or_else(|| existing.level.clone()),
        expiration_date: match &overrides.expiration_date {
            FieldUpdate::Keep => existing.expiration_date.clone(),
            FieldUpdate::Clear => None,
            FieldUpdate::Set(v) => Some(v.clone()),
        },
    }
}

/// Full setting key for a banner id.
pub fn banner_key(namespace: &str, id: &str) -> String {
    format!("{namespace}/{id}")
}
