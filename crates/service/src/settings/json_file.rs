use std::{collections::BTreeMap, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::{check_key, Entries, SettingsError, SettingsStore, UserScope};

type ScopedEntries = BTreeMap<String, Entries>;

/// JSON file-backed settings store.
///
/// Persists `{scope: {full_key: value}}` and rewrites the file after every
/// mutation. Intended for offline use and tests where the remote service is
/// not reachable.
#[derive(Clone)]
pub struct JsonFileSettingsStore {
    inner: Arc<RwLock<ScopedEntries>>,
    file_path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, SettingsError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsError::Io(format!("{}: {e}", parent.display())))?;
        }

        let map: ScopedEntries = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => ScopedEntries::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SettingsError::Decode(format!("{}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = ScopedEntries::new();
                write_file(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(SettingsError::Io(format!("{}: {e}", file_path.display()))),
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self) -> Result<(), SettingsError> {
        let map = self.inner.read().await;
        write_file(&self.file_path, &map).await
    }
}

async fn write_file(path: &Path, map: &ScopedEntries) -> Result<(), SettingsError> {
    let data = serde_json::to_vec_pretty(map).map_err(|e| SettingsError::Decode(e.to_string()))?;
    fs::write(path, data)
        .await
        .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn list(&self, scope: UserScope, key: &str) -> Result<Entries, SettingsError> {
        check_key(key)?;
        let prefix = format!("{key}/");
        let map = self.inner.read().await;
        let entries: Entries = map
            .get(scope.as_str())
            .map(|scoped| {
                scoped
                    .iter()
                    .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|id| (id.to_string(), v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        debug!(%scope, key, count = entries.len(), "listed settings from file");
        Ok(entries)
    }

    async fn add_or_update(&self, scope: UserScope, entries: Entries) -> Result<(), SettingsError> {
        for key in entries.keys() {
            check_key(key)?;
        }
        let mut map = self.inner.write().await;
        map.entry(scope.as_str().to_string()).or_default().extend(entries);
        drop(map);
        self.save().await
    }

    async fn remove(&self, scope: UserScope, key: &str) -> Result<(), SettingsError> {
        check_key(key)?;
        let mut map = self.inner.write().await;
        let existed = map.get_mut(scope.as_str()).and_then(|scoped| scoped.remove(key)).is_some();
        drop(map);
        debug!(%scope, key, existed, "removed setting from file");
        self.save().await
    }
}
