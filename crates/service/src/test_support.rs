#![cfg(test)]
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::dates::ChronoDateNormalizer;
use crate::banner::BannerManager;
use crate::settings::{Entries, SettingsError, SettingsStore, UserScope};

/// In-memory settings store that counts calls and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    host: RwLock<Entries>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    fail_with: RwLock<Option<String>>,
}

impl MemoryStore {
    pub async fn fail_next_calls(&self, message: &str) {
        *self.fail_with.write().await = Some(message.to_string());
    }

    pub async fn snapshot(&self) -> Entries {
        self.host.read().await.clone()
    }

    pub fn mutations(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> Result<(), SettingsError> {
        match self.fail_with.read().await.as_ref() {
            Some(msg) => Err(SettingsError::Transport(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn list(&self, scope: UserScope, key: &str) -> Result<Entries, SettingsError> {
        assert_eq!(scope, UserScope::Host);
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        let prefix = format!("{key}/");
        let map = self.host.read().await;
        Ok(map
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|id| (id.to_string(), v.clone())))
            .collect())
    }

    async fn add_or_update(&self, scope: UserScope, entries: Entries) -> Result<(), SettingsError> {
        assert_eq!(scope, UserScope::Host);
        self.check_failure().await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.host.write().await.extend(entries);
        Ok(())
    }

    async fn remove(&self, scope: UserScope, key: &str) -> Result<(), SettingsError> {
        assert_eq!(scope, UserScope::Host);
        self.check_failure().await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.host.write().await.remove(key);
        Ok(())
    }
}

/// Manager over a fresh in-memory store with an isolated namespace.
pub fn manager() -> (BannerManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let manager = BannerManager::with_namespace(
        store.clone(),
        Arc::new(ChronoDateNormalizer::default()),
        "TestBanners",
    );
    (manager, store)
}
