//! services/api/src/stores/company.rs
//!
//! The company settings store. The settings row is a singleton; the store
//! also handles logo uploads into the branding prefix of the blob store.

use std::sync::Arc;

use firesafe_core::domain::CompanyInfo;
use firesafe_core::ports::{DataStore, FileStore, Notifier, PortResult};

use super::cache::{with_retries, RetryPolicy, SingletonCache};

const BRANDING_PREFIX: &str = "branding";

pub struct CompanyStore {
    db: Arc<dyn DataStore>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn Notifier>,
    cache: SingletonCache<Option<CompanyInfo>>,
    retry: RetryPolicy,
}

impl CompanyStore {
    pub fn new(
        db: Arc<dyn DataStore>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            files,
            notifier,
            cache: SingletonCache::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// The stored company settings, or `None` before first save. A fetched
    /// absence is cached too.
    pub async fn get(&self) -> PortResult<Option<CompanyInfo>> {
        if let Some(cached) = self.cache.get().await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || self.db.get_company_info()).await?;
        self.cache.put(fetched.clone()).await;
        Ok(fetched)
    }

    pub async fn update(&self, info: CompanyInfo) -> PortResult<()> {
        match self.db.upsert_company_info(info).await {
            Ok(()) => {
                self.cache.invalidate().await;
                self.notifier.success("Company information updated successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to update company information");
                Err(e)
            }
        }
    }

    /// Stores a new logo under the branding prefix and returns its path.
    /// The caller persists the path via `update`.
    pub async fn upload_logo(&self, file_name: &str, bytes: &[u8]) -> PortResult<String> {
        let path = format!("{}/{}", BRANDING_PREFIX, file_name);
        self.files.upload(&path, bytes).await
    }

    pub async fn logo_bytes(&self, path: &str) -> PortResult<Vec<u8>> {
        self.files.download(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::testutil::{MemoryFileStore, MockDataStore, RecordingNotifier};

    fn sample_info(name: &str) -> CompanyInfo {
        CompanyInfo {
            name: name.to_string(),
            address: None,
            phone: None,
            email: None,
            website: None,
            logo_path: None,
            notify_renewals: true,
            notify_inspections: false,
            notify_failures: false,
            notify_users: false,
        }
    }

    fn fixture() -> (Arc<MockDataStore>, Arc<RecordingNotifier>, CompanyStore) {
        let db = Arc::new(MockDataStore::default());
        let files = Arc::new(MemoryFileStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CompanyStore::new(db.clone(), files, notifier.clone());
        (db, notifier, store)
    }

    #[tokio::test]
    async fn absence_before_first_save_is_cached() {
        let (_db, _notifier, store) = fixture();
        assert!(store.get().await.unwrap().is_none());
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_invalidates_and_next_get_sees_the_new_row() {
        let (_db, notifier, store) = fixture();
        store.get().await.unwrap();
        store.update(sample_info("JACS Fire")).await.unwrap();

        let fetched = store.get().await.unwrap().unwrap();
        assert_eq!(fetched.name, "JACS Fire");
        assert_eq!(
            notifier.successes.lock().unwrap().as_slice(),
            ["Company information updated successfully"]
        );
    }

    #[tokio::test]
    async fn logo_upload_returns_a_branding_path() {
        let (_db, _notifier, store) = fixture();
        let path = store.upload_logo("logo.png", b"png").await.unwrap();
        assert_eq!(path, "branding/logo.png");
        assert_eq!(store.logo_bytes(&path).await.unwrap(), b"png");
    }
}
