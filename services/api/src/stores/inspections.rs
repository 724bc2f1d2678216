//! services/api/src/stores/inspections.rs
//!
//! The inspection store. Creating or updating an inspection is a sequenced
//! multi-step flow (inspection row, then checklist items, then file uploads)
//! with no rollback: a failure partway through leaves the earlier steps in
//! place and surfaces a single error notification.

use std::sync::Arc;

use firesafe_core::domain::{Inspection, InspectionDetail, NewInspection, NewInspectionItem};
use firesafe_core::ports::{DataStore, FileStore, Notifier, PortResult};
use futures::future::try_join_all;
use uuid::Uuid;

use super::cache::{with_retries, ListCache, RetryPolicy};

/// An attachment to store alongside an inspection: (file name, bytes).
pub type Upload = (String, Vec<u8>);

fn attachment_prefix(inspection_id: Uuid) -> String {
    format!("inspections/{}", inspection_id)
}

pub struct InspectionStore {
    db: Arc<dyn DataStore>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn Notifier>,
    cache: ListCache<InspectionDetail>,
    retry: RetryPolicy,
}

impl InspectionStore {
    pub fn new(
        db: Arc<dyn DataStore>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            files,
            notifier,
            cache: ListCache::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// All inspections with client summary and items, newest first, cached
    /// until the next inspection mutation.
    pub async fn list(&self) -> PortResult<Arc<Vec<InspectionDetail>>> {
        if let Some(cached) = self.cache.get("all").await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || self.db.list_inspections()).await?;
        let shared = Arc::new(fetched);
        self.cache.put("all", Arc::clone(&shared)).await;
        Ok(shared)
    }

    /// Creates the inspection row, then its items, then stores attachments
    /// concurrently. Steps are not transactional.
    pub async fn create(
        &self,
        inspection: NewInspection,
        items: Vec<NewInspectionItem>,
        uploads: Vec<Upload>,
    ) -> PortResult<Inspection> {
        match self.create_inner(inspection, items, uploads).await {
            Ok(created) => {
                self.cache.invalidate().await;
                self.notifier.success("Inspection created successfully");
                Ok(created)
            }
            Err(e) => {
                self.notifier.error("Failed to create inspection");
                Err(e)
            }
        }
    }

    async fn create_inner(
        &self,
        inspection: NewInspection,
        items: Vec<NewInspectionItem>,
        uploads: Vec<Upload>,
    ) -> PortResult<Inspection> {
        let created = self.db.create_inspection(inspection).await?;
        self.db.insert_items(created.id, items).await?;
        self.store_attachments(created.id, uploads).await?;
        Ok(created)
    }

    /// Updates the inspection row and fully replaces its item set.
    pub async fn update(
        &self,
        id: Uuid,
        inspection: NewInspection,
        items: Vec<NewInspectionItem>,
        uploads: Vec<Upload>,
    ) -> PortResult<()> {
        match self.update_inner(id, inspection, items, uploads).await {
            Ok(()) => {
                self.cache.invalidate().await;
                self.notifier.success("Inspection updated successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to update inspection");
                Err(e)
            }
        }
    }

    async fn update_inner(
        &self,
        id: Uuid,
        inspection: NewInspection,
        items: Vec<NewInspectionItem>,
        uploads: Vec<Upload>,
    ) -> PortResult<()> {
        self.db.update_inspection(id, inspection).await?;
        self.db.delete_items_for_inspection(id).await?;
        self.db.insert_items(id, items).await?;
        self.store_attachments(id, uploads).await?;
        Ok(())
    }

    /// Deletes the inspection (items cascade) and its stored attachments.
    pub async fn delete(&self, id: Uuid) -> PortResult<()> {
        match self.delete_inner(id).await {
            Ok(()) => {
                self.cache.invalidate().await;
                self.notifier.success("Inspection deleted successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to delete inspection");
                Err(e)
            }
        }
    }

    async fn delete_inner(&self, id: Uuid) -> PortResult<()> {
        self.db.delete_inspection(id).await?;
        let stored = self.files.list(&attachment_prefix(id)).await?;
        if !stored.is_empty() {
            self.files.remove(&stored).await?;
        }
        Ok(())
    }

    async fn store_attachments(&self, id: Uuid, uploads: Vec<Upload>) -> PortResult<()> {
        let prefix = attachment_prefix(id);
        try_join_all(uploads.iter().map(|(name, bytes)| {
            let path = format!("{}/{}", prefix, name);
            let files = Arc::clone(&self.files);
            async move { files.upload(&path, bytes).await }
        }))
        .await?;
        Ok(())
    }

    pub async fn attachments(&self, id: Uuid) -> PortResult<Vec<String>> {
        self.files.list(&attachment_prefix(id)).await
    }

    pub async fn attachment_bytes(&self, path: &str) -> PortResult<Vec<u8>> {
        self.files.download(path).await
    }
}
