//! services/api/src/stores/clients.rs
//!
//! The client store: cached reads over the full client list and the upcoming
//! renewal window, and invalidate-on-mutation writes.

use std::sync::Arc;

use chrono::NaiveDate;
use firesafe_core::domain::{renewal_window, Client, NewClient};
use firesafe_core::ports::{DataStore, Notifier, PortResult};
use uuid::Uuid;

use super::cache::{with_retries, ListCache, RetryPolicy};

pub struct ClientStore {
    db: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    cache: ListCache<Client>,
    retry: RetryPolicy,
}

impl ClientStore {
    pub fn new(db: Arc<dyn DataStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            notifier,
            cache: ListCache::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// All clients, cached until the next client mutation.
    pub async fn list(&self) -> PortResult<Arc<Vec<Client>>> {
        if let Some(cached) = self.cache.get("all").await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || self.db.list_clients()).await?;
        let shared = Arc::new(fetched);
        self.cache.put("all", Arc::clone(&shared)).await;
        Ok(shared)
    }

    /// Clients whose contract ends during next calendar month, relative to
    /// `today`.
    pub async fn upcoming_renewals(&self, today: NaiveDate) -> PortResult<Arc<Vec<Client>>> {
        let (start, end) = renewal_window(today);
        let key = format!("renewals:{}:{}", start, end);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || {
            self.db.clients_with_contract_end_between(start, end)
        })
        .await?;
        let shared = Arc::new(fetched);
        self.cache.put(key, Arc::clone(&shared)).await;
        Ok(shared)
    }

    pub async fn create(&self, client: NewClient) -> PortResult<Client> {
        match self.db.create_client(client).await {
            Ok(created) => {
                self.cache.invalidate().await;
                self.notifier.success("Client created successfully");
                Ok(created)
            }
            Err(e) => {
                self.notifier.error("Failed to create client");
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: Uuid, client: NewClient) -> PortResult<Client> {
        match self.db.update_client(id, client).await {
            Ok(updated) => {
                self.cache.invalidate().await;
                self.notifier.success("Client updated successfully");
                Ok(updated)
            }
            Err(e) => {
                self.notifier.error("Failed to update client");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> PortResult<()> {
        match self.db.delete_client(id).await {
            Ok(()) => {
                self.cache.invalidate().await;
                self.notifier.success("Client deleted successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to delete client");
                Err(e)
            }
        }
    }
}
