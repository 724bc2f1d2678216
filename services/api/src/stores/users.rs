//! services/api/src/stores/users.rs
//!
//! The user administration store: account listing, role assignment, and
//! removal. Roles and accounts are cached independently; a role mutation
//! invalidates both since the admin view joins them.

use std::sync::Arc;

use firesafe_core::domain::{User, UserRole};
use firesafe_core::ports::{DataStore, Notifier, PortResult};
use uuid::Uuid;

use super::cache::{with_retries, ListCache, RetryPolicy};

pub struct UserStore {
    db: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    users: ListCache<User>,
    roles: ListCache<UserRole>,
    retry: RetryPolicy,
}

impl UserStore {
    pub fn new(db: Arc<dyn DataStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            notifier,
            users: ListCache::new(),
            roles: ListCache::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub async fn list_users(&self) -> PortResult<Arc<Vec<User>>> {
        if let Some(cached) = self.users.get("all").await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || self.db.list_users()).await?;
        let shared = Arc::new(fetched);
        self.users.put("all", Arc::clone(&shared)).await;
        Ok(shared)
    }

    pub async fn list_roles(&self) -> PortResult<Arc<Vec<UserRole>>> {
        if let Some(cached) = self.roles.get("all").await {
            return Ok(cached);
        }
        let fetched = with_retries(&self.retry, || self.db.list_user_roles()).await?;
        let shared = Arc::new(fetched);
        self.roles.put("all", Arc::clone(&shared)).await;
        Ok(shared)
    }

    pub async fn set_role(&self, role: UserRole) -> PortResult<()> {
        match self.db.upsert_user_role(role).await {
            Ok(()) => {
                self.roles.invalidate().await;
                self.users.invalidate().await;
                self.notifier.success("User role updated successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to update user role");
                Err(e)
            }
        }
    }

    pub async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        match self.db.delete_user(user_id).await {
            Ok(()) => {
                self.roles.invalidate().await;
                self.users.invalidate().await;
                self.notifier.success("User deleted successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to delete user");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::testutil::{MockDataStore, RecordingNotifier};
    use firesafe_core::domain::Role;

    fn fixture() -> (Arc<MockDataStore>, Arc<RecordingNotifier>, UserStore) {
        let db = Arc::new(MockDataStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = UserStore::new(db.clone(), notifier.clone());
        (db, notifier, store)
    }

    #[tokio::test]
    async fn set_role_invalidates_and_reflects_on_next_read() {
        let (db, notifier, store) = fixture();
        let user = db
            .create_user_with_email("tech@example.com", "hash")
            .await
            .unwrap();

        assert!(store.list_roles().await.unwrap().is_empty());
        store
            .set_role(UserRole {
                user_id: user.user_id,
                role: Role::Admin,
                phone_number: None,
                notify_renewals: false,
                notify_inspections: false,
            })
            .await
            .unwrap();

        let roles = store.list_roles().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, Role::Admin);
        assert_eq!(
            notifier.successes.lock().unwrap().as_slice(),
            ["User role updated successfully"]
        );
    }

    #[tokio::test]
    async fn delete_user_removes_account_and_role() {
        let (db, _notifier, store) = fixture();
        let user = db
            .create_user_with_email("tech@example.com", "hash")
            .await
            .unwrap();
        store
            .set_role(UserRole {
                user_id: user.user_id,
                role: Role::Tech,
                phone_number: None,
                notify_renewals: false,
                notify_inspections: false,
            })
            .await
            .unwrap();

        store.delete_user(user.user_id).await.unwrap();

        assert!(store.list_users().await.unwrap().is_empty());
        assert!(store.list_roles().await.unwrap().is_empty());
    }
}
