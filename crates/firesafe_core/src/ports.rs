//! crates/firesafe_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or blob stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthSession, Client, CompanyInfo, Inspection, InspectionDetail, InspectionItem, NewClient,
    NewInspection, NewInspectionItem, User, UserCredentials, UserRole,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote data gateway: one method per (entity, operation) pair.
/// Implementations wrap underlying failures with a human-readable context
/// string and never retry, batch, or open transactions; multi-step flows
/// are sequenced by the caller.
#[async_trait]
pub trait DataStore: Send + Sync {
    // --- Clients ---
    async fn list_clients(&self) -> PortResult<Vec<Client>>;

    /// Clients whose contract ends inside `[start, end]`, ordered by end date.
    async fn clients_with_contract_end_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<Client>>;

    async fn create_client(&self, client: NewClient) -> PortResult<Client>;

    async fn update_client(&self, id: Uuid, client: NewClient) -> PortResult<Client>;

    /// Deletes the client row only. Inspections belonging to the client are
    /// cleaned up by the store-level cascade, not by this layer.
    async fn delete_client(&self, id: Uuid) -> PortResult<()>;

    // --- Inspections ---
    /// All inspections joined with their client summary and item set,
    /// ordered by inspection date descending.
    async fn list_inspections(&self) -> PortResult<Vec<InspectionDetail>>;

    async fn create_inspection(&self, inspection: NewInspection) -> PortResult<Inspection>;

    async fn update_inspection(&self, id: Uuid, inspection: NewInspection) -> PortResult<()>;

    async fn delete_inspection(&self, id: Uuid) -> PortResult<()>;

    // --- Inspection Items ---
    async fn insert_items(
        &self,
        inspection_id: Uuid,
        items: Vec<NewInspectionItem>,
    ) -> PortResult<Vec<InspectionItem>>;

    async fn delete_items_for_inspection(&self, inspection_id: Uuid) -> PortResult<()>;

    async fn items_for_inspection(&self, inspection_id: Uuid) -> PortResult<Vec<InspectionItem>>;

    // --- Company Settings ---
    async fn get_company_info(&self) -> PortResult<Option<CompanyInfo>>;

    async fn upsert_company_info(&self, info: CompanyInfo) -> PortResult<()>;

    // --- Roles ---
    async fn list_user_roles(&self) -> PortResult<Vec<UserRole>>;

    async fn get_user_role(&self, user_id: Uuid) -> PortResult<Option<UserRole>>;

    async fn upsert_user_role(&self, role: UserRole) -> PortResult<()>;

    async fn delete_user_role(&self, user_id: Uuid) -> PortResult<()>;

    // --- Accounts ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn get_auth_session(&self, session_id: &str) -> PortResult<AuthSession>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Blob storage for files attached to inspections and company branding.
/// Paths are namespaced by a per-entity prefix (e.g. the inspection id).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `bytes` at `path`, overwriting any existing blob, and returns
    /// the stored path.
    async fn upload(&self, path: &str, bytes: &[u8]) -> PortResult<String>;

    /// All stored paths under `prefix`.
    async fn list(&self, prefix: &str) -> PortResult<Vec<String>>;

    async fn remove(&self, paths: &[String]) -> PortResult<()>;

    async fn download(&self, path: &str) -> PortResult<Vec<u8>>;
}

/// User-facing transient notifications emitted by the cache-and-mutate
/// layer after each mutation, on both success and failure.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}
