//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DataStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every failure is wrapped with a human-readable context string
//! ("Failed to <action>: <cause>") before it propagates. There are no
//! retries, no batching, and no transactions here: multi-step flows such as
//! "create inspection then insert items" are sequenced by the store layer,
//! and a failure partway through leaves the earlier writes in place.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use firesafe_core::domain::{
    AuthSession, Client, ClientSummary, CompanyInfo, EquipmentType, Inspection, InspectionDetail,
    InspectionItem, InspectionStatus, ItemStatus, NewClient, NewInspection, NewInspectionItem,
    Role, User, UserCredentials, UserRole,
};
use firesafe_core::ports::{DataStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

fn wrap(action: &str, cause: impl Display) -> PortError {
    PortError::Unexpected(format!("Failed to {}: {}", action, cause))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DataStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ClientRecord {
    id: Uuid,
    name: String,
    point_of_contact: Option<String>,
    inspection_types: Vec<String>,
    frequency: Option<String>,
    phone: Option<String>,
    street_address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    email: Option<String>,
    notes: Option<String>,
    contract_start: Option<NaiveDate>,
    contract_end: Option<NaiveDate>,
    contract_amount: Option<f64>,
    created_at: DateTime<Utc>,
}

impl ClientRecord {
    fn to_domain(self) -> Client {
        Client {
            id: self.id,
            name: self.name,
            point_of_contact: self.point_of_contact,
            inspection_types: self.inspection_types,
            frequency: self.frequency,
            phone: self.phone,
            street_address: self.street_address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            email: self.email,
            notes: self.notes,
            contract_start: self.contract_start,
            contract_end: self.contract_end,
            contract_amount: self.contract_amount,
            created_at: self.created_at,
        }
    }

    fn to_summary(self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            name: self.name,
            point_of_contact: self.point_of_contact,
            inspection_types: self.inspection_types,
            frequency: self.frequency,
        }
    }
}

#[derive(FromRow)]
struct InspectionRecord {
    id: Uuid,
    client_id: Uuid,
    inspection_date: NaiveDate,
    location: String,
    inspector: String,
    status: String,
    notes: Option<String>,
    cover_page: bool,
    created_at: DateTime<Utc>,
}

impl InspectionRecord {
    fn to_domain(self) -> PortResult<Inspection> {
        let status = InspectionStatus::from_str(&self.status)
            .map_err(|e| PortError::Unexpected(e))?;
        Ok(Inspection {
            id: self.id,
            client_id: self.client_id,
            inspection_date: self.inspection_date,
            location: self.location,
            inspector: self.inspector,
            status,
            notes: self.notes,
            cover_page: self.cover_page,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ItemRecord {
    id: Uuid,
    inspection_id: Uuid,
    floor: String,
    room: String,
    equipment_type: String,
    status: String,
    notes: Option<String>,
}

impl ItemRecord {
    fn to_domain(self) -> PortResult<InspectionItem> {
        let status = ItemStatus::from_str(&self.status).map_err(|e| PortError::Unexpected(e))?;
        Ok(InspectionItem {
            id: self.id,
            inspection_id: self.inspection_id,
            floor: self.floor,
            room: self.room,
            equipment_type: EquipmentType::from(self.equipment_type),
            status,
            notes: self.notes,
        })
    }
}

#[derive(FromRow)]
struct CompanyRecord {
    name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    logo_path: Option<String>,
    notify_renewals: bool,
    notify_inspections: bool,
    notify_failures: bool,
    notify_users: bool,
}

impl CompanyRecord {
    fn to_domain(self) -> CompanyInfo {
        CompanyInfo {
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            website: self.website,
            logo_path: self.logo_path,
            notify_renewals: self.notify_renewals,
            notify_inspections: self.notify_inspections,
            notify_failures: self.notify_failures,
            notify_users: self.notify_users,
        }
    }
}

#[derive(FromRow)]
struct UserRoleRecord {
    user_id: Uuid,
    role: String,
    phone_number: Option<String>,
    notify_renewals: bool,
    notify_inspections: bool,
}

impl UserRoleRecord {
    fn to_domain(self) -> PortResult<UserRole> {
        let role = Role::from_str(&self.role).map_err(|e| PortError::Unexpected(e))?;
        Ok(UserRole {
            user_id: self.user_id,
            role,
            phone_number: self.phone_number,
            notify_renewals: self.notify_renewals,
            notify_inspections: self.notify_inspections,
        })
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

const CLIENT_COLUMNS: &str = "id, name, point_of_contact, inspection_types, frequency, phone, \
     street_address, city, state, zip_code, email, notes, contract_start, contract_end, \
     contract_amount, created_at";

const INSPECTION_COLUMNS: &str =
    "id, client_id, inspection_date, location, inspector, status, notes, cover_page, created_at";

const ITEM_COLUMNS: &str = "id, inspection_id, floor, room, equipment_type, status, notes";

//=========================================================================================
// `DataStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DataStore for DbAdapter {
    async fn list_clients(&self) -> PortResult<Vec<Client>> {
        let records = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {} FROM clients ORDER BY name",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch clients", e))?;

        Ok(records.into_iter().map(ClientRecord::to_domain).collect())
    }

    async fn clients_with_contract_end_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<Client>> {
        let records = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {} FROM clients WHERE contract_end >= $1 AND contract_end <= $2 \
             ORDER BY contract_end",
            CLIENT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch upcoming renewals", e))?;

        Ok(records.into_iter().map(ClientRecord::to_domain).collect())
    }

    async fn create_client(&self, client: NewClient) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "INSERT INTO clients (id, name, point_of_contact, inspection_types, frequency, \
             phone, street_address, city, state, zip_code, email, notes, contract_start, \
             contract_end, contract_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&client.name)
        .bind(&client.point_of_contact)
        .bind(&client.inspection_types)
        .bind(&client.frequency)
        .bind(&client.phone)
        .bind(&client.street_address)
        .bind(&client.city)
        .bind(&client.state)
        .bind(&client.zip_code)
        .bind(&client.email)
        .bind(&client.notes)
        .bind(client.contract_start)
        .bind(client.contract_end)
        .bind(client.contract_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| wrap("create client", e))?;

        Ok(record.to_domain())
    }

    async fn update_client(&self, id: Uuid, client: NewClient) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "UPDATE clients SET name = $2, point_of_contact = $3, inspection_types = $4, \
             frequency = $5, phone = $6, street_address = $7, city = $8, state = $9, \
             zip_code = $10, email = $11, notes = $12, contract_start = $13, \
             contract_end = $14, contract_amount = $15 \
             WHERE id = $1 RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .bind(&client.name)
        .bind(&client.point_of_contact)
        .bind(&client.inspection_types)
        .bind(&client.frequency)
        .bind(&client.phone)
        .bind(&client.street_address)
        .bind(&client.city)
        .bind(&client.state)
        .bind(&client.zip_code)
        .bind(&client.email)
        .bind(&client.notes)
        .bind(client.contract_start)
        .bind(client.contract_end)
        .bind(client.contract_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Client {} not found", id)),
            other => wrap("update client", other),
        })?;

        Ok(record.to_domain())
    }

    async fn delete_client(&self, id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete client", e))?;
        Ok(())
    }

    async fn list_inspections(&self) -> PortResult<Vec<InspectionDetail>> {
        let inspection_records = sqlx::query_as::<_, InspectionRecord>(&format!(
            "SELECT {} FROM inspections ORDER BY inspection_date DESC",
            INSPECTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch inspections", e))?;

        let item_records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {} FROM inspection_items ORDER BY created_at",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch inspection items", e))?;

        let client_records = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {} FROM clients",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch clients", e))?;

        let mut items_by_inspection: HashMap<Uuid, Vec<InspectionItem>> = HashMap::new();
        for record in item_records {
            let item = record.to_domain()?;
            items_by_inspection
                .entry(item.inspection_id)
                .or_default()
                .push(item);
        }

        let clients_by_id: HashMap<Uuid, ClientSummary> = client_records
            .into_iter()
            .map(|r| (r.id, r.to_summary()))
            .collect();

        let mut details = Vec::with_capacity(inspection_records.len());
        for record in inspection_records {
            let inspection = record.to_domain()?;
            let client = clients_by_id.get(&inspection.client_id).cloned().ok_or_else(|| {
                PortError::NotFound(format!("Client {} not found", inspection.client_id))
            })?;
            let items = items_by_inspection
                .remove(&inspection.id)
                .unwrap_or_default();
            details.push(InspectionDetail {
                inspection,
                client,
                items,
            });
        }
        Ok(details)
    }

    async fn create_inspection(&self, inspection: NewInspection) -> PortResult<Inspection> {
        let record = sqlx::query_as::<_, InspectionRecord>(&format!(
            "INSERT INTO inspections (id, client_id, inspection_date, location, inspector, \
             status, notes, cover_page) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            INSPECTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(inspection.client_id)
        .bind(inspection.inspection_date)
        .bind(&inspection.location)
        .bind(&inspection.inspector)
        .bind(inspection.status.as_str())
        .bind(&inspection.notes)
        .bind(inspection.cover_page)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| wrap("create inspection", e))?;

        record.to_domain()
    }

    async fn update_inspection(&self, id: Uuid, inspection: NewInspection) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE inspections SET client_id = $2, inspection_date = $3, location = $4, \
             inspector = $5, status = $6, notes = $7, cover_page = $8 WHERE id = $1",
        )
        .bind(id)
        .bind(inspection.client_id)
        .bind(inspection.inspection_date)
        .bind(&inspection.location)
        .bind(&inspection.inspector)
        .bind(inspection.status.as_str())
        .bind(&inspection.notes)
        .bind(inspection.cover_page)
        .execute(&self.pool)
        .await
        .map_err(|e| wrap("update inspection", e))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Inspection {} not found", id)));
        }
        Ok(())
    }

    async fn delete_inspection(&self, id: Uuid) -> PortResult<()> {
        // Items go with the row via the FK cascade.
        sqlx::query("DELETE FROM inspections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete inspection", e))?;
        Ok(())
    }

    async fn insert_items(
        &self,
        inspection_id: Uuid,
        items: Vec<NewInspectionItem>,
    ) -> PortResult<Vec<InspectionItem>> {
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let record = sqlx::query_as::<_, ItemRecord>(&format!(
                "INSERT INTO inspection_items (id, inspection_id, floor, room, equipment_type, \
                 status, notes) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
                ITEM_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(inspection_id)
            .bind(&item.floor)
            .bind(&item.room)
            .bind(item.equipment_type.code())
            .bind(item.status.as_str())
            .bind(&item.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| wrap("create inspection items", e))?;
            inserted.push(record.to_domain()?);
        }
        Ok(inserted)
    }

    async fn delete_items_for_inspection(&self, inspection_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM inspection_items WHERE inspection_id = $1")
            .bind(inspection_id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete inspection items", e))?;
        Ok(())
    }

    async fn items_for_inspection(&self, inspection_id: Uuid) -> PortResult<Vec<InspectionItem>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {} FROM inspection_items WHERE inspection_id = $1 ORDER BY created_at",
            ITEM_COLUMNS
        ))
        .bind(inspection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch inspection items", e))?;

        records.into_iter().map(ItemRecord::to_domain).collect()
    }

    async fn get_company_info(&self) -> PortResult<Option<CompanyInfo>> {
        let record = sqlx::query_as::<_, CompanyRecord>(
            "SELECT name, address, phone, email, website, logo_path, notify_renewals, \
             notify_inspections, notify_failures, notify_users FROM company_info WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| wrap("fetch company info", e))?;

        Ok(record.map(CompanyRecord::to_domain))
    }

    async fn upsert_company_info(&self, info: CompanyInfo) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO company_info (id, name, address, phone, email, website, logo_path, \
             notify_renewals, notify_inspections, notify_failures, notify_users) \
             VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET name = $1, address = $2, phone = $3, email = $4, \
             website = $5, logo_path = $6, notify_renewals = $7, notify_inspections = $8, \
             notify_failures = $9, notify_users = $10",
        )
        .bind(&info.name)
        .bind(&info.address)
        .bind(&info.phone)
        .bind(&info.email)
        .bind(&info.website)
        .bind(&info.logo_path)
        .bind(info.notify_renewals)
        .bind(info.notify_inspections)
        .bind(info.notify_failures)
        .bind(info.notify_users)
        .execute(&self.pool)
        .await
        .map_err(|e| wrap("update company info", e))?;
        Ok(())
    }

    async fn list_user_roles(&self) -> PortResult<Vec<UserRole>> {
        let records = sqlx::query_as::<_, UserRoleRecord>(
            "SELECT user_id, role, phone_number, notify_renewals, notify_inspections \
             FROM user_roles",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| wrap("fetch user roles", e))?;

        records.into_iter().map(UserRoleRecord::to_domain).collect()
    }

    async fn get_user_role(&self, user_id: Uuid) -> PortResult<Option<UserRole>> {
        let record = sqlx::query_as::<_, UserRoleRecord>(
            "SELECT user_id, role, phone_number, notify_renewals, notify_inspections \
             FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| wrap("fetch user role", e))?;

        record.map(UserRoleRecord::to_domain).transpose()
    }

    async fn upsert_user_role(&self, role: UserRole) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role, phone_number, notify_renewals, \
             notify_inspections) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET role = $2, phone_number = $3, \
             notify_renewals = $4, notify_inspections = $5",
        )
        .bind(role.user_id)
        .bind(role.role.as_str())
        .bind(&role.phone_number)
        .bind(role.notify_renewals)
        .bind(role.notify_inspections)
        .execute(&self.pool)
        .await
        .map_err(|e| wrap("update user role", e))?;
        Ok(())
    }

    async fn delete_user_role(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete user role", e))?;
        Ok(())
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| wrap("create user", e))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User {} not found", email))
            }
            other => wrap("fetch user", other),
        })?;

        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User {} not found", user_id))
            }
            other => wrap("fetch user", other),
        })?;

        Ok(record.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records =
            sqlx::query_as::<_, UserRecord>("SELECT user_id, email FROM users ORDER BY email")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| wrap("fetch users", e))?;

        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete user", e))?;
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("create auth session", e))?;
        Ok(())
    }

    async fn get_auth_session(&self, session_id: &str) -> PortResult<AuthSession> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions \
             WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            other => wrap("validate auth session", other),
        })?;

        Ok(AuthSession {
            id: record.id,
            user_id: record.user_id,
            expires_at: record.expires_at,
        })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| wrap("delete auth session", e))?;
        Ok(())
    }
}
