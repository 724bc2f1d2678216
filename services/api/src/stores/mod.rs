//! services/api/src/stores/mod.rs
//!
//! The cache-and-mutate layer. Each entity gets a store that serves reads
//! from a keyed cache (with retries on fetch) and performs mutations as
//! write, invalidate, notify. Mutations never retry and never patch the
//! cache optimistically.

pub mod cache;
pub mod clients;
pub mod company;
pub mod inspections;
pub mod users;

pub use clients::ClientStore;
pub use company::CompanyStore;
pub use inspections::InspectionStore;
pub use users::UserStore;

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use firesafe_core::domain::{
        AuthSession, Client, ClientSummary, CompanyInfo, EquipmentType, Inspection,
        InspectionDetail, InspectionItem, InspectionStatus, ItemStatus, NewClient, NewInspection,
        NewInspectionItem, User, UserCredentials, UserRole,
    };
    use firesafe_core::ports::{DataStore, FileStore, Notifier, PortError, PortResult};
    use uuid::Uuid;

    /// In-memory `DataStore` with per-query failure injection and fetch
    /// counters, so tests can observe caching and retry behavior.
    #[derive(Default)]
    pub struct MockDataStore {
        pub clients: Mutex<Vec<Client>>,
        pub inspections: Mutex<Vec<Inspection>>,
        pub items: Mutex<Vec<InspectionItem>>,
        pub company: Mutex<Option<CompanyInfo>>,
        pub roles: Mutex<Vec<UserRole>>,
        pub users: Mutex<Vec<User>>,
        pub sessions: Mutex<Vec<AuthSession>>,

        pub list_client_calls: AtomicUsize,
        pub list_inspection_calls: AtomicUsize,
        /// Number of list queries that fail before one succeeds.
        pub transient_list_failures: AtomicUsize,
        pub fail_insert_items: AtomicBool,
        pub fail_mutations: AtomicBool,
    }

    impl MockDataStore {
        fn check_transient(&self) -> PortResult<()> {
            let remaining = self.transient_list_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.transient_list_failures
                    .store(remaining - 1, Ordering::SeqCst);
                return Err(PortError::Unexpected("connection reset".into()));
            }
            Ok(())
        }

        fn check_mutation(&self, action: &str) -> PortResult<()> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected(format!(
                    "Failed to {}: connection reset",
                    action
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DataStore for MockDataStore {
        async fn list_clients(&self) -> PortResult<Vec<Client>> {
            self.list_client_calls.fetch_add(1, Ordering::SeqCst);
            self.check_transient()?;
            Ok(self.clients.lock().unwrap().clone())
        }

        async fn clients_with_contract_end_between(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> PortResult<Vec<Client>> {
            self.check_transient()?;
            let mut matching: Vec<Client> = self
                .clients
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.contract_end.is_some_and(|d| d >= start && d <= end))
                .cloned()
                .collect();
            matching.sort_by_key(|c| c.contract_end);
            Ok(matching)
        }

        async fn create_client(&self, client: NewClient) -> PortResult<Client> {
            self.check_mutation("create client")?;
            let created = Client {
                id: Uuid::new_v4(),
                name: client.name,
                point_of_contact: client.point_of_contact,
                inspection_types: client.inspection_types,
                frequency: client.frequency,
                phone: client.phone,
                street_address: client.street_address,
                city: client.city,
                state: client.state,
                zip_code: client.zip_code,
                email: client.email,
                notes: client.notes,
                contract_start: client.contract_start,
                contract_end: client.contract_end,
                contract_amount: client.contract_amount,
                created_at: Utc::now(),
            };
            self.clients.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_client(&self, id: Uuid, client: NewClient) -> PortResult<Client> {
            self.check_mutation("update client")?;
            let mut clients = self.clients.lock().unwrap();
            let existing = clients
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| PortError::NotFound(format!("Client {} not found", id)))?;
            existing.name = client.name;
            existing.contract_end = client.contract_end;
            Ok(existing.clone())
        }

        async fn delete_client(&self, id: Uuid) -> PortResult<()> {
            self.check_mutation("delete client")?;
            self.clients.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }

        async fn list_inspections(&self) -> PortResult<Vec<InspectionDetail>> {
            self.list_inspection_calls.fetch_add(1, Ordering::SeqCst);
            self.check_transient()?;
            let clients = self.clients.lock().unwrap();
            let items = self.items.lock().unwrap();
            self.inspections
                .lock()
                .unwrap()
                .iter()
                .map(|inspection| {
                    let client = clients
                        .iter()
                        .find(|c| c.id == inspection.client_id)
                        .map(|c| ClientSummary {
                            id: c.id,
                            name: c.name.clone(),
                            point_of_contact: c.point_of_contact.clone(),
                            inspection_types: c.inspection_types.clone(),
                            frequency: c.frequency.clone(),
                        })
                        .ok_or_else(|| {
                            PortError::NotFound(format!(
                                "Client {} not found",
                                inspection.client_id
                            ))
                        })?;
                    Ok(InspectionDetail {
                        inspection: inspection.clone(),
                        client,
                        items: items
                            .iter()
                            .filter(|i| i.inspection_id == inspection.id)
                            .cloned()
                            .collect(),
                    })
                })
                .collect()
        }

        async fn create_inspection(&self, inspection: NewInspection) -> PortResult<Inspection> {
            self.check_mutation("create inspection")?;
            let created = Inspection {
                id: Uuid::new_v4(),
                client_id: inspection.client_id,
                inspection_date: inspection.inspection_date,
                location: inspection.location,
                inspector: inspection.inspector,
                status: inspection.status,
                notes: inspection.notes,
                cover_page: inspection.cover_page,
                created_at: Utc::now(),
            };
            self.inspections.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_inspection(&self, id: Uuid, inspection: NewInspection) -> PortResult<()> {
            self.check_mutation("update inspection")?;
            let mut inspections = self.inspections.lock().unwrap();
            let existing = inspections
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| PortError::NotFound(format!("Inspection {} not found", id)))?;
            existing.inspection_date = inspection.inspection_date;
            existing.location = inspection.location;
            existing.inspector = inspection.inspector;
            existing.status = inspection.status;
            existing.notes = inspection.notes;
            existing.cover_page = inspection.cover_page;
            Ok(())
        }

        async fn delete_inspection(&self, id: Uuid) -> PortResult<()> {
            self.check_mutation("delete inspection")?;
            self.inspections.lock().unwrap().retain(|i| i.id != id);
            self.items.lock().unwrap().retain(|i| i.inspection_id != id);
            Ok(())
        }

        async fn insert_items(
            &self,
            inspection_id: Uuid,
            items: Vec<NewInspectionItem>,
        ) -> PortResult<Vec<InspectionItem>> {
            if self.fail_insert_items.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected(
                    "Failed to create inspection items: connection reset".into(),
                ));
            }
            let inserted: Vec<InspectionItem> = items
                .into_iter()
                .map(|item| InspectionItem {
                    id: Uuid::new_v4(),
                    inspection_id,
                    floor: item.floor,
                    room: item.room,
                    equipment_type: item.equipment_type,
                    status: item.status,
                    notes: item.notes,
                })
                .collect();
            self.items.lock().unwrap().extend(inserted.clone());
            Ok(inserted)
        }

        async fn delete_items_for_inspection(&self, inspection_id: Uuid) -> PortResult<()> {
            self.items
                .lock()
                .unwrap()
                .retain(|i| i.inspection_id != inspection_id);
            Ok(())
        }

        async fn items_for_inspection(
            &self,
            inspection_id: Uuid,
        ) -> PortResult<Vec<InspectionItem>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.inspection_id == inspection_id)
                .cloned()
                .collect())
        }

        async fn get_company_info(&self) -> PortResult<Option<CompanyInfo>> {
            self.check_transient()?;
            Ok(self.company.lock().unwrap().clone())
        }

        async fn upsert_company_info(&self, info: CompanyInfo) -> PortResult<()> {
            self.check_mutation("update company info")?;
            *self.company.lock().unwrap() = Some(info);
            Ok(())
        }

        async fn list_user_roles(&self) -> PortResult<Vec<UserRole>> {
            self.check_transient()?;
            Ok(self.roles.lock().unwrap().clone())
        }

        async fn get_user_role(&self, user_id: Uuid) -> PortResult<Option<UserRole>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id)
                .cloned())
        }

        async fn upsert_user_role(&self, role: UserRole) -> PortResult<()> {
            self.check_mutation("update user role")?;
            let mut roles = self.roles.lock().unwrap();
            roles.retain(|r| r.user_id != role.user_id);
            roles.push(role);
            Ok(())
        }

        async fn delete_user_role(&self, user_id: Uuid) -> PortResult<()> {
            self.roles.lock().unwrap().retain(|r| r.user_id != user_id);
            Ok(())
        }

        async fn create_user_with_email(
            &self,
            email: &str,
            _hashed_password: &str,
        ) -> PortResult<User> {
            self.check_mutation("create user")?;
            let user = User {
                user_id: Uuid::new_v4(),
                email: Some(email.to_string()),
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
            Err(PortError::NotFound(format!("User {} not found", email)))
        }

        async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.user_id == user_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
        }

        async fn list_users(&self) -> PortResult<Vec<User>> {
            self.check_transient()?;
            Ok(self.users.lock().unwrap().clone())
        }

        async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
            self.check_mutation("delete user")?;
            self.users.lock().unwrap().retain(|u| u.user_id != user_id);
            self.roles.lock().unwrap().retain(|r| r.user_id != user_id);
            Ok(())
        }

        async fn create_auth_session(
            &self,
            session_id: &str,
            user_id: Uuid,
            expires_at: DateTime<Utc>,
        ) -> PortResult<()> {
            self.sessions.lock().unwrap().push(AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            });
            Ok(())
        }

        async fn get_auth_session(&self, session_id: &str) -> PortResult<AuthSession> {
            self.sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == session_id && s.expires_at > Utc::now())
                .cloned()
                .ok_or(PortError::Unauthorized)
        }

        async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
            self.sessions.lock().unwrap().retain(|s| s.id != session_id);
            Ok(())
        }
    }

    /// Records every notification for assertion.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub successes: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.successes.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    /// In-memory blob store.
    #[derive(Default)]
    pub struct MemoryFileStore {
        pub blobs: Mutex<HashMap<String, Vec<u8>>>,
        pub fail_list: AtomicBool,
    }

    #[async_trait]
    impl FileStore for MemoryFileStore {
        async fn upload(&self, path: &str, bytes: &[u8]) -> PortResult<String> {
            self.blobs
                .lock()
                .unwrap()
                .insert(path.to_string(), bytes.to_vec());
            Ok(path.to_string())
        }

        async fn list(&self, prefix: &str) -> PortResult<Vec<String>> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected(
                    "Failed to list files: storage offline".to_string(),
                ));
            }
            let mut paths: Vec<String> = self
                .blobs
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            paths.sort();
            Ok(paths)
        }

        async fn remove(&self, paths: &[String]) -> PortResult<()> {
            let mut blobs = self.blobs.lock().unwrap();
            for path in paths {
                blobs.remove(path);
            }
            Ok(())
        }

        async fn download(&self, path: &str) -> PortResult<Vec<u8>> {
            self.blobs
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("File {} not found", path)))
        }
    }

    pub fn sample_client(name: &str) -> Client {
        Client {
            id: Uuid::new_v4(),
            name: name.to_string(),
            point_of_contact: Some("Pat".to_string()),
            inspection_types: vec!["Fire Extinguisher".to_string()],
            frequency: Some("Annual".to_string()),
            phone: None,
            street_address: Some("1 Main St".to_string()),
            city: Some("Austin".to_string()),
            state: Some("TX".to_string()),
            zip_code: Some("78701".to_string()),
            email: None,
            notes: None,
            contract_start: None,
            contract_end: None,
            contract_amount: None,
            created_at: Utc::now(),
        }
    }

    pub fn sample_new_client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            point_of_contact: None,
            inspection_types: vec![],
            frequency: None,
            phone: None,
            street_address: None,
            city: None,
            state: None,
            zip_code: None,
            email: None,
            notes: None,
            contract_start: None,
            contract_end: None,
            contract_amount: None,
        }
    }

    pub fn sample_new_inspection(client_id: Uuid) -> NewInspection {
        NewInspection {
            client_id,
            inspection_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            location: "Warehouse".to_string(),
            inspector: "Jordan".to_string(),
            status: InspectionStatus::Completed,
            notes: None,
            cover_page: false,
        }
    }

    pub fn sample_new_item(room: &str, status: ItemStatus) -> NewInspectionItem {
        NewInspectionItem {
            floor: "1".to_string(),
            room: room.to_string(),
            equipment_type: EquipmentType::from("5ABC".to_string()),
            status,
            notes: None,
        }
    }
}
