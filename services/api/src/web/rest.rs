//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use firesafe_core::domain::{
    audit_summary, monthly_stats, renewal_status, resolve_role, AuditSummary, Client,
    ClientSummary, CompanyInfo, EquipmentType, InspectionDetail, InspectionStatus, ItemStatus,
    NewClient, NewInspection, NewInspectionItem, RenewalStatus, Role, UserRole,
};
use firesafe_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_clients_handler,
        create_client_handler,
        update_client_handler,
        delete_client_handler,
        list_inspections_handler,
        create_inspection_handler,
        update_inspection_handler,
        delete_inspection_handler,
        get_company_handler,
        update_company_handler,
        upload_logo_handler,
        list_team_handler,
        set_role_handler,
        delete_user_handler,
        upcoming_renewals_handler,
        audit_report_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        crate::web::reports::inspection_report_handler,
        crate::web::reports::renewal_notice_handler,
    ),
    components(
        schemas(
            ClientDto,
            ClientPayload,
            ClientSummaryDto,
            InspectionDto,
            InspectionPayload,
            ItemDto,
            ItemPayload,
            CompanyInfoDto,
            LogoUploadResponse,
            TeamMemberDto,
            RolePayload,
            AuditSummaryDto,
            MonthStatsDto,
            AuditReportDto,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "FireSafe API", description = "Fire safety inspection management endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ClientDto {
    pub id: Uuid,
    pub name: String,
    pub point_of_contact: Option<String>,
    pub inspection_types: Vec<String>,
    pub frequency: Option<String>,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub contract_start: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub contract_amount: Option<f64>,
    /// Derived from the contract end date at response time; never stored.
    pub renewal_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClientDto {
    fn from_domain(client: Client, today: NaiveDate) -> Self {
        let status = client.contract_end.map(|end| {
            match renewal_status(end, today) {
                RenewalStatus::Expired => "expired",
                RenewalStatus::Expiring => "expiring",
                RenewalStatus::Active => "active",
            }
            .to_string()
        });
        Self {
            id: client.id,
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
            renewal_status: status,
            created_at: client.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ClientPayload {
    pub name: String,
    pub point_of_contact: Option<String>,
    #[serde(default)]
    pub inspection_types: Vec<String>,
    pub frequency: Option<String>,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub contract_start: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub contract_amount: Option<f64>,
}

impl ClientPayload {
    fn into_new(self) -> NewClient {
        NewClient {
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
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ClientSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub point_of_contact: Option<String>,
    pub inspection_types: Vec<String>,
    pub frequency: Option<String>,
}

impl From<ClientSummary> for ClientSummaryDto {
    fn from(summary: ClientSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            point_of_contact: summary.point_of_contact,
            inspection_types: summary.inspection_types,
            frequency: summary.frequency,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ItemDto {
    pub id: Uuid,
    pub floor: String,
    pub room: String,
    pub equipment_type: String,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct InspectionDto {
    pub id: Uuid,
    pub client_id: Uuid,
    pub inspection_date: NaiveDate,
    pub location: String,
    pub inspector: String,
    pub status: String,
    pub notes: Option<String>,
    pub cover_page: bool,
    pub created_at: DateTime<Utc>,
    pub client: ClientSummaryDto,
    pub items: Vec<ItemDto>,
    pub attachments: Vec<String>,
}

impl InspectionDto {
    fn from_detail(detail: InspectionDetail, attachments: Vec<String>) -> Self {
        let inspection = detail.inspection;
        Self {
            id: inspection.id,
            client_id: inspection.client_id,
            inspection_date: inspection.inspection_date,
            location: inspection.location,
            inspector: inspection.inspector,
            status: inspection.status.as_str().to_string(),
            notes: inspection.notes,
            cover_page: inspection.cover_page,
            created_at: inspection.created_at,
            client: detail.client.into(),
            items: detail
                .items
                .into_iter()
                .map(|item| ItemDto {
                    id: item.id,
                    floor: item.floor,
                    room: item.room,
                    equipment_type: item.equipment_type.code().to_string(),
                    status: item.status.as_str().to_string(),
                    notes: item.notes,
                })
                .collect(),
            attachments,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ItemPayload {
    pub floor: String,
    pub room: String,
    pub equipment_type: String,
    pub status: String,
    pub notes: Option<String>,
}

impl ItemPayload {
    fn into_new(self) -> Result<NewInspectionItem, (StatusCode, String)> {
        let status = ItemStatus::from_str(&self.status)
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
        Ok(NewInspectionItem {
            floor: self.floor,
            room: self.room,
            equipment_type: EquipmentType::from(self.equipment_type),
            status,
            notes: self.notes,
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct InspectionPayload {
    pub client_id: Uuid,
    pub inspection_date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub inspector: String,
    pub status: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub cover_page: bool,
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

impl InspectionPayload {
    fn into_parts(
        self,
    ) -> Result<(NewInspection, Vec<NewInspectionItem>), (StatusCode, String)> {
        let status = InspectionStatus::from_str(&self.status)
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
        let items = self
            .items
            .into_iter()
            .map(ItemPayload::into_new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((
            NewInspection {
                client_id: self.client_id,
                inspection_date: self.inspection_date,
                location: self.location,
                inspector: self.inspector,
                status,
                notes: self.notes,
                cover_page: self.cover_page,
            },
            items,
        ))
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CompanyInfoDto {
    #[serde(default)]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_path: Option<String>,
    #[serde(default)]
    pub notify_renewals: bool,
    #[serde(default)]
    pub notify_inspections: bool,
    #[serde(default)]
    pub notify_failures: bool,
    #[serde(default)]
    pub notify_users: bool,
}

impl From<CompanyInfo> for CompanyInfoDto {
    fn from(info: CompanyInfo) -> Self {
        Self {
            name: info.name,
            address: info.address,
            phone: info.phone,
            email: info.email,
            website: info.website,
            logo_path: info.logo_path,
            notify_renewals: info.notify_renewals,
            notify_inspections: info.notify_inspections,
            notify_failures: info.notify_failures,
            notify_users: info.notify_users,
        }
    }
}

impl From<CompanyInfoDto> for CompanyInfo {
    fn from(dto: CompanyInfoDto) -> Self {
        Self {
            name: dto.name,
            address: dto.address,
            phone: dto.phone,
            email: dto.email,
            website: dto.website,
            logo_path: dto.logo_path,
            notify_renewals: dto.notify_renewals,
            notify_inspections: dto.notify_inspections,
            notify_failures: dto.notify_failures,
            notify_users: dto.notify_users,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LogoUploadResponse {
    pub logo_path: String,
}

#[derive(Serialize, ToSchema)]
pub struct TeamMemberDto {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Effective role, with the admin allowlist applied.
    pub role: String,
    pub phone_number: Option<String>,
    pub notify_renewals: bool,
    pub notify_inspections: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RolePayload {
    pub role: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub notify_renewals: bool,
    #[serde(default)]
    pub notify_inspections: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AuditSummaryDto {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub no_access: usize,
    pub pass_rate: f64,
}

impl From<AuditSummary> for AuditSummaryDto {
    fn from(summary: AuditSummary) -> Self {
        Self {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            no_access: summary.no_access,
            pass_rate: summary.pass_rate(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MonthStatsDto {
    pub month: u32,
    pub inspections: usize,
    pub completed: usize,
    pub failed: usize,
    pub clients: usize,
    pub inspectors: usize,
    pub items: AuditSummaryDto,
}

#[derive(Serialize, ToSchema)]
pub struct AuditReportDto {
    pub year: i32,
    pub summary: AuditSummaryDto,
    pub monthly: Vec<MonthStatsDto>,
}

#[derive(Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Calendar year to report on; defaults to the current year.
    pub year: Option<i32>,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Logs the underlying failure and maps it to an HTTP error carrying only
/// the public context string.
pub(crate) fn respond_error(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, context.to_string()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, context.to_string()),
    }
}

/// Reads an inspection multipart form: a required `payload` part holding the
/// inspection JSON, plus any number of file parts stored as attachments.
async fn read_inspection_form(
    mut multipart: Multipart,
) -> Result<(InspectionPayload, Vec<(String, Vec<u8>)>), (StatusCode, String)> {
    let mut payload: Option<InspectionPayload> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|f| f.to_string());
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?;

        if name == "payload" {
            let parsed = serde_json::from_slice(&data).map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid inspection payload: {}", e),
                )
            })?;
            payload = Some(parsed);
        } else if let Some(file_name) = file_name {
            uploads.push((file_name, data.to_vec()));
        }
    }

    let payload = payload.ok_or((
        StatusCode::BAD_REQUEST,
        "Multipart form must include a payload part".to_string(),
    ))?;
    Ok((payload, uploads))
}

//=========================================================================================
// Client Handlers
//=========================================================================================

/// List all clients.
#[utoipa::path(
    get,
    path = "/clients",
    responses(
        (status = 200, description = "All clients", body = [ClientDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_clients_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let clients = state
        .clients
        .list()
        .await
        .map_err(|e| respond_error("Failed to fetch clients", e))?;
    let today = Utc::now().date_naive();
    let dtos: Vec<ClientDto> = clients
        .iter()
        .cloned()
        .map(|c| ClientDto::from_domain(c, today))
        .collect();
    Ok(Json(dtos))
}

/// Create a client.
#[utoipa::path(
    post,
    path = "/clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Client created", body = ClientDto),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_client_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let created = state
        .clients
        .create(payload.into_new())
        .await
        .map_err(|e| respond_error("Failed to create client", e))?;
    let today = Utc::now().date_naive();
    Ok((StatusCode::CREATED, Json(ClientDto::from_domain(created, today))))
}

/// Update a client.
#[utoipa::path(
    put,
    path = "/clients/{id}",
    request_body = ClientPayload,
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client updated", body = ClientDto),
        (status = 404, description = "Client not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_client_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let updated = state
        .clients
        .update(id, payload.into_new())
        .await
        .map_err(|e| respond_error("Failed to update client", e))?;
    let today = Utc::now().date_naive();
    Ok(Json(ClientDto::from_domain(updated, today)))
}

/// Delete a client and, via cascade, its inspections.
#[utoipa::path(
    delete,
    path = "/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_client_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .clients
        .delete(id)
        .await
        .map_err(|e| respond_error("Failed to delete client", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Inspection Handlers
//=========================================================================================

/// List all inspections with client summary and checklist items.
#[utoipa::path(
    get,
    path = "/inspections",
    responses(
        (status = 200, description = "All inspections, newest first", body = [InspectionDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_inspections_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details = state
        .inspections
        .list()
        .await
        .map_err(|e| respond_error("Failed to fetch inspections", e))?;
    let mut dtos = Vec::with_capacity(details.len());
    for detail in details.iter().cloned() {
        // A broken attachment listing degrades that inspection to an empty
        // file list rather than failing the whole response.
        let attachments = state
            .inspections
            .attachments(detail.inspection.id)
            .await
            .unwrap_or_else(|e| {
                error!(
                    inspection_id = %detail.inspection.id,
                    "Failed to list inspection attachments: {:?}", e
                );
                Vec::new()
            });
        dtos.push(InspectionDto::from_detail(detail, attachments));
    }
    Ok(Json(dtos))
}

/// Create an inspection with its checklist items and photo attachments.
///
/// Accepts multipart/form-data: a `payload` part with the inspection JSON
/// plus any number of file parts.
#[utoipa::path(
    post,
    path = "/inspections",
    request_body(content_type = "multipart/form-data", description = "Inspection payload and attachments."),
    responses(
        (status = 201, description = "Inspection created"),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_inspection_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (payload, uploads) = read_inspection_form(multipart).await?;
    let (inspection, items) = payload.into_parts()?;
    let created = state
        .inspections
        .create(inspection, items, uploads)
        .await
        .map_err(|e| respond_error("Failed to create inspection", e))?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": created.id }))))
}

/// Update an inspection, replacing its whole item set.
#[utoipa::path(
    put,
    path = "/inspections/{id}",
    request_body(content_type = "multipart/form-data", description = "Inspection payload and new attachments."),
    params(("id" = Uuid, Path, description = "Inspection id")),
    responses(
        (status = 204, description = "Inspection updated"),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Inspection not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_inspection_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (payload, uploads) = read_inspection_form(multipart).await?;
    let (inspection, items) = payload.into_parts()?;
    state
        .inspections
        .update(id, inspection, items, uploads)
        .await
        .map_err(|e| respond_error("Failed to update inspection", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an inspection, its items, and its stored attachments.
#[utoipa::path(
    delete,
    path = "/inspections/{id}",
    params(("id" = Uuid, Path, description = "Inspection id")),
    responses(
        (status = 204, description = "Inspection deleted"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_inspection_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .inspections
        .delete(id)
        .await
        .map_err(|e| respond_error("Failed to delete inspection", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Company Settings Handlers
//=========================================================================================

/// Fetch the company profile. Returns defaults before the first save.
#[utoipa::path(
    get,
    path = "/company",
    responses(
        (status = 200, description = "Company profile", body = CompanyInfoDto),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_company_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let info = state
        .company
        .get()
        .await
        .map_err(|e| respond_error("Failed to fetch company info", e))?
        .unwrap_or_default();
    Ok(Json(CompanyInfoDto::from(info)))
}

/// Create or replace the company profile.
#[utoipa::path(
    put,
    path = "/company",
    request_body = CompanyInfoDto,
    responses(
        (status = 204, description = "Company profile saved"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_company_handler(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<CompanyInfoDto>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .company
        .update(dto.into())
        .await
        .map_err(|e| respond_error("Failed to update company info", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a company logo. The returned path is persisted by saving the
/// profile with it.
#[utoipa::path(
    post,
    path = "/company/logo",
    request_body(content_type = "multipart/form-data", description = "The logo image."),
    responses(
        (status = 201, description = "Logo stored", body = LogoUploadResponse),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_logo_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        ))?;

    let file_name = field.file_name().unwrap_or("logo.png").to_string();
    let bytes = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    let logo_path = state
        .company
        .upload_logo(&file_name, &bytes)
        .await
        .map_err(|e| respond_error("Failed to upload logo", e))?;
    Ok((StatusCode::CREATED, Json(LogoUploadResponse { logo_path })))
}

//=========================================================================================
// User Administration Handlers
//=========================================================================================

/// List accounts joined with their effective roles.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Team members", body = [TeamMemberDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_team_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let users = state
        .users
        .list_users()
        .await
        .map_err(|e| respond_error("Failed to fetch users", e))?;
    let roles = state
        .users
        .list_roles()
        .await
        .map_err(|e| respond_error("Failed to fetch user roles", e))?;

    let members: Vec<TeamMemberDto> = users
        .iter()
        .map(|user| {
            let stored = roles.iter().find(|r| r.user_id == user.user_id);
            let effective = resolve_role(
                user.email.as_deref().unwrap_or_default(),
                stored.map(|r| r.role),
                &state.config.admin_emails,
            );
            TeamMemberDto {
                user_id: user.user_id,
                email: user.email.clone(),
                role: effective.as_str().to_string(),
                phone_number: stored.and_then(|r| r.phone_number.clone()),
                notify_renewals: stored.map(|r| r.notify_renewals).unwrap_or(false),
                notify_inspections: stored.map(|r| r.notify_inspections).unwrap_or(false),
            }
        })
        .collect();
    Ok(Json(members))
}

/// Assign a role and notification preferences to an account.
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    request_body = RolePayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Role saved"),
        (status = 400, description = "Unknown role"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_role_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RolePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role = Role::from_str(&payload.role).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    state
        .users
        .set_role(UserRole {
            user_id: id,
            role,
            phone_number: payload.phone_number,
            notify_renewals: payload.notify_renewals,
            notify_inspections: payload.notify_inspections,
        })
        .await
        .map_err(|e| respond_error("Failed to update user role", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an account and its role row.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .users
        .delete_user(id)
        .await
        .map_err(|e| respond_error("Failed to delete user", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Dashboard Handlers
//=========================================================================================

/// Clients whose contract ends during the next calendar month.
#[utoipa::path(
    get,
    path = "/dashboard/renewals",
    responses(
        (status = 200, description = "Upcoming renewals, soonest first", body = [ClientDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upcoming_renewals_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let clients = state
        .clients
        .upcoming_renewals(today)
        .await
        .map_err(|e| respond_error("Failed to fetch upcoming renewals", e))?;
    let dtos: Vec<ClientDto> = clients
        .iter()
        .cloned()
        .map(|c| ClientDto::from_domain(c, today))
        .collect();
    Ok(Json(dtos))
}

/// Audit statistics for a calendar year: an overall item tally plus a
/// per-month breakdown.
#[utoipa::path(
    get,
    path = "/dashboard/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit report", body = AuditReportDto),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn audit_report_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let details = state
        .inspections
        .list()
        .await
        .map_err(|e| respond_error("Failed to fetch inspections", e))?;

    let year_items: Vec<_> = details
        .iter()
        .filter(|d| d.inspection.inspection_date.year() == year)
        .flat_map(|d| d.items.iter().cloned())
        .collect();

    let monthly = monthly_stats(&details, year)
        .into_iter()
        .map(|(month, stats)| MonthStatsDto {
            month,
            inspections: stats.inspections,
            completed: stats.completed,
            failed: stats.failed,
            clients: stats.clients,
            inspectors: stats.inspectors,
            items: stats.items.into(),
        })
        .collect();

    Ok(Json(AuditReportDto {
        year,
        summary: audit_summary(&year_items).into(),
        monthly,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stores::testutil::{
        sample_client, sample_new_inspection, MemoryFileStore, MockDataStore, RecordingNotifier,
    };
    use std::sync::atomic::Ordering;

    fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".to_string(),
            log_level: tracing::Level::INFO,
            storage_root: std::env::temp_dir(),
            admin_emails: vec![],
            cors_origin: "http://localhost:5173".to_string(),
        }
    }

    #[tokio::test]
    async fn attachment_listing_failure_degrades_to_empty_list() {
        let db = Arc::new(MockDataStore::default());
        let client = sample_client("Acme");
        let client_id = client.id;
        db.clients.lock().unwrap().push(client);
        let files = Arc::new(MemoryFileStore::default());
        let state = Arc::new(AppState::new(
            db.clone(),
            files.clone(),
            Arc::new(RecordingNotifier::default()),
            Arc::new(test_config()),
        ));
        state
            .inspections
            .create(sample_new_inspection(client_id), vec![], vec![])
            .await
            .unwrap();

        files.fail_list.store(true, Ordering::SeqCst);
        let response = list_inspections_handler(State(state)).await;
        assert!(response.is_ok());
    }
}
