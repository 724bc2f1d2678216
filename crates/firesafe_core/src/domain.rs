//! crates/firesafe_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format
//! beyond plain serde derives; all classification logic here is pure.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days before a contract's end date at which it counts as expiring.
pub const RENEWAL_WARNING_DAYS: i64 = 30;

//=========================================================================================
// Clients and Contracts
//=========================================================================================

/// A client company with an inspection contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
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
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Joins the address fields into a single comma-separated line,
    /// skipping whatever is missing.
    pub fn address_line(&self) -> String {
        [
            self.street_address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip_code.as_deref(),
        ]
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Client fields supplied by the caller; the store assigns id and created_at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
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

/// Derived classification of a contract's end date relative to today.
/// Never stored; recomputed wherever it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenewalStatus {
    Expired,
    Expiring,
    Active,
}

/// Classifies a contract end date. A contract ending exactly
/// [`RENEWAL_WARNING_DAYS`] from today still counts as expiring.
pub fn renewal_status(contract_end: NaiveDate, today: NaiveDate) -> RenewalStatus {
    if contract_end < today {
        RenewalStatus::Expired
    } else if contract_end <= today + Duration::days(RENEWAL_WARNING_DAYS) {
        RenewalStatus::Expiring
    } else {
        RenewalStatus::Active
    }
}

/// The first and last day of the month after `today`, which is the window
/// the dashboard uses for upcoming contract renewals.
pub fn renewal_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|d| d - Duration::days(1))
        .unwrap_or(start);
    (start, end)
}

//=========================================================================================
// Inspections
//=========================================================================================

/// Lifecycle state of an inspection visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    Scheduled,
    Completed,
    Failed,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Scheduled => "scheduled",
            InspectionStatus::Completed => "completed",
            InspectionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(InspectionStatus::Scheduled),
            "completed" => Ok(InspectionStatus::Completed),
            "failed" => Ok(InspectionStatus::Failed),
            other => Err(format!("unknown inspection status '{}'", other)),
        }
    }
}

/// Outcome recorded for a single inspected piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "fail")]
    Fail,
    #[serde(rename = "no-access")]
    NoAccess,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pass => "pass",
            ItemStatus::Fail => "fail",
            ItemStatus::NoAccess => "no-access",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(ItemStatus::Pass),
            "fail" => Ok(ItemStatus::Fail),
            "no-access" => Ok(ItemStatus::NoAccess),
            other => Err(format!("unknown item status '{}'", other)),
        }
    }
}

/// The catalog of equipment the technicians service. Codes outside the
/// catalog are carried through verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EquipmentType {
    TwoAndHalfAbc,
    FiveAbc,
    TenAbc,
    TwentyAbc,
    TypeK,
    Water,
    ExitLight,
    Combo,
    Other(String),
}

impl EquipmentType {
    pub fn code(&self) -> &str {
        match self {
            EquipmentType::TwoAndHalfAbc => "2.5ABC",
            EquipmentType::FiveAbc => "5ABC",
            EquipmentType::TenAbc => "10ABC",
            EquipmentType::TwentyAbc => "20ABC",
            EquipmentType::TypeK => "K",
            EquipmentType::Water => "Water",
            EquipmentType::ExitLight => "EXIT",
            EquipmentType::Combo => "COMBO",
            EquipmentType::Other(code) => code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EquipmentType::TwoAndHalfAbc => "2.5 ABC Fire Extinguisher",
            EquipmentType::FiveAbc => "5 ABC Fire Extinguisher",
            EquipmentType::TenAbc => "10 ABC Fire Extinguisher",
            EquipmentType::TwentyAbc => "20 ABC Fire Extinguisher",
            EquipmentType::TypeK => "Type K Fire Extinguisher",
            EquipmentType::Water => "Water Fire Extinguisher",
            EquipmentType::ExitLight => "Exit Light",
            EquipmentType::Combo => "Exit/Emergency Combo",
            EquipmentType::Other(code) => code,
        }
    }
}

impl From<String> for EquipmentType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "2.5ABC" => EquipmentType::TwoAndHalfAbc,
            "5ABC" => EquipmentType::FiveAbc,
            "10ABC" => EquipmentType::TenAbc,
            "20ABC" => EquipmentType::TwentyAbc,
            "K" => EquipmentType::TypeK,
            "Water" => EquipmentType::Water,
            "EXIT" => EquipmentType::ExitLight,
            "COMBO" => EquipmentType::Combo,
            _ => EquipmentType::Other(code),
        }
    }
}

impl From<EquipmentType> for String {
    fn from(equipment: EquipmentType) -> Self {
        equipment.code().to_string()
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A scheduled or completed inspection visit at a client site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Uuid,
    pub client_id: Uuid,
    pub inspection_date: NaiveDate,
    pub location: String,
    pub inspector: String,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    pub cover_page: bool,
    pub created_at: DateTime<Utc>,
}

/// Inspection fields supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInspection {
    pub client_id: Uuid,
    pub inspection_date: NaiveDate,
    pub location: String,
    pub inspector: String,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    #[serde(default)]
    pub cover_page: bool,
}

/// One inspected piece of equipment. Has no identity outside its parent
/// inspection; item updates replace the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: Uuid,
    pub inspection_id: Uuid,
    pub floor: String,
    pub room: String,
    pub equipment_type: EquipmentType,
    pub status: ItemStatus,
    pub notes: Option<String>,
}

/// Item fields supplied by the caller; the store links them to their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInspectionItem {
    pub floor: String,
    pub room: String,
    pub equipment_type: EquipmentType,
    pub status: ItemStatus,
    pub notes: Option<String>,
}

/// The client fields joined onto an inspection listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
    pub point_of_contact: Option<String>,
    pub inspection_types: Vec<String>,
    pub frequency: Option<String>,
}

/// An inspection joined with its client summary and full item set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionDetail {
    pub inspection: Inspection,
    pub client: ClientSummary,
    pub items: Vec<InspectionItem>,
}

//=========================================================================================
// Audit Statistics
//=========================================================================================

/// Pass/fail tallies over a set of inspection items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub no_access: usize,
}

impl AuditSummary {
    pub fn add(&mut self, status: ItemStatus) {
        self.total += 1;
        match status {
            ItemStatus::Pass => self.passed += 1,
            ItemStatus::Fail => self.failed += 1,
            ItemStatus::NoAccess => self.no_access += 1,
        }
    }

    /// Percentage of items that passed, rounded to one decimal place.
    /// An empty item set reports 0.0.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let rate = self.passed as f64 / self.total as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }
}

/// Tallies item outcomes for a single inspection.
pub fn audit_summary(items: &[InspectionItem]) -> AuditSummary {
    let mut summary = AuditSummary::default();
    for item in items {
        summary.add(item.status);
    }
    summary
}

/// Per-month rollup used on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthStats {
    pub inspections: usize,
    pub completed: usize,
    pub failed: usize,
    pub clients: usize,
    pub inspectors: usize,
    pub items: AuditSummary,
}

/// Groups inspections from `year` by calendar month, tallying inspection
/// outcomes, distinct clients and inspectors, and item results.
pub fn monthly_stats(details: &[InspectionDetail], year: i32) -> BTreeMap<u32, MonthStats> {
    let mut months: BTreeMap<u32, MonthStats> = BTreeMap::new();
    let mut clients: BTreeMap<u32, HashSet<Uuid>> = BTreeMap::new();
    let mut inspectors: BTreeMap<u32, HashSet<String>> = BTreeMap::new();

    for detail in details {
        let date = detail.inspection.inspection_date;
        if date.year() != year {
            continue;
        }
        let month = date.month();
        let stats = months.entry(month).or_default();
        stats.inspections += 1;
        match detail.inspection.status {
            InspectionStatus::Completed => stats.completed += 1,
            InspectionStatus::Failed => stats.failed += 1,
            InspectionStatus::Scheduled => {}
        }
        for item in &detail.items {
            stats.items.add(item.status);
        }
        clients.entry(month).or_default().insert(detail.client.id);
        inspectors
            .entry(month)
            .or_default()
            .insert(detail.inspection.inspector.clone());
    }

    for (month, stats) in months.iter_mut() {
        stats.clients = clients.get(month).map_or(0, HashSet::len);
        stats.inspectors = inspectors.get(month).map_or(0, HashSet::len);
    }
    months
}

//=========================================================================================
// Company Settings
//=========================================================================================

/// Singleton company profile used for report branding and notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_path: Option<String>,
    pub notify_renewals: bool,
    pub notify_inspections: bool,
    pub notify_failures: bool,
    pub notify_users: bool,
}

//=========================================================================================
// Users, Roles, and Route Capabilities
//=========================================================================================

/// Access role assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Tech,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Tech => "tech",
        }
    }

    /// Path prefixes this role may navigate to. Admins see everything;
    /// technicians are restricted to the inspections area.
    pub fn permitted_prefixes(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &["/"],
            Role::Tech => &["/inspections"],
        }
    }

    pub fn permits(&self, path: &str) -> bool {
        self.permitted_prefixes()
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// Where a request outside the permitted set is sent instead.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/dashboard",
            Role::Tech => "/inspections",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "tech" => Ok(Role::Tech),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Resolves the effective role for a session. Allowlisted emails are
/// always admins regardless of the stored role; everyone else gets their
/// stored role, defaulting to technician.
pub fn resolve_role(email: &str, stored: Option<Role>, allowlist: &[String]) -> Role {
    if allowlist.iter().any(|a| a.eq_ignore_ascii_case(email)) {
        return Role::Admin;
    }
    stored.unwrap_or(Role::Tech)
}

/// Role and notification preferences stored for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: Role,
    pub phone_number: Option<String>,
    pub notify_renewals: bool,
    pub notify_inspections: bool,
}

/// Represents a user account, as exposed to the rest of the app.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Only used internally for login/signup. Contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// Represents a browser login session (auth cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Tests
//=========================================================================================
