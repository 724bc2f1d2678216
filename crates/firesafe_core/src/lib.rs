pub mod domain;
pub mod ports;
pub mod report;

pub use domain::{
    audit_summary, monthly_stats, renewal_status, renewal_window, resolve_role, AuditSummary,
    AuthSession, Client, ClientSummary, CompanyInfo, EquipmentType, Inspection, InspectionDetail,
    InspectionItem, InspectionStatus, ItemStatus, MonthStats, NewClient, NewInspection,
    NewInspectionItem, RenewalStatus, Role, User, UserCredentials, UserRole,
};
pub use ports::{DataStore, FileStore, Notifier, PortError, PortResult};
pub use report::{build_inspection_report, build_renewal_notice, InspectionReport, RenewalNotice};
