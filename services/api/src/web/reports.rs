//! services/api/src/web/reports.rs
//!
//! PDF download endpoints. Content is built in `firesafe_core::report` and
//! rendered by `crate::pdf`; any failure along the way surfaces as a single
//! generic error so report internals never leak to the caller.

use crate::pdf::{render_inspection_report, render_renewal_notice};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use firesafe_core::domain::{renewal_window, CompanyInfo};
use firesafe_core::report::{build_inspection_report, build_renewal_notice};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

const GENERIC_PDF_ERROR: &str = "Failed to generate PDF";

fn pdf_response(filename: &str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

/// Loads the company profile and its logo bytes. A missing or unreadable
/// logo is tolerated; the report renders without it.
async fn company_branding(state: &AppState) -> Result<(Option<CompanyInfo>, Option<Vec<u8>>), ()> {
    let company = state.company.get().await.map_err(|e| {
        error!("Failed to load company info for report: {:?}", e);
    })?;
    let logo = match company.as_ref().and_then(|c| c.logo_path.as_deref()) {
        Some(path) => state.company.logo_bytes(path).await.ok(),
        None => None,
    };
    Ok((company, logo))
}

/// Download the PDF report for one inspection.
#[utoipa::path(
    get,
    path = "/inspections/{id}/report",
    params(("id" = Uuid, Path, description = "Inspection id")),
    responses(
        (status = 200, description = "The inspection report PDF", content_type = "application/pdf"),
        (status = 404, description = "Inspection not found"),
        (status = 500, description = "PDF generation failed")
    )
)]
pub async fn inspection_report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details = state.inspections.list().await.map_err(|e| {
        error!("Failed to load inspection for report: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string())
    })?;
    let detail = details
        .iter()
        .find(|d| d.inspection.id == id)
        .ok_or((StatusCode::NOT_FOUND, "Inspection not found".to_string()))?;

    let (company, logo) = company_branding(&state)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string()))?;

    let report = build_inspection_report(
        &detail.inspection,
        &detail.items,
        &detail.client.name,
        company.as_ref(),
    );
    let bytes = render_inspection_report(&report, logo.as_deref(), Utc::now()).map_err(|e| {
        error!("{}: {:?}", GENERIC_PDF_ERROR, e);
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string())
    })?;

    Ok(pdf_response(&report.filename, bytes))
}

/// Download the contract renewal notice PDF for one client.
#[utoipa::path(
    get,
    path = "/clients/{id}/renewal-notice",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "The renewal notice PDF", content_type = "application/pdf"),
        (status = 404, description = "Client not found"),
        (status = 500, description = "PDF generation failed")
    )
)]
pub async fn renewal_notice_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let clients = state.clients.list().await.map_err(|e| {
        error!("Failed to load client for renewal notice: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string())
    })?;
    let client = clients
        .iter()
        .find(|c| c.id == id)
        .ok_or((StatusCode::NOT_FOUND, "Client not found".to_string()))?;

    let (company, logo) = company_branding(&state)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string()))?;

    let today = Utc::now().date_naive();
    let month = client.contract_end.unwrap_or_else(|| renewal_window(today).0);
    let notice = build_renewal_notice(client, month, company.as_ref());
    let bytes = render_renewal_notice(&notice, logo.as_deref(), Utc::now()).map_err(|e| {
        error!("{}: {:?}", GENERIC_PDF_ERROR, e);
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PDF_ERROR.to_string())
    })?;

    Ok(pdf_response(&notice.filename, bytes))
}
