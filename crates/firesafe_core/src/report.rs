//! crates/firesafe_core/src/report.rs
//!
//! Deterministic report-content builder. Given already-fetched records it
//! produces the full content of an inspection report or a contract renewal
//! notice: cover page, header block, table rows, and the output filename.
//! Rendering to PDF bytes happens in the service's renderer; everything in
//! this module is a pure function of its inputs, so repeated invocations
//! over the same records yield identical content.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Client, CompanyInfo, Inspection, InspectionItem};

/// Brand accent used for report titles and the table header row.
pub const BRAND_RED: (u8, u8, u8) = (220, 38, 38);

/// Fill for every other table body row.
pub const ALT_ROW_FILL: (u8, u8, u8) = (245, 245, 245);

/// Column width (in characters) notes are wrapped to on the cover page.
pub const NOTES_WRAP_COLUMNS: usize = 60;

/// Shown when the company profile has no name configured.
const FALLBACK_COMPANY_NAME: &str = "Fire Protection Services";

//=========================================================================================
// Content Model
//=========================================================================================

/// Optional first page: branding plus summary metadata before the detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverPage {
    pub title: String,
    pub subtitle: String,
    pub details: Vec<(String, String)>,
    pub notes: Vec<String>,
}

/// Two-column header block: logo on the left, metadata lines on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub lines: Vec<String>,
}

/// One table row per inspected item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub location: String,
    pub equipment: String,
    pub status: String,
    pub notes: String,
}

/// Everything the renderer needs to lay out an inspection report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub filename: String,
    pub cover: Option<CoverPage>,
    pub header: HeaderBlock,
    pub columns: [String; 4],
    pub rows: Vec<TableRow>,
}

/// Everything the renderer needs to lay out a renewal notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalNotice {
    pub filename: String,
    pub title: String,
    pub heading: String,
    pub month_label: String,
    pub details: Vec<(String, String)>,
    pub notes: Vec<String>,
}

//=========================================================================================
// Builders
//=========================================================================================

/// Builds the full content of an inspection report. The cover page is
/// included only when the inspection asks for one.
pub fn build_inspection_report(
    inspection: &Inspection,
    items: &[InspectionItem],
    client_name: &str,
    company: Option<&CompanyInfo>,
) -> InspectionReport {
    let company_name = company_title(company);

    let cover = inspection.cover_page.then(|| CoverPage {
        title: company_name.clone(),
        subtitle: "Professional Fire Safety Management".to_string(),
        details: vec![
            ("Client:".to_string(), client_name.to_string()),
            (
                "Date:".to_string(),
                format_long_date(inspection.inspection_date),
            ),
            ("Location:".to_string(), inspection.location.clone()),
            ("Inspector:".to_string(), inspection.inspector.clone()),
            (
                "Status:".to_string(),
                capitalize(inspection.status.as_str()),
            ),
        ],
        notes: inspection
            .notes
            .as_deref()
            .map(|n| wrap_text(n, NOTES_WRAP_COLUMNS))
            .unwrap_or_default(),
    });

    let header = HeaderBlock {
        lines: vec![
            "Client Information:".to_string(),
            format!("Name: {}", client_name),
            format!("Location: {}", or_na(&inspection.location)),
            format!("Date: {}", format_long_date(inspection.inspection_date)),
            format!("Inspector: {}", or_na(&inspection.inspector)),
            format!("Status: {}", capitalize(inspection.status.as_str())),
        ],
    };

    let rows = items
        .iter()
        .map(|item| TableRow {
            location: item_location(item),
            equipment: item.equipment_type.code().to_string(),
            status: item.status.as_str().to_uppercase(),
            notes: item.notes.clone().unwrap_or_default(),
        })
        .collect();

    InspectionReport {
        filename: format!(
            "inspection-{}-{}.pdf",
            inspection.inspection_date.format("%Y-%m-%d"),
            slugify(client_name)
        ),
        cover,
        header,
        columns: [
            "Location".to_string(),
            "Equipment Type".to_string(),
            "Status".to_string(),
            "Notes".to_string(),
        ],
        rows,
    }
}

/// Builds a contract renewal notice for one client. `month` is any day in
/// the renewal month being noticed.
pub fn build_renewal_notice(
    client: &Client,
    month: NaiveDate,
    company: Option<&CompanyInfo>,
) -> RenewalNotice {
    let contract_end = client.contract_end.unwrap_or(month);
    let address = client.address_line();

    RenewalNotice {
        filename: format!(
            "renewal-{}-{}.pdf",
            contract_end.format("%Y-%m"),
            slugify(&client.name)
        ),
        title: company_title(company),
        heading: "Contract Renewal Notice".to_string(),
        month_label: month.format("%B %Y").to_string(),
        details: vec![
            ("Client:".to_string(), client.name.clone()),
            (
                "Contact:".to_string(),
                na_if_empty(client.point_of_contact.as_deref()),
            ),
            ("Phone:".to_string(), na_if_empty(client.phone.as_deref())),
            ("Email:".to_string(), na_if_empty(client.email.as_deref())),
            ("Address:".to_string(), address),
            (
                "Contract Amount:".to_string(),
                format_currency(client.contract_amount.unwrap_or(0.0)),
            ),
            (
                "Contract End:".to_string(),
                format_long_date(contract_end),
            ),
            (
                "Inspection Types:".to_string(),
                if client.inspection_types.is_empty() {
                    "N/A".to_string()
                } else {
                    client.inspection_types.join(", ")
                },
            ),
            (
                "Frequency:".to_string(),
                na_if_empty(client.frequency.as_deref()),
            ),
        ],
        notes: client
            .notes
            .as_deref()
            .map(|n| wrap_text(n, NOTES_WRAP_COLUMNS))
            .unwrap_or_default(),
    }
}

fn company_title(company: Option<&CompanyInfo>) -> String {
    company
        .map(|c| c.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_COMPANY_NAME)
        .to_string()
}

fn item_location(item: &InspectionItem) -> String {
    let location = format!("{} {}", item.floor, item.room).trim().to_string();
    if location.is_empty() {
        "N/A".to_string()
    } else {
        location
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

fn na_if_empty(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

//=========================================================================================
// Formatting Helpers
//=========================================================================================

/// Formats an amount as US dollars with thousands separators and two
/// decimal places, e.g. `1500.0` -> `$1,500.00`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}

/// Long-form date: `August 25, 2026`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Footer timestamp: `August 25, 2026 3:04 PM`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y %-I:%M %p").to_string()
}

/// Lowercases and collapses whitespace runs to single hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Uppercases the first character only, matching how statuses are shown.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Greedy word wrap to at most `width` characters per line. Words longer
/// than the width get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EquipmentType, InspectionStatus, ItemStatus};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn inspection(cover_page: bool) -> Inspection {
        Inspection {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            inspection_date: date(2026, 3, 15),
            location: "Main Warehouse".to_string(),
            inspector: "John Doe".to_string(),
            status: InspectionStatus::Scheduled,
            notes: Some("Sprinkler valve room was repainted since last visit".to_string()),
            cover_page,
            created_at: Utc::now(),
        }
    }

    fn item(floor: &str, room: &str, status: ItemStatus) -> InspectionItem {
        InspectionItem {
            id: Uuid::new_v4(),
            inspection_id: Uuid::new_v4(),
            floor: floor.to_string(),
            room: room.to_string(),
            equipment_type: EquipmentType::FiveAbc,
            status,
            notes: None,
        }
    }

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            name: "Acme Holdings LLC".to_string(),
            point_of_contact: Some("Pat Smith".to_string()),
            inspection_types: vec!["fire-extinguisher".to_string(), "exit-light".to_string()],
            frequency: Some("annual".to_string()),
            phone: Some("555-0100".to_string()),
            street_address: Some("1 Main St".to_string()),
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            zip_code: Some("62701".to_string()),
            email: Some("pat@acme.test".to_string()),
            notes: None,
            contract_start: Some(date(2025, 10, 1)),
            contract_end: Some(date(2026, 9, 30)),
            contract_amount: Some(1500.0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn inspection_filename_uses_iso_date_and_slug() {
        let report =
            build_inspection_report(&inspection(false), &[], "Acme Holdings LLC", None);
        assert_eq!(report.filename, "inspection-2026-03-15-acme-holdings-llc.pdf");
    }

    #[test]
    fn cover_page_only_when_requested() {
        let with = build_inspection_report(&inspection(true), &[], "Acme", None);
        let without = build_inspection_report(&inspection(false), &[], "Acme", None);
        assert!(with.cover.is_some());
        assert!(without.cover.is_none());
    }

    #[test]
    fn cover_page_details_are_labelled_and_ordered() {
        let report = build_inspection_report(&inspection(true), &[], "Acme", None);
        let cover = report.cover.unwrap();
        let labels: Vec<&str> = cover.details.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Client:", "Date:", "Location:", "Inspector:", "Status:"]
        );
        assert_eq!(cover.details[1].1, "March 15, 2026");
        assert_eq!(cover.details[4].1, "Scheduled");
        assert!(!cover.notes.is_empty());
    }

    #[test]
    fn table_rows_trim_location_and_uppercase_status() {
        let items = vec![
            item("2", "Boiler Room", ItemStatus::Pass),
            item("", "", ItemStatus::NoAccess),
        ];
        let report = build_inspection_report(&inspection(false), &items, "Acme", None);
        assert_eq!(report.rows[0].location, "2 Boiler Room");
        assert_eq!(report.rows[0].status, "PASS");
        assert_eq!(report.rows[1].location, "N/A");
        assert_eq!(report.rows[1].status, "NO-ACCESS");
    }

    #[test]
    fn unknown_equipment_passes_through_to_table() {
        let mut odd = item("1", "Lobby", ItemStatus::Fail);
        odd.equipment_type = EquipmentType::Other("CO2-20".to_string());
        let report = build_inspection_report(&inspection(false), &[odd], "Acme", None);
        assert_eq!(report.rows[0].equipment, "CO2-20");
    }

    #[test]
    fn report_content_is_idempotent() {
        let insp = inspection(true);
        let items = vec![item("1", "Lobby", ItemStatus::Pass)];
        let company = CompanyInfo {
            name: "Jac's Fire Protection".to_string(),
            ..CompanyInfo::default()
        };
        let a = build_inspection_report(&insp, &items, "Acme", Some(&company));
        let b = build_inspection_report(&insp, &items, "Acme", Some(&company));
        assert_eq!(a, b);
    }

    #[test]
    fn renewal_notice_formats_amount_and_dates() {
        let notice = build_renewal_notice(&client(), date(2026, 9, 1), None);
        assert_eq!(notice.filename, "renewal-2026-09-acme-holdings-llc.pdf");
        assert_eq!(notice.month_label, "September 2026");
        let amount = notice
            .details
            .iter()
            .find(|(l, _)| l == "Contract Amount:")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(amount, "$1,500.00");
        let end = notice
            .details
            .iter()
            .find(|(l, _)| l == "Contract End:")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(end, "September 30, 2026");
    }

    #[test]
    fn renewal_notice_joins_address_fields() {
        let notice = build_renewal_notice(&client(), date(2026, 9, 1), None);
        let address = notice
            .details
            .iter()
            .find(|(l, _)| l == "Address:")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(address, "1 Main St, Springfield, IL, 62701");
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1500.0), "$1,500.00");
        assert_eq!(format_currency(999.9), "$999.90");
        assert_eq!(format_currency(12_345_678.9), "$12,345,678.90");
    }

    #[test]
    fn slugify_collapses_whitespace() {
        assert_eq!(slugify("Acme  Holdings\tLLC"), "acme-holdings-llc");
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        for line in &lines {
            assert!(line.len() <= 9);
        }
    }
}
