//! Turns the raw clinic exports into domain rows.

use anyhow::Result;
use serde_json::Value;

use crate::amount::parse_amount;
use crate::calendar::WeekCalendar;
use crate::columns::{self, cell, find_column, require_column};
use crate::document::normalize_document;
use crate::excel::SheetData;
use crate::model::{MasterRecord, PaymentTransaction, SalesEntry, cell_text};
use crate::utils::{normalize_string, normalize_text, parse_date};

/// Agreement written when the appointment has no tariff
pub const DEFAULT_AGREEMENT: &str = "PARTICULAR";

/// Specialty for units outside [`SPECIALTIES`]
pub const DEFAULT_SPECIALTY: &str = "Odontologia General";

/// Normalized unit name -> specialty label
const SPECIALTIES: [(&str, &str); 8] = [
    ("cirugia oral", "Cirugia Oral"),
    ("cirujia oral", "Cirugia Oral"),
    ("endodoncia", "Endodoncia"),
    ("odontopediatria", "Odontopediatria"),
    ("ortodoncia", "Ortodoncia"),
    ("periodoncia", "Periodoncia"),
    ("rehabilitacion", "Rehabilitacion"),
    ("rehabilitacion oral", "Rehabilitacion"),
];

/// Appointment kinds that identify the acquisition channel
const CHANNELS: [&str; 2] = ["Valoracion redes sociales", "Agente ia"];

pub fn specialty_for_unit(unit: &str) -> &'static str {
    let unit = normalize_text(unit);
    SPECIALTIES
        .iter()
        .find(|(name, _)| *name == unit)
        .map_or(DEFAULT_SPECIALTY, |(_, specialty)| *specialty)
}

/// The appointment kind when it is one of the tracked channels
pub fn channel_for_kind(kind: &str) -> Option<&'static str> {
    let kind = normalize_text(kind);
    CHANNELS
        .iter()
        .find(|channel| normalize_text(channel) == kind)
        .copied()
}

fn patient_name(parts: &[&Value]) -> Option<String> {
    let joined = parts
        .iter()
        .filter_map(|part| cell_text(part))
        .collect::<Vec<_>>()
        .join(" ");
    let name = normalize_string(&joined);
    if name.is_empty() { None } else { Some(name) }
}

/// Build master rows (without IDs) from the "citas detallado" export.
/// Appointments outside every configured week are dropped.
pub fn load_appointments(sheet: &SheetData, calendar: &WeekCalendar) -> Result<Vec<MasterRecord>> {
    let headers = &sheet.headers;
    let date_col = require_column(headers, columns::DATE, &sheet.sheet_name)?;
    let document_col = require_column(headers, columns::DOCUMENT, &sheet.sheet_name)?;
    let name_cols = [
        find_column(headers, columns::FIRST_NAME),
        find_column(headers, columns::MIDDLE_NAME),
        find_column(headers, columns::FIRST_SURNAME),
        find_column(headers, columns::SECOND_SURNAME),
    ];
    let agreement_col = find_column(headers, columns::AGREEMENT);
    let municipality_col = find_column(headers, columns::MUNICIPALITY);
    let user_col = find_column(headers, columns::USER);
    let doctor_col = find_column(headers, columns::DOCTOR);
    let unit_col = find_column(headers, columns::UNIT);
    let kind_col = find_column(headers, columns::APPOINTMENT_KIND);
    let purpose_col = find_column(headers, columns::PURPOSE);
    let attended_col = find_column(headers, columns::ATTENDED);

    let mut records = Vec::new();
    for row in sheet.maps() {
        let Some(date) = parse_date(cell(row, Some(date_col))) else {
            continue;
        };
        let labels = calendar.labels_for(date);
        if labels.week.is_none() {
            continue;
        }

        let names: Vec<&Value> = name_cols.iter().map(|col| cell(row, *col)).collect();
        let attended = cell_text(cell(row, attended_col))
            .is_some_and(|answer| answer.to_uppercase().starts_with("SI"));

        records.push(MasterRecord {
            document: normalize_document(cell(row, Some(document_col))),
            patient: patient_name(&names),
            municipality: cell_text(cell(row, municipality_col)),
            agreement: Some(
                cell_text(cell(row, agreement_col)).unwrap_or_else(|| DEFAULT_AGREEMENT.to_string()),
            ),
            date: Some(date),
            year: Some(labels.year),
            month: labels.month.map(str::to_string),
            week: labels.week,
            agent: cell_text(cell(row, user_col)),
            professional: cell_text(cell(row, doctor_col)),
            specialty: Some(
                specialty_for_unit(&cell_text(cell(row, unit_col)).unwrap_or_default()).to_string(),
            ),
            channel: cell_text(cell(row, kind_col))
                .and_then(|kind| channel_for_kind(&kind))
                .map(str::to_string),
            appointment_type: cell_text(cell(row, purpose_col)),
            scheduled: Some(1),
            attended: Some(i64::from(attended)),
            ..MasterRecord::default()
        });
    }

    Ok(records)
}

/// "SI", "S", "X", "1" or a `true` boolean in a yes/no column
fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        other => cell_text(other).is_some_and(|text| {
            matches!(
                normalize_text(&text).as_str(),
                "si" | "s" | "x" | "1" | "true" | "anulado" | "anulada"
            )
        }),
    }
}

/// Read the payments export. A payment is voided when the status column
/// equals `voided_marker` (case-insensitive) or holds `true`, or when an
/// `Anulado` yes/no column is affirmative.
pub fn load_payments(sheet: &SheetData, voided_marker: &str) -> Result<Vec<PaymentTransaction>> {
    let headers = &sheet.headers;
    let document_col = require_column(headers, columns::DOCUMENT, &sheet.sheet_name)?;
    let date_col = require_column(headers, columns::DATE, &sheet.sheet_name)?;
    let amount_col = require_column(headers, columns::AMOUNT_PAID, &sheet.sheet_name)?;
    let invoice_col = find_column(headers, columns::INVOICE);
    let method_col = find_column(headers, columns::PAYMENT_METHOD);
    let biller_col = find_column(headers, columns::BILLER);
    let status_col = find_column(headers, columns::PAYMENT_STATUS);
    let voided_col = find_column(headers, columns::VOIDED_FLAG);
    let patient_col = find_column(headers, columns::PATIENT);

    let marker = voided_marker.trim().to_lowercase();
    let is_voided = |status: &Value, voided_flag: &Value| {
        let by_status = match status {
            Value::Bool(flag) => *flag,
            other => cell_text(other).is_some_and(|s| !marker.is_empty() && s.to_lowercase() == marker),
        };
        by_status || is_affirmative(voided_flag)
    };

    let payments = sheet
        .maps()
        .map(|row| PaymentTransaction {
            document: normalize_document(cell(row, Some(document_col))),
            paid_on: parse_date(cell(row, Some(date_col))),
            amount: parse_amount(cell(row, Some(amount_col))),
            invoice: cell_text(cell(row, invoice_col)).unwrap_or_default(),
            method: cell_text(cell(row, method_col)).unwrap_or_default(),
            biller: cell_text(cell(row, biller_col)).unwrap_or_default(),
            patient: cell_text(cell(row, patient_col)),
            voided: is_voided(cell(row, status_col), cell(row, voided_col)),
        })
        .collect();

    Ok(payments)
}

/// Read the sales report ("informe de ventas"); every column is required
pub fn load_sales(sheet: &SheetData) -> Result<Vec<SalesEntry>> {
    let headers = &sheet.headers;
    let date_col = require_column(headers, columns::OPERATION_DATE, &sheet.sheet_name)?;
    let concept_col = require_column(headers, columns::CONCEPT, &sheet.sheet_name)?;
    let document_col = require_column(headers, columns::DOCUMENT, &sheet.sheet_name)?;
    let patient_col = require_column(headers, columns::PATIENT, &sheet.sheet_name)?;
    let doctor_col = require_column(headers, columns::DOCTOR, &sheet.sheet_name)?;
    let income_col = require_column(headers, columns::CLINIC_INCOME, &sheet.sheet_name)?;

    let entries = sheet
        .maps()
        .map(|row| SalesEntry {
            document: normalize_document(cell(row, Some(document_col))),
            operated_on: parse_date(cell(row, Some(date_col))),
            concept: normalize_text(&cell_text(cell(row, Some(concept_col))).unwrap_or_default()),
            patient: cell_text(cell(row, Some(patient_col))),
            doctor: cell_text(cell(row, Some(doctor_col))),
            income: parse_amount(cell(row, Some(income_col))),
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialty_for_unit() {
        assert_eq!(specialty_for_unit("CIRUGÍA ORAL"), "Cirugia Oral");
        assert_eq!(specialty_for_unit("cirujia  oral"), "Cirugia Oral");
        assert_eq!(specialty_for_unit("Rehabilitación Oral"), "Rehabilitacion");
        assert_eq!(specialty_for_unit("Higiene"), DEFAULT_SPECIALTY);
        assert_eq!(specialty_for_unit(""), DEFAULT_SPECIALTY);
    }

    #[test]
    fn test_channel_for_kind() {
        assert_eq!(
            channel_for_kind("VALORACIÓN REDES SOCIALES"),
            Some("Valoracion redes sociales")
        );
        assert_eq!(channel_for_kind("Agente IA"), Some("Agente ia"));
        assert_eq!(channel_for_kind("Control"), None);
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative(&serde_json::json!("SI")));
        assert!(is_affirmative(&serde_json::json!(" sí ")));
        assert!(is_affirmative(&serde_json::json!("X")));
        assert!(is_affirmative(&serde_json::json!(1)));
        assert!(is_affirmative(&serde_json::json!(true)));
        assert!(!is_affirmative(&serde_json::json!("NO")));
        assert!(!is_affirmative(&serde_json::json!(0)));
        assert!(!is_affirmative(&Value::Null));
    }
}
