//! Locating columns of the clinic exports by any of their known names.

use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::utils::normalize_column_name;

static EMPTY_CELL: Value = Value::Null;

pub const DOCUMENT: &[&str] = &["documento", "num_documento", "num_doc", "numero_documento", "cedula"];
pub const DATE: &[&str] = &["fecha"];
pub const OPERATION_DATE: &[&str] = &["fechaop", "fecha_op", "fecha"];
pub const FIRST_NAME: &[&str] = &["nombre1"];
pub const MIDDLE_NAME: &[&str] = &["nombre2"];
pub const FIRST_SURNAME: &[&str] = &["apellido1"];
pub const SECOND_SURNAME: &[&str] = &["apellido2"];
pub const PATIENT: &[&str] = &["nombre_paciente", "paciente"];
pub const AGREEMENT: &[&str] = &["tarifario", "convenio"];
pub const MUNICIPALITY: &[&str] = &["municipio", "ciudad"];
pub const USER: &[&str] = &["usuario"];
pub const DOCTOR: &[&str] = &["nombre_doctor", "doctor"];
pub const UNIT: &[&str] = &["unidad"];
pub const APPOINTMENT_KIND: &[&str] = &["tipocita", "tipo_cita"];
pub const PURPOSE: &[&str] = &["finalidad"];
pub const ATTENDED: &[&str] = &["asistio"];
pub const AMOUNT_PAID: &[&str] = &["valor_pagado", "valor", "valor pagado"];
pub const INVOICE: &[&str] = &["factura", "n_factura", "numero_factura"];
pub const PAYMENT_METHOD: &[&str] = &[
    "forma_pago",
    "forma de pago",
    "medio_pago",
    "medio de pago",
    "metodo_pago",
    "metodo de pago",
    "tipo_pago",
];
pub const BILLER: &[&str] = &["facturador"];
pub const PAYMENT_STATUS: &[&str] = &["estado", "estado_pago"];
/// Yes/no column flagging voided payments
pub const VOIDED_FLAG: &[&str] = &["anulado", "anulada"];
pub const CONCEPT: &[&str] = &["concepto"];
pub const CLINIC_INCOME: &[&str] = &["ingreso_clinica", "ingreso clinica"];

/// First header matching any candidate, trying candidates in order
pub fn find_column<'a>(headers: &'a [String], candidates: &[&str]) -> Option<&'a str> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
    candidates.iter().find_map(|candidate| {
        let key = normalize_column_name(candidate);
        normalized
            .iter()
            .position(|header| *header == key)
            .map(|index| headers[index].as_str())
    })
}

/// [`find_column`] for columns the pass cannot run without
pub fn require_column<'a>(
    headers: &'a [String],
    candidates: &[&str],
    sheet: &str,
) -> Result<&'a str, PipelineError> {
    find_column(headers, candidates).ok_or_else(|| PipelineError::ColumnNotFound {
        sheet: sheet.to_string(),
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
    })
}

/// Cell of `row` under `column`, or null when the column is absent
pub fn cell<'a>(row: &'a Map<String, Value>, column: Option<&str>) -> &'a Value {
    column
        .and_then(|name| row.get(name))
        .unwrap_or(&EMPTY_CELL)
}
