//! The accumulated master table ("Datos Mercadeo") and its rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{DayKey, PaymentTransaction, cell_int, cell_text};
use crate::calendar::WeekCalendar;
use crate::columns::cell;
use crate::error::PipelineError;
use crate::utils::{format_master_date, parse_date};

pub const ID_PREFIX: &str = "ODON-";

/// Worksheet holding the master table
pub const SHEET_NAME: &str = "Datos Mercadeo";

/// Header names of the master workbook
pub mod columns {
    pub const ID: &str = "id_registro";
    pub const DOCUMENT: &str = "Numero_Documento";
    pub const PATIENT: &str = "Paciente";
    pub const MUNICIPALITY: &str = "Municipio";
    pub const AGREEMENT: &str = "Convenio";
    pub const DATE: &str = "Fecha";
    pub const YEAR: &str = "Año";
    pub const MONTH: &str = "Mes";
    pub const WEEK: &str = "Semana";
    pub const AGENT: &str = "Agente";
    pub const PROFESSIONAL: &str = "Profesional_Asignado";
    pub const SPECIALTY: &str = "Especialidad";
    pub const CHANNEL: &str = "Canal_Captacion";
    pub const APPOINTMENT_TYPE: &str = "Tipo_Cita";
    pub const SCHEDULED: &str = "Programados";
    pub const ATTENDED: &str = "Asistido";
    pub const EFFECTIVE: &str = "Efectivo";
    pub const QUOTE: &str = "cotizacion";
    pub const ADMITTED: &str = "Admisionado";
    pub const ADMISSION_EFFECTIVE: &str = "Admisión_Efectiva";
    pub const INVOICE: &str = "Factura";
    pub const PAYMENT_METHOD: &str = "Metodo_Pago";
    pub const ADVISOR: &str = "Asesor_Comercial";
    pub const SALES_DENTIST: &str = "Odontologo_Venta";
    pub const FIRST_PAYMENT_SALE: &str = "Venta_Primer_Pago";
    pub const SECOND_PAYMENT: &str = "Cartera (2do pago)";
    pub const COLLECTED: &str = "Recaudo (venta día)";
    pub const TREATMENT_TOTAL: &str = "Tratamiento (Venta total de cotizado)";
    pub const EXECUTED_VALUE: &str = "Valor ejecutado";
    pub const TOTAL_SALE: &str = "Total venta (Efectivo + cotización)";
    pub const PENDING_PORTFOLIO: &str = "Falta por recuperar cartera";
}

/// Output column order of the master workbook
pub const MASTER_COLUMNS: [&str; 31] = [
    columns::ID,
    columns::DOCUMENT,
    columns::PATIENT,
    columns::MUNICIPALITY,
    columns::AGREEMENT,
    columns::DATE,
    columns::YEAR,
    columns::MONTH,
    columns::WEEK,
    columns::AGENT,
    columns::PROFESSIONAL,
    columns::SPECIALTY,
    columns::CHANNEL,
    columns::APPOINTMENT_TYPE,
    columns::SCHEDULED,
    columns::ATTENDED,
    columns::EFFECTIVE,
    columns::QUOTE,
    columns::ADMITTED,
    columns::ADMISSION_EFFECTIVE,
    columns::INVOICE,
    columns::PAYMENT_METHOD,
    columns::ADVISOR,
    columns::SALES_DENTIST,
    columns::FIRST_PAYMENT_SALE,
    columns::SECOND_PAYMENT,
    columns::COLLECTED,
    columns::TREATMENT_TOTAL,
    columns::EXECUTED_VALUE,
    columns::TOTAL_SALE,
    columns::PENDING_PORTFOLIO,
];

/// Numeric master columns that the sales-report merge may write into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeColumn {
    #[default]
    Collected,
    FirstPaymentSale,
    TreatmentTotal,
    ExecutedValue,
    TotalSale,
}

impl IncomeColumn {
    pub fn header(self) -> &'static str {
        match self {
            IncomeColumn::Collected => columns::COLLECTED,
            IncomeColumn::FirstPaymentSale => columns::FIRST_PAYMENT_SALE,
            IncomeColumn::TreatmentTotal => columns::TREATMENT_TOTAL,
            IncomeColumn::ExecutedValue => columns::EXECUTED_VALUE,
            IncomeColumn::TotalSale => columns::TOTAL_SALE,
        }
    }
}

/// One appointment-level row of the master table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterRecord {
    pub id: String,
    pub document: String,
    pub patient: Option<String>,
    pub municipality: Option<String>,
    pub agreement: Option<String>,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub week: Option<String>,
    pub agent: Option<String>,
    pub professional: Option<String>,
    pub specialty: Option<String>,
    pub channel: Option<String>,
    pub appointment_type: Option<String>,
    pub scheduled: Option<i64>,
    pub attended: Option<i64>,
    pub effective: Option<i64>,
    pub quote: Option<i64>,
    pub admitted: Value,
    pub admission_effective: Value,
    pub invoice: Option<String>,
    pub payment_method: Option<String>,
    pub advisor: Option<String>,
    pub sales_dentist: Value,
    pub first_payment_sale: Option<i64>,
    pub second_payment: Value,
    pub collected: Option<i64>,
    pub treatment_total: Option<i64>,
    pub executed_value: Option<i64>,
    pub total_sale: Option<i64>,
    pub pending_portfolio: Value,
}

impl MasterRecord {
    /// Minimal row for a (document, day) that has no appointment in the master
    pub fn synthesized(
        id: String,
        key: &DayKey,
        patient: Option<String>,
        calendar: &WeekCalendar,
    ) -> Self {
        let labels = calendar.labels_for(key.day);
        MasterRecord {
            id,
            document: key.document.clone(),
            patient,
            date: Some(key.day),
            year: Some(labels.year),
            month: labels.month.map(str::to_string),
            week: labels.week,
            ..MasterRecord::default()
        }
    }

    pub fn from_row(row: &Map<String, Value>) -> Self {
        let text = |name: &str| cell_text(cell(row, Some(name)));
        let int = |name: &str| cell_int(cell(row, Some(name)));
        let raw = |name: &str| cell(row, Some(name)).clone();

        MasterRecord {
            id: text(columns::ID).unwrap_or_default(),
            document: text(columns::DOCUMENT).unwrap_or_default(),
            patient: text(columns::PATIENT),
            municipality: text(columns::MUNICIPALITY),
            agreement: text(columns::AGREEMENT),
            date: parse_date(cell(row, Some(columns::DATE))),
            year: int(columns::YEAR).and_then(|y| i32::try_from(y).ok()),
            month: text(columns::MONTH),
            week: text(columns::WEEK),
            agent: text(columns::AGENT),
            professional: text(columns::PROFESSIONAL),
            specialty: text(columns::SPECIALTY),
            channel: text(columns::CHANNEL),
            appointment_type: text(columns::APPOINTMENT_TYPE),
            scheduled: int(columns::SCHEDULED),
            attended: int(columns::ATTENDED),
            effective: int(columns::EFFECTIVE),
            quote: int(columns::QUOTE),
            admitted: raw(columns::ADMITTED),
            admission_effective: raw(columns::ADMISSION_EFFECTIVE),
            invoice: text(columns::INVOICE),
            payment_method: text(columns::PAYMENT_METHOD),
            advisor: text(columns::ADVISOR),
            sales_dentist: raw(columns::SALES_DENTIST),
            first_payment_sale: int(columns::FIRST_PAYMENT_SALE),
            second_payment: raw(columns::SECOND_PAYMENT),
            collected: int(columns::COLLECTED),
            treatment_total: int(columns::TREATMENT_TOTAL),
            executed_value: int(columns::EXECUTED_VALUE),
            total_sale: int(columns::TOTAL_SALE),
            pending_portfolio: raw(columns::PENDING_PORTFOLIO),
        }
    }

    /// Cell values in [`MASTER_COLUMNS`] order
    pub fn to_cells(&self) -> Vec<Value> {
        fn text(value: &Option<String>) -> Value {
            value.as_ref().map_or(Value::Null, |s| Value::String(s.clone()))
        }
        fn int(value: Option<i64>) -> Value {
            value.map_or(Value::Null, |n| json!(n))
        }

        vec![
            Value::String(self.id.clone()),
            Value::String(self.document.clone()),
            text(&self.patient),
            text(&self.municipality),
            text(&self.agreement),
            self.date
                .map_or(Value::Null, |d| Value::String(format_master_date(d))),
            int(self.year.map(i64::from)),
            text(&self.month),
            text(&self.week),
            text(&self.agent),
            text(&self.professional),
            text(&self.specialty),
            text(&self.channel),
            text(&self.appointment_type),
            int(self.scheduled),
            int(self.attended),
            int(self.effective),
            int(self.quote),
            self.admitted.clone(),
            self.admission_effective.clone(),
            text(&self.invoice),
            text(&self.payment_method),
            text(&self.advisor),
            self.sales_dentist.clone(),
            int(self.first_payment_sale),
            self.second_payment.clone(),
            int(self.collected),
            int(self.treatment_total),
            int(self.executed_value),
            int(self.total_sale),
            self.pending_portfolio.clone(),
        ]
    }

    /// (document, day) of the row; rows without a date or document never match
    pub fn key(&self) -> Option<DayKey> {
        DayKey::new(&self.document, self.date?)
    }

    /// Forget whatever an earlier payments run wrote onto this row
    pub fn clear_payment(&mut self) {
        self.collected = None;
        self.advisor = None;
        self.invoice = None;
        self.payment_method = None;
        self.effective = None;
    }

    pub fn assign_payment(&mut self, payment: &PaymentTransaction, advisor: Option<String>) {
        self.collected = Some(payment.amount);
        self.invoice = non_empty(&payment.invoice);
        self.payment_method = non_empty(&payment.method);
        self.advisor = advisor;
        // A zero amount is an unparseable cell, not a payment
        self.effective = Some(i64::from(payment.amount > 0));
    }

    /// Copy of the row's appointment data under a new ID, without any money columns
    pub fn clone_for_expansion(&self, id: String) -> Self {
        MasterRecord {
            id,
            effective: None,
            invoice: None,
            payment_method: None,
            advisor: None,
            sales_dentist: Value::Null,
            first_payment_sale: None,
            second_payment: Value::Null,
            collected: None,
            treatment_total: None,
            executed_value: None,
            total_sale: None,
            pending_portfolio: Value::Null,
            ..self.clone()
        }
    }

    pub fn income(&self, column: IncomeColumn) -> Option<i64> {
        match column {
            IncomeColumn::Collected => self.collected,
            IncomeColumn::FirstPaymentSale => self.first_payment_sale,
            IncomeColumn::TreatmentTotal => self.treatment_total,
            IncomeColumn::ExecutedValue => self.executed_value,
            IncomeColumn::TotalSale => self.total_sale,
        }
    }

    pub fn set_income(&mut self, column: IncomeColumn, amount: i64) {
        let slot = match column {
            IncomeColumn::Collected => &mut self.collected,
            IncomeColumn::FirstPaymentSale => &mut self.first_payment_sale,
            IncomeColumn::TreatmentTotal => &mut self.treatment_total,
            IncomeColumn::ExecutedValue => &mut self.executed_value,
            IncomeColumn::TotalSale => &mut self.total_sale,
        };
        *slot = Some(amount);
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Hands out `ODON-0000001`-style IDs after the highest one already used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn starting_after(last: u64) -> Self {
        IdSequence { last }
    }

    pub fn next_id(&mut self) -> String {
        self.last += 1;
        format!("{ID_PREFIX}{:07}", self.last)
    }
}

/// Numeric suffix of an ID ("ODON-0000042" -> 42)
fn id_number(id: &str) -> Option<u64> {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(index, _)| index)?;
    id[digits_start..].parse().ok()
}

/// Outcome of [`MasterTable::replace_buckets`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub removed: usize,
    pub added: usize,
    pub added_by_week: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterTable {
    records: Vec<MasterRecord>,
}

impl MasterTable {
    pub fn new(records: Vec<MasterRecord>) -> Self {
        MasterTable { records }
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        MasterTable {
            records: rows.into_iter().map(MasterRecord::from_row).collect(),
        }
    }

    pub fn records(&self) -> &[MasterRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MasterRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest numeric ID suffix in the table, 0 when there is none
    pub fn next_id_start(&self) -> u64 {
        self.records
            .iter()
            .filter_map(|record| id_number(&record.id))
            .max()
            .unwrap_or(0)
    }

    pub fn id_sequence(&self) -> IdSequence {
        IdSequence::starting_after(self.next_id_start())
    }

    /// Drop every row of the weeks `calendar` recomputes and append `new_rows`
    /// with fresh IDs. IDs continue after the highest ID present before the
    /// removal, so the IDs of removed rows are never handed out again.
    pub fn replace_buckets(
        &mut self,
        calendar: &WeekCalendar,
        new_rows: Vec<MasterRecord>,
    ) -> ReplaceSummary {
        let mut ids = self.id_sequence();
        let before = self.records.len();
        self.records.retain(|record| {
            !record
                .week
                .as_deref()
                .is_some_and(|week| calendar.is_recomputed(week))
        });

        let mut summary = ReplaceSummary {
            removed: before - self.records.len(),
            ..ReplaceSummary::default()
        };

        for mut row in new_rows {
            row.id = ids.next_id();
            if let Some(week) = &row.week {
                *summary.added_by_week.entry(week.clone()).or_default() += 1;
            }
            summary.added += 1;
            self.records.push(row);
        }

        summary
    }

    /// Manual regression guard for a known dataset
    pub fn check_row_count(&self, expected: Option<usize>) -> Result<(), PipelineError> {
        match expected {
            Some(expected) if expected != self.records.len() => {
                Err(PipelineError::RowCountMismatch {
                    expected,
                    actual: self.records.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Row indices per (document, day), in table order
    pub fn rows_by_key(&self) -> BTreeMap<DayKey, Vec<usize>> {
        let mut index: BTreeMap<DayKey, Vec<usize>> = BTreeMap::new();
        for (position, record) in self.records.iter().enumerate() {
            if let Some(key) = record.key() {
                index.entry(key).or_default().push(position);
            }
        }
        index
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<MasterRecord> {
        &mut self.records
    }
}
