use mercadeo_lib::PipelineError;
use mercadeo_lib::source::{load_appointments, load_payments, load_sales};
use serde_json::{Value, json};

mod common;
use common::{feb, february_calendar, sheet};

const APPOINTMENT_HEADERS: [&str; 13] = [
    "Fecha",
    "Documento",
    "Nombre1",
    "Nombre2",
    "Apellido1",
    "Apellido2",
    "Tarifario",
    "Municipio",
    "Unidad",
    "TipoCita",
    "Finalidad",
    "Asistió",
    "Doctor",
];

fn appointment_row(date: &str, document: Value, attended: &str, kind: &str) -> Vec<Value> {
    vec![
        json!(date),
        document,
        json!("Ana"),
        Value::Null,
        json!("Ruiz"),
        json!("Diaz"),
        Value::Null,
        json!("Bogota"),
        json!("ORTODONCIA"),
        json!(kind),
        json!("Primera vez"),
        json!(attended),
        json!("Dra. Gomez"),
    ]
}

#[test]
fn test_load_appointments_builds_master_rows() {
    let data = sheet(
        &APPOINTMENT_HEADERS,
        vec![
            appointment_row("2026-02-03 08:30:00", json!(52345678), "SI ASISTIO", "Valoración Redes Sociales"),
            appointment_row("10/02/2026", json!("80111222.0"), "No", "Control"),
        ],
    );

    let rows = load_appointments(&data, &february_calendar()).unwrap();

    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    assert_eq!(first.document, "52345678");
    assert_eq!(first.patient.as_deref(), Some("Ana Ruiz Diaz"));
    assert_eq!(first.agreement.as_deref(), Some("PARTICULAR"));
    assert_eq!(first.municipality.as_deref(), Some("Bogota"));
    assert_eq!(first.date, Some(feb(3)));
    assert_eq!(first.year, Some(2026));
    assert_eq!(first.month.as_deref(), Some("FEBRERO"));
    assert_eq!(first.week.as_deref(), Some("SEMANA1"));
    assert_eq!(first.specialty.as_deref(), Some("Ortodoncia"));
    assert_eq!(first.channel.as_deref(), Some("Valoracion redes sociales"));
    assert_eq!(first.appointment_type.as_deref(), Some("Primera vez"));
    assert_eq!(first.professional.as_deref(), Some("Dra. Gomez"));
    assert_eq!(first.scheduled, Some(1));
    assert_eq!(first.attended, Some(1));
    assert!(first.id.is_empty());

    let second = &rows[1];
    assert_eq!(second.week.as_deref(), Some("SEMANA2"));
    assert_eq!(second.attended, Some(0));
    assert_eq!(second.channel, None);
}

#[test]
fn test_appointments_outside_the_weeks_are_dropped() {
    let data = sheet(
        &APPOINTMENT_HEADERS,
        vec![
            appointment_row("2026-02-01", json!(52345678), "SI", "Control"),
            appointment_row("2026-03-02", json!(52345678), "SI", "Control"),
            appointment_row("sin fecha", json!(52345678), "SI", "Control"),
        ],
    );

    let rows = load_appointments(&data, &february_calendar()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_missing_required_column_is_reported() {
    let data = sheet(&["Documento", "Nombre1"], vec![]);

    let error = load_appointments(&data, &february_calendar()).unwrap_err();

    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::ColumnNotFound { candidates, .. }) => {
            assert_eq!(candidates, &vec!["fecha".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_load_payments_reads_synonym_columns() {
    let data = sheet(
        &["Num_Documento", "Fecha", "Valor Pagado", "Factura", "Forma de Pago", "Facturador", "Estado", "Paciente"],
        vec![
            vec![
                json!("52345678"),
                json!("03/02/2026"),
                json!("$ 1.850.000"),
                json!("F-100"),
                json!("Tarjeta"),
                json!("Laura"),
                json!("anulado"),
                json!("Ana Ruiz"),
            ],
            vec![
                json!(52345678),
                json!(46056),
                json!(45000),
                Value::Null,
                json!("Efectivo"),
                Value::Null,
                json!(true),
                Value::Null,
            ],
            vec![
                json!("80111222"),
                json!("2026-02-04"),
                json!("45000.00"),
                json!(501),
                json!("Nequi"),
                json!("Laura"),
                json!("PAGADO"),
                Value::Null,
            ],
        ],
    );

    let payments = load_payments(&data, "ANULADO").unwrap();

    assert_eq!(payments.len(), 3);
    assert_eq!(payments[0].amount, 1_850_000);
    assert_eq!(payments[0].invoice, "F-100");
    assert_eq!(payments[0].method, "Tarjeta");
    assert_eq!(payments[0].biller, "Laura");
    assert_eq!(payments[0].patient.as_deref(), Some("Ana Ruiz"));
    assert!(payments[0].voided);

    assert_eq!(payments[1].paid_on, Some(feb(3)));
    assert_eq!(payments[1].invoice, "");
    assert!(payments[1].voided);

    assert_eq!(payments[2].document, "80111222");
    assert_eq!(payments[2].paid_on, Some(feb(4)));
    assert_eq!(payments[2].amount, 45_000);
    assert_eq!(payments[2].invoice, "501");
    assert!(!payments[2].voided);
}

#[test]
fn test_load_sales_requires_every_column() {
    let headers = ["FechaOp", "Concepto", "Documento", "Nombre_Paciente", "Nombre_Doctor", "Ingreso_Clinica"];
    let data = sheet(
        &headers,
        vec![vec![
            json!("2026-02-05 10:00:00"),
            json!("RADIOGRAFÍA PANORÁMICA"),
            json!(52345678),
            json!("Ana Ruiz"),
            json!("Dr. Rojas"),
            json!("$45,000"),
        ]],
    );

    let entries = load_sales(&data).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operated_on, Some(feb(5)));
    assert_eq!(entries[0].concept, "radiografia panoramica");
    assert_eq!(entries[0].income, 45_000);
    assert_eq!(entries[0].doctor.as_deref(), Some("Dr. Rojas"));

    let without_income = sheet(&headers[..5], vec![]);
    assert!(load_sales(&without_income).is_err());
}

#[test]
fn test_yes_no_voided_column_marks_payments() {
    let data = sheet(
        &["documento", "fecha", "valor_pagado", "Anulado"],
        vec![
            vec![json!("52345678"), json!("03/02/2026"), json!(1000), json!("SI")],
            vec![json!("52345678"), json!("03/02/2026"), json!(2000), json!("NO")],
            vec![json!("52345678"), json!("03/02/2026"), json!(3000), Value::Null],
        ],
    );

    let payments = load_payments(&data, "ANULADO").unwrap();

    let voided: Vec<bool> = payments.iter().map(|p| p.voided).collect();
    assert_eq!(voided, vec![true, false, false]);
}
