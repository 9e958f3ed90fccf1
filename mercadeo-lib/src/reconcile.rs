//! Payment reconciliation: folds the payments export into the master table.
//!
//! Payments are matched to master rows by (normalized document, calendar day).
//! Each payment stays a discrete unit: it is written onto exactly one row and
//! amounts are never summed. Rows of a recomputed key are cleared first, so
//! running the pass twice over the same inputs gives the same table.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calendar::WeekCalendar;
use crate::model::{DailyPaymentGroup, DayKey, MasterRecord, MasterTable, PaymentTransaction};
use crate::utils::normalize_column_name;

/// Spellings of the deposit-drawdown payment method seen in the exports
const ANTICIPO_MARKERS: [&str; 2] = ["anticipo", "anticpo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    pub apply_voided_filter: bool,
    pub apply_anticipo_filter: bool,
    pub apply_dedupe: bool,
    /// Add rows when a day has more distinct payments than appointments, and
    /// create rows for payments of days without any appointment
    pub expand_master: bool,
    /// Status text that marks a voided payment (case-insensitive)
    pub voided_marker: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            apply_voided_filter: true,
            apply_anticipo_filter: true,
            apply_dedupe: true,
            expand_master: true,
            voided_marker: "ANULADO".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub received: usize,
    pub voided: usize,
    pub anticipo: usize,
    pub duplicates: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub filter: FilterStats,
    /// Payments without document or date, which cannot be matched
    pub unkeyed: usize,
    pub groups: usize,
    pub cleared_rows: usize,
    pub expanded_rows: usize,
    pub new_rows: usize,
    pub assigned: usize,
    /// Payments left over after every matching row got one
    pub unassigned: usize,
}

/// A payment written onto a master row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub id: String,
    pub document: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub invoice: String,
    pub method: String,
    pub advisor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub table: MasterTable,
    pub stats: ReconcileStats,
    pub assignments: Vec<Assignment>,
}

/// Fuzzy match of the payment method against "anticipo" (and its common misspelling)
pub fn is_anticipo(method: &str) -> bool {
    let normalized = normalize_column_name(method);
    ANTICIPO_MARKERS
        .iter()
        .any(|marker| normalized.contains(marker))
}

/// Apply the voided, anticipo and exact-duplicate filters, keeping export order
pub fn filter_payments(
    payments: &[PaymentTransaction],
    options: &ReconcileOptions,
) -> (Vec<PaymentTransaction>, FilterStats) {
    let mut stats = FilterStats {
        received: payments.len(),
        ..FilterStats::default()
    };
    let mut seen: HashSet<(String, Option<NaiveDate>, i64, String, String)> = HashSet::new();
    let mut kept = Vec::with_capacity(payments.len());

    for payment in payments {
        if options.apply_voided_filter && payment.voided {
            stats.voided += 1;
            continue;
        }
        if options.apply_anticipo_filter && is_anticipo(&payment.method) {
            stats.anticipo += 1;
            continue;
        }
        if options.apply_dedupe {
            // A blank invoice is one more value of the key, not a wildcard
            let dedupe_key = (
                payment.document.clone(),
                payment.paid_on,
                payment.amount,
                payment.invoice.trim().to_string(),
                payment.method.trim().to_string(),
            );
            if !seen.insert(dedupe_key) {
                stats.duplicates += 1;
                continue;
            }
        }
        kept.push(payment.clone());
    }

    stats.kept = kept.len();
    (kept, stats)
}

/// Group payments by (document, day) in order of first appearance.
/// Returns the groups and the number of payments that had no usable key.
pub fn group_payments(payments: Vec<PaymentTransaction>) -> (Vec<DailyPaymentGroup>, usize) {
    let mut groups: Vec<DailyPaymentGroup> = Vec::new();
    let mut positions: HashMap<DayKey, usize> = HashMap::new();
    let mut unkeyed = 0;

    for payment in payments {
        let Some(key) = payment.key() else {
            unkeyed += 1;
            continue;
        };
        let position = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push(DailyPaymentGroup::new(key));
            groups.len() - 1
        });
        groups[position].push(payment);
    }

    (groups, unkeyed)
}

/// Reconcile `payments` against `table`.
///
/// 1. filter and group the payments;
/// 2. clear the payment columns of every row whose key has payments;
/// 3. when a key has more payments than rows and the surplus looks like
///    separate payment events, clone the first matching row for each extra
///    payment; keys without any row get minimal new rows;
/// 4. walk the table in order and give each matching row the first payment
///    still unassigned for its key.
pub fn reconcile_payments(
    table: MasterTable,
    payments: &[PaymentTransaction],
    options: &ReconcileOptions,
    calendar: &WeekCalendar,
) -> ReconcileOutcome {
    let (kept, filter_stats) = filter_payments(payments, options);
    let (mut groups, unkeyed) = group_payments(kept);
    let mut stats = ReconcileStats {
        filter: filter_stats,
        unkeyed,
        groups: groups.len(),
        ..ReconcileStats::default()
    };

    let mut table = table;
    let mut ids = table.id_sequence();
    let rows_by_key = table.rows_by_key();
    let records = table.records_mut();

    for group in &groups {
        let Some(rows) = rows_by_key.get(&group.key) else {
            continue;
        };
        for &row in rows {
            records[row].clear_payment();
            stats.cleared_rows += 1;
        }
    }

    for group in &groups {
        match rows_by_key.get(&group.key) {
            Some(rows) => {
                let surplus = group.len().saturating_sub(rows.len());
                if surplus == 0 {
                    continue;
                }
                if !options.expand_master || !group.signals_distinct_events() {
                    debug!(
                        "{} on {}: {} payment(s) for {} row(s), surplus treated as repeats",
                        group.key.document,
                        group.key.day,
                        group.len(),
                        rows.len()
                    );
                    continue;
                }
                let template = records[rows[0]].clone();
                for _ in 0..surplus {
                    records.push(template.clone_for_expansion(ids.next_id()));
                }
                stats.expanded_rows += surplus;
                debug!(
                    "{} on {}: added {} row(s) for distinct payments",
                    group.key.document, group.key.day, surplus
                );
            }
            None if options.expand_master => {
                for payment in &group.payments {
                    records.push(MasterRecord::synthesized(
                        ids.next_id(),
                        &group.key,
                        payment.patient.clone(),
                        calendar,
                    ));
                }
                stats.new_rows += group.len();
                debug!(
                    "{} on {}: no appointment, created {} row(s)",
                    group.key.document,
                    group.key.day,
                    group.len()
                );
            }
            None => {}
        }
    }

    let positions: HashMap<DayKey, usize> = groups
        .iter()
        .enumerate()
        .map(|(position, group)| (group.key.clone(), position))
        .collect();
    let mut assignments = Vec::new();

    for record in records.iter_mut() {
        let Some(key) = record.key() else {
            continue;
        };
        let Some(&position) = positions.get(&key) else {
            continue;
        };
        let group = &mut groups[position];
        let Some(payment) = group.pop_next() else {
            continue;
        };

        let advisor = match payment.biller.trim() {
            "" => group.billers_label(),
            biller => Some(biller.to_string()),
        };
        record.assign_payment(&payment, advisor.clone());
        assignments.push(Assignment {
            id: record.id.clone(),
            document: key.document,
            date: key.day,
            amount: payment.amount,
            invoice: payment.invoice.trim().to_string(),
            method: payment.method.trim().to_string(),
            advisor,
        });
    }

    for record in records.iter_mut() {
        if record.effective.is_none() {
            record.effective = Some(0);
        }
    }

    stats.assigned = assignments.len();
    stats.unassigned = groups.iter().map(DailyPaymentGroup::len).sum();

    ReconcileOutcome {
        table,
        stats,
        assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn payment(document: &str, amount: i64, invoice: &str, method: &str) -> PaymentTransaction {
        PaymentTransaction {
            document: document.to_string(),
            paid_on: Some(day(3)),
            amount,
            invoice: invoice.to_string(),
            method: method.to_string(),
            ..PaymentTransaction::default()
        }
    }

    #[test]
    fn test_is_anticipo_fuzzy() {
        assert!(is_anticipo("Descuento de anticipo"));
        assert!(is_anticipo("DESCONTAR DE ANTICPO"));
        assert!(is_anticipo("Anticipo"));
        assert!(!is_anticipo("Efectivo"));
        assert!(!is_anticipo(""));
    }

    #[test]
    fn test_filters_are_toggleable() {
        let mut voided = payment("52345678", 10000, "F-1", "Efectivo");
        voided.voided = true;
        let payments = vec![
            voided,
            payment("52345678", 20000, "F-2", "Descuento de anticipo"),
            payment("52345678", 30000, "F-3", "Tarjeta"),
            payment("52345678", 30000, "F-3", "Tarjeta"),
        ];

        let (kept, stats) = filter_payments(&payments, &ReconcileOptions::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(
            stats,
            FilterStats {
                received: 4,
                voided: 1,
                anticipo: 1,
                duplicates: 1,
                kept: 1
            }
        );

        let nothing = ReconcileOptions {
            apply_voided_filter: false,
            apply_anticipo_filter: false,
            apply_dedupe: false,
            ..ReconcileOptions::default()
        };
        let (kept, stats) = filter_payments(&payments, &nothing);
        assert_eq!(kept.len(), 4);
        assert_eq!(stats.kept, 4);
    }

    #[test]
    fn test_group_payments_keeps_first_appearance_order() {
        let mut other_day = payment("52345678", 5000, "", "Efectivo");
        other_day.paid_on = Some(day(4));
        let mut undated = payment("52345678", 5000, "", "Efectivo");
        undated.paid_on = None;

        let (groups, unkeyed) = group_payments(vec![
            payment("52345678", 1000, "", "Efectivo"),
            other_day,
            payment("", 1000, "", "Efectivo"),
            payment("52345678", 2000, "", "Efectivo"),
            undated,
        ]);

        assert_eq!(unkeyed, 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.day, day(3));
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].key.day, day(4));
    }
}
