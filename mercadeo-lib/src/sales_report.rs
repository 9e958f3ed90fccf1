//! Sales-report merge: folds radiography income into the master table.
//!
//! Entries are matched to master rows by (document, day) like payments, but the
//! merge never overwrites: income lands only in cells that are empty or zero,
//! and the professional is only filled where the master has none.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calendar::WeekCalendar;
use crate::model::{DayKey, IncomeColumn, MasterRecord, MasterTable, SalesEntry};
use crate::utils::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesOptions {
    /// Entries whose concept contains this text (accent and case-insensitive) are merged
    pub concept_filter: String,
    pub income_column: IncomeColumn,
    pub apply_dedupe: bool,
    /// Add rows when a day has more entries than appointments, and create rows
    /// for entries of days without any appointment
    pub expand_master: bool,
}

impl Default for SalesOptions {
    fn default() -> Self {
        SalesOptions {
            concept_filter: "radiografia".to_string(),
            income_column: IncomeColumn::Collected,
            apply_dedupe: true,
            expand_master: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesStats {
    pub received: usize,
    pub other_concepts: usize,
    pub duplicates: usize,
    pub unkeyed: usize,
    pub groups: usize,
    pub expanded_rows: usize,
    pub new_rows: usize,
    pub updates: usize,
    pub total_added: i64,
    pub professionals_filled: usize,
}

/// Income written into the master
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesUpdate {
    pub id: String,
    pub document: String,
    pub date: NaiveDate,
    pub patient: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesOutcome {
    pub table: MasterTable,
    pub stats: SalesStats,
    pub updates: Vec<SalesUpdate>,
}

pub fn is_target_concept(concept: &str, filter: &str) -> bool {
    let filter = normalize_text(filter);
    !filter.is_empty() && normalize_text(concept).contains(&filter)
}

/// Merge `entries` into `table`; see the module docs for the rules
pub fn merge_sales(
    table: MasterTable,
    entries: &[SalesEntry],
    options: &SalesOptions,
    calendar: &WeekCalendar,
) -> SalesOutcome {
    let mut stats = SalesStats {
        received: entries.len(),
        ..SalesStats::default()
    };

    let mut groups: Vec<(DayKey, Vec<&SalesEntry>)> = Vec::new();
    let mut positions: HashMap<DayKey, usize> = HashMap::new();
    let mut seen: HashSet<(DayKey, String, i64)> = HashSet::new();

    for entry in entries {
        if !is_target_concept(&entry.concept, &options.concept_filter) {
            stats.other_concepts += 1;
            continue;
        }
        let Some(key) = entry.key() else {
            stats.unkeyed += 1;
            continue;
        };
        if options.apply_dedupe
            && !seen.insert((key.clone(), normalize_text(&entry.concept), entry.income))
        {
            stats.duplicates += 1;
            continue;
        }
        let position = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[position].1.push(entry);
    }
    stats.groups = groups.len();

    let mut table = table;
    let mut ids = table.id_sequence();
    let rows_by_key = table.rows_by_key();
    let records = table.records_mut();

    for (key, group) in &groups {
        match rows_by_key.get(key) {
            Some(rows) => {
                let surplus = group.len().saturating_sub(rows.len());
                if surplus == 0 || !options.expand_master {
                    continue;
                }
                let template = records[rows[0]].clone();
                for _ in 0..surplus {
                    records.push(template.clone_for_expansion(ids.next_id()));
                }
                stats.expanded_rows += surplus;
                debug!(
                    "{} on {}: added {} row(s) for sales entries",
                    key.document, key.day, surplus
                );
            }
            None if options.expand_master => {
                for entry in group {
                    records.push(MasterRecord::synthesized(
                        ids.next_id(),
                        key,
                        entry.patient.clone(),
                        calendar,
                    ));
                }
                stats.new_rows += group.len();
            }
            None => {}
        }
    }

    // Rows per key again, now including the rows added above
    let mut rows_by_key: HashMap<DayKey, Vec<usize>> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        if let Some(key) = record.key() {
            rows_by_key.entry(key).or_default().push(position);
        }
    }

    let mut updates = Vec::new();
    for (key, group) in &groups {
        let Some(rows) = rows_by_key.get(key) else {
            continue;
        };
        for (entry, &row) in group.iter().zip(rows) {
            let record = &mut records[row];

            let current = record.income(options.income_column).unwrap_or(0);
            if current == 0 {
                record.set_income(options.income_column, entry.income);
                stats.updates += 1;
                stats.total_added = stats.total_added.saturating_add(entry.income);
                updates.push(SalesUpdate {
                    id: record.id.clone(),
                    document: key.document.clone(),
                    date: key.day,
                    patient: entry.patient.clone(),
                    amount: entry.income,
                });
            }

            let has_professional = record
                .professional
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty());
            if let Some(doctor) = entry.doctor.as_deref().filter(|d| !d.trim().is_empty()) {
                if !has_professional {
                    record.professional = Some(doctor.trim().to_string());
                    stats.professionals_filled += 1;
                }
            }
        }
    }

    SalesOutcome {
        table,
        stats,
        updates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_target_concept() {
        assert!(is_target_concept("RADIOGRAFÍA PANORÁMICA", "radiografia"));
        assert!(is_target_concept("Toma de radiografia periapical", "Radiografía"));
        assert!(!is_target_concept("Limpieza", "radiografia"));
        assert!(!is_target_concept("Radiografia", ""));
    }
}
