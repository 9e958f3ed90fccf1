//! The three passes over the clinic exports, from file discovery to the
//! written master. Each pass is a thin shell around the pure functions in
//! [`crate::source`], [`crate::reconcile`] and [`crate::sales_report`].

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use log::info;

use crate::calendar::month_name;
use crate::config::Config;
use crate::excel::{WriteOptions, read_master, read_sheet, write_master};
use crate::model::{MasterTable, ReplaceSummary};
use crate::reconcile::{ReconcileStats, reconcile_payments};
use crate::report::{write_assignments, write_sales_updates};
use crate::sales_report::{SalesStats, merge_sales};
use crate::source::{load_appointments, load_payments, load_sales};
use crate::utils::{find_latest_xlsx, next_available_path, require_latest_xlsx};

#[derive(Debug, Clone)]
pub struct AppointmentsSummary {
    pub source: PathBuf,
    pub previous_master: Option<PathBuf>,
    pub output: PathBuf,
    pub loaded: usize,
    pub replaced: ReplaceSummary,
    pub total_rows: usize,
}

impl fmt::Display for AppointmentsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Appointments read from {}: {} in the configured weeks",
            self.source.display(),
            self.loaded
        )?;
        if let Some(previous) = &self.previous_master {
            writeln!(f, "Previous master: {}", previous.display())?;
        }
        writeln!(
            f,
            "Rows removed: {}, rows added: {}",
            self.replaced.removed, self.replaced.added
        )?;
        for (week, count) in &self.replaced.added_by_week {
            writeln!(f, "  {week}: {count}")?;
        }
        write!(
            f,
            "Master written to {} ({} rows)",
            self.output.display(),
            self.total_rows
        )
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsSummary {
    pub source: PathBuf,
    pub master: PathBuf,
    pub stats: ReconcileStats,
    pub total_rows: usize,
}

impl fmt::Display for PaymentsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = &self.stats.filter;
        writeln!(f, "Payments read from {}", self.source.display())?;
        writeln!(
            f,
            "Payments: {} received, {} voided, {} anticipo, {} duplicated, {} without document or date",
            filter.received, filter.voided, filter.anticipo, filter.duplicates, self.stats.unkeyed
        )?;
        writeln!(
            f,
            "Rows: {} cleared, {} added for extra payments, {} created for days without appointment",
            self.stats.cleared_rows, self.stats.expanded_rows, self.stats.new_rows
        )?;
        writeln!(
            f,
            "Payments assigned: {}, left unassigned: {}",
            self.stats.assigned, self.stats.unassigned
        )?;
        write!(
            f,
            "Master updated: {} ({} rows)",
            self.master.display(),
            self.total_rows
        )
    }
}

#[derive(Debug, Clone)]
pub struct SalesSummary {
    pub source: PathBuf,
    pub master: PathBuf,
    pub stats: SalesStats,
    pub total_rows: usize,
}

impl fmt::Display for SalesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sales report read from {}", self.source.display())?;
        writeln!(
            f,
            "Entries: {} received, {} other concepts, {} duplicated, {} without document or date",
            self.stats.received, self.stats.other_concepts, self.stats.duplicates, self.stats.unkeyed
        )?;
        writeln!(
            f,
            "Rows: {} added, {} created for days without appointment",
            self.stats.expanded_rows, self.stats.new_rows
        )?;
        writeln!(
            f,
            "Values written: {} (total {}), professionals filled: {}",
            self.stats.updates, self.stats.total_added, self.stats.professionals_filled
        )?;
        write!(
            f,
            "Master updated: {} ({} rows)",
            self.master.display(),
            self.total_rows
        )
    }
}

fn output_dir(config: &Config) -> PathBuf {
    config.paths.resolve(&config.paths.output_dir)
}

fn latest_master(config: &Config) -> Result<PathBuf> {
    let dir = output_dir(config);
    Ok(require_latest_xlsx(&dir, &config.paths.master_prefix)?)
}

fn write_table(table: &MasterTable, path: &Path, config: &Config, currency: bool) -> Result<()> {
    let options = WriteOptions {
        sheet_name: config.output.sheet_name.clone(),
        currency_column: if currency {
            config.currency_column().map(str::to_string)
        } else {
            None
        },
    };
    write_master(table, path, &options)
        .with_context(|| format!("Failed to write master {}", path.display()))
}

/// Pass 01: rebuild the configured weeks of the master from the newest
/// appointments export and save it as a new `<master_prefix>_<MES>` file.
/// MES is the month of the first configured week, so a calendar that spans
/// two months is named after the month it starts in, whatever the export holds.
pub fn run_appointments(config: &Config) -> Result<AppointmentsSummary> {
    let calendar = config.calendar()?;
    let source_dir = config.paths.resolve(&config.paths.appointments_dir);
    let source = require_latest_xlsx(&source_dir, &config.paths.appointments_prefix)?;
    info!("Reading appointments from {}", source.display());

    let sheet = read_sheet(&source, None)?;
    let rows = load_appointments(&sheet, &calendar)?;
    let loaded = rows.len();

    let out_dir = output_dir(config);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let previous_master = find_latest_xlsx(&out_dir, &config.paths.master_prefix)?;
    let mut table = match &previous_master {
        Some(path) => read_master(path, &config.output.sheet_name)?,
        None => MasterTable::default(),
    };

    let replaced = table.replace_buckets(&calendar, rows);
    table.check_row_count(config.expected_row_count)?;

    let month = calendar
        .buckets()
        .first()
        .and_then(|bucket| month_name(bucket.start.month()))
        .unwrap_or("SIN_MES");
    let output = next_available_path(
        &out_dir,
        &format!("{}_{}", config.paths.master_prefix, month),
    );
    write_table(&table, &output, config, false)?;

    Ok(AppointmentsSummary {
        source,
        previous_master,
        output,
        loaded,
        replaced,
        total_rows: table.len(),
    })
}

/// Pass 02: reconcile the newest payments export into the newest master,
/// overwriting it
pub fn run_payments(config: &Config, audit_csv: Option<&Path>) -> Result<PaymentsSummary> {
    let calendar = config.calendar()?;
    let master = latest_master(config)?;
    let source_dir = config.paths.resolve(&config.paths.payments_dir);
    let source = require_latest_xlsx(&source_dir, &config.paths.payments_prefix)?;
    info!("Reading payments from {}", source.display());

    let sheet = read_sheet(&source, None)?;
    let payments = load_payments(&sheet, &config.payments.voided_marker)?;
    let table = read_master(&master, &config.output.sheet_name)?;

    let outcome = reconcile_payments(table, &payments, &config.payments, &calendar);
    outcome.table.check_row_count(config.expected_row_count)?;
    write_table(&outcome.table, &master, config, true)?;

    if let Some(path) = audit_csv {
        write_assignments(path, &outcome.assignments)?;
    }

    Ok(PaymentsSummary {
        source,
        master,
        stats: outcome.stats,
        total_rows: outcome.table.len(),
    })
}

/// Pass 03: merge the newest sales report into the newest master,
/// overwriting it
pub fn run_sales(config: &Config, audit_csv: Option<&Path>) -> Result<SalesSummary> {
    let calendar = config.calendar()?;
    let master = latest_master(config)?;
    let source_dir = config.paths.resolve(&config.paths.sales_dir);
    let source = require_latest_xlsx(&source_dir, &config.paths.sales_prefix)?;
    info!("Reading sales report from {}", source.display());

    let sheet = read_sheet(&source, None)?;
    let entries = load_sales(&sheet)?;
    let table = read_master(&master, &config.output.sheet_name)?;

    let outcome = merge_sales(table, &entries, &config.sales, &calendar);
    outcome.table.check_row_count(config.expected_row_count)?;
    write_table(&outcome.table, &master, config, false)?;

    if let Some(path) = audit_csv {
        write_sales_updates(path, &outcome.updates)?;
    }

    Ok(SalesSummary {
        source,
        master,
        stats: outcome.stats,
        total_rows: outcome.table.len(),
    })
}
