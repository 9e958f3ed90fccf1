//! Run configuration, read from `mercadeo.toml`.
//!
//! Every key is optional; missing keys fall back to the defaults below. Dates
//! are quoted ISO strings:
//!
//! ```toml
//! expected_row_count = 412
//!
//! [paths]
//! base_dir = "/srv/mercadeo"
//!
//! [[weeks]]
//! label = "SEMANA1"
//! start = "2026-02-02"
//! end = "2026-02-07"
//!
//! [payments]
//! apply_anticipo_filter = true
//! voided_marker = "ANULADO"
//!
//! [sales]
//! income_column = "collected"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::calendar::{WeekBucket, WeekCalendar};
use crate::error::PipelineError;
use crate::model::columns;
use crate::reconcile::ReconcileOptions;
use crate::sales_report::SalesOptions;

/// Looked up in the working directory when no config path is given
pub const DEFAULT_CONFIG_FILE: &str = "mercadeo.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Every other path is relative to this directory
    pub base_dir: PathBuf,
    pub appointments_dir: PathBuf,
    pub payments_dir: PathBuf,
    pub sales_dir: PathBuf,
    pub output_dir: PathBuf,
    pub appointments_prefix: String,
    pub payments_prefix: String,
    pub sales_prefix: String,
    pub master_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            base_dir: PathBuf::from("."),
            appointments_dir: PathBuf::from("excel_dentos/01_citas_detallado"),
            payments_dir: PathBuf::from("excel_dentos/02_citas_con_pagos"),
            sales_dir: PathBuf::from("excel_dentos/03_informe_ventas"),
            output_dir: PathBuf::from("excel_generado"),
            appointments_prefix: "citas detallado".to_string(),
            payments_prefix: String::new(),
            sales_prefix: "informe de ventas".to_string(),
            master_prefix: "formato_odontologia".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub sheet_name: String,
    /// Apply the currency number format to the collected column in the payments pass
    pub currency_format: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            sheet_name: crate::model::SHEET_NAME.to_string(),
            currency_format: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub weeks: Vec<WeekBucket>,
    pub payments: ReconcileOptions,
    pub sales: SalesOptions,
    /// When set, a run fails if the final master does not have exactly this many rows
    pub expected_row_count: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            output: OutputConfig::default(),
            weeks: WeekCalendar::february_2026().buckets().to_vec(),
            payments: ReconcileOptions::default(),
            sales: SalesOptions::default(),
            expected_row_count: None,
        }
    }
}

impl Config {
    /// Load `path`, or `mercadeo.toml` from the working directory when it
    /// exists, or the built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    return Ok(Config::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.calendar()?;
        if config.output.sheet_name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("output.sheet_name is empty".to_string()).into());
        }
        Ok(config)
    }

    pub fn calendar(&self) -> Result<WeekCalendar, PipelineError> {
        WeekCalendar::new(self.weeks.clone())
    }

    /// Header of the column the payments pass formats as currency, if any
    pub fn currency_column(&self) -> Option<&'static str> {
        self.output.currency_format.then_some(columns::COLLECTED)
    }
}
