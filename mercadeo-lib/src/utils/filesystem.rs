use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ERRORS_LOG_FILE;
use crate::error::PipelineError;
use crate::utils::get_utc_iso_datetime;

/// Centralized function to write error messages to the errors log file
///
/// # Arguments
/// * `error_type` - A description of the error type/category (e.g., "Payments Reconciliation Error")
/// * `error_message` - The actual error message content
pub fn write_error_to_log(error_type: &str, error_message: &str) {
    let timestamp = get_utc_iso_datetime();
    let log_entry = format!("\n[{}] {}:\n{}\n", timestamp, error_type, error_message);

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ERRORS_LOG_FILE)
    {
        let _ = writeln!(file, "{}", log_entry);
    }
}

/// Most recently modified `.xlsx` file in `dir` whose name starts with `prefix`
/// (case-insensitive). Returns `Ok(None)` when the directory holds no candidate.
pub fn find_latest_xlsx(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir)
        .map_err(|_| PipelineError::DirectoryNotFound(dir.to_path_buf()))?;

    let prefix = prefix.to_lowercase();
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let name = name.to_lowercase();
        // Excel lock files ("~$book.xlsx") are not workbooks
        if !name.ends_with(".xlsx") || name.starts_with("~$") || !name.starts_with(&prefix) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        let is_newer = match &latest {
            Some((current, _)) => modified > *current,
            None => true,
        };
        if is_newer {
            latest = Some((modified, path));
        }
    }

    return Ok(latest.map(|(_, path)| path));
}

/// Like [`find_latest_xlsx`] but a missing file is an error
pub fn require_latest_xlsx(dir: &Path, prefix: &str) -> Result<PathBuf, PipelineError> {
    find_latest_xlsx(dir, prefix)?.ok_or_else(|| PipelineError::FileNotFound {
        dir: dir.to_path_buf(),
        prefix: prefix.to_string(),
    })
}

/// `dir/base.xlsx`, or the first free `dir/base.N.xlsx` when it already exists
pub fn next_available_path(dir: &Path, base_name: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{base_name}.xlsx"));
    let mut version = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{base_name}.{version}.xlsx"));
        version += 1;
    }
    return candidate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_latest_xlsx_filters_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Citas Detallado febrero.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("otro reporte.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("citas detallado.csv"), b"x").unwrap();
        fs::write(dir.path().join("~$citas detallado.xlsx"), b"x").unwrap();

        let found = find_latest_xlsx(dir.path(), "citas detallado").unwrap().unwrap();
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "Citas Detallado febrero.xlsx"
        );
    }

    #[test]
    fn test_find_latest_xlsx_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            find_latest_xlsx(&missing, ""),
            Err(PipelineError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_require_latest_xlsx_reports_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let err = require_latest_xlsx(dir.path(), "informe de ventas").unwrap_err();
        assert!(err.to_string().contains("informe de ventas"));
    }

    #[test]
    fn test_next_available_path_versions() {
        let dir = tempfile::tempdir().unwrap();
        let first = next_available_path(dir.path(), "formato_odontologia_FEBRERO");
        assert!(first.ends_with("formato_odontologia_FEBRERO.xlsx"));

        fs::write(&first, b"x").unwrap();
        let second = next_available_path(dir.path(), "formato_odontologia_FEBRERO");
        assert!(second.ends_with("formato_odontologia_FEBRERO.1.xlsx"));
    }
}
