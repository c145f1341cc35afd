use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BackupConfig;
use crate::paths::DUMP_TIME_FORMAT;

/// Timestamp encoded in a dump file name, if it has one
pub fn parse_dump_time(file_name: &str) -> Option<NaiveDateTime> {
    let stem = file_name.strip_suffix(".tar")?;
    NaiveDateTime::parse_from_str(stem, DUMP_TIME_FORMAT).ok()
}

/// Delete expired dumps from `db_dest_folder`.
///
/// Every `.tar` file older than `days_before_delete` days, or whose name is
/// not a dump timestamp, is removed. A retention of zero days or less, or
/// an empty `db_dest_folder`, keeps everything. Returns the removed paths.
pub fn delete_old(config: &BackupConfig, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
    if config.db_dest_folder.is_empty() || config.days_before_delete <= 0 {
        return Ok(Vec::new());
    }

    let cutoff = match Duration::try_days(config.days_before_delete)
        .and_then(|window| now.checked_sub_signed(window))
    {
        Some(cutoff) => cutoff,
        None => return Ok(Vec::new()),
    };

    tracing::info!("Deleting old backups of {:?}", config.name);

    let dir = Path::new(&config.db_dest_folder);
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read dump folder {}", dir.display()))?;

    let mut removed = Vec::new();

    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_file || !name.ends_with(".tar") {
            continue;
        }

        let expired = match parse_dump_time(&name) {
            Some(taken) => taken < cutoff,
            None => true,
        };
        if !expired {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                removed.push(path);
            }
            Err(e) => tracing::warn!("Could not delete {}: {}", path.display(), e),
        }
    }

    removed.sort();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn config_for(dir: &Path, days: i64) -> BackupConfig {
        BackupConfig {
            name: "web".into(),
            db_dest_folder: dir.to_string_lossy().into_owned(),
            days_before_delete: days,
            ..Default::default()
        }
    }

    #[test]
    fn parses_dump_names() {
        assert_eq!(parse_dump_time("2024-03-01 02_00_00.tar"), Some(at(1, 2)));
        assert_eq!(parse_dump_time("2024-03-01 02_00_00.zip"), None);
        assert_eq!(parse_dump_time("manual.tar"), None);
    }

    #[test]
    fn deletes_expired_and_unparsable_dumps() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2024-03-01 02_00_00.tar",
            "2024-03-09 02_00_00.tar",
            "2024-03-10 02_00_00.tar",
            "manual.tar",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("old.tar")).unwrap();

        let removed = delete_old(&config_for(dir.path(), 7), at(10, 12)).unwrap();

        assert_eq!(
            removed,
            vec![
                dir.path().join("2024-03-01 02_00_00.tar"),
                dir.path().join("manual.tar"),
            ]
        );
        assert!(dir.path().join("2024-03-09 02_00_00.tar").exists());
        assert!(dir.path().join("2024-03-10 02_00_00.tar").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("old.tar").is_dir());
    }

    #[test]
    fn zero_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2020-01-01 00_00_00.tar"), "").unwrap();

        let removed = delete_old(&config_for(dir.path(), 0), at(10, 12)).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn config_without_dump_folder_prunes_nothing() {
        let config = BackupConfig {
            days_before_delete: 7,
            ..Default::default()
        };
        assert!(delete_old(&config, at(10, 12)).unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("absent"), 7);
        assert!(delete_old(&config, at(10, 12)).is_err());
    }

    #[test]
    fn huge_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2020-01-01 00_00_00.tar"), "").unwrap();

        let removed = delete_old(&config_for(dir.path(), i64::MAX), at(10, 12)).unwrap();
        assert!(removed.is_empty());
    }
}
