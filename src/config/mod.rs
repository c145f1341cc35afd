mod schema;

pub use schema::*;

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::{CONFIG_DIR, LOG_FILE, SSH_KEY_ENV};

const CONFIG_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Application-wide settings, passed explicitly to everything that needs them
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `config/`, `dist/` and the log file
    pub app_dir: PathBuf,
    /// Identity file for ssh and rsync, if any
    pub ssh_key: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            ssh_key: None,
        }
    }

    /// Like `new`, with the SSH identity taken from `SBS_SSH_KEY`
    pub fn from_env(app_dir: impl Into<PathBuf>) -> Self {
        let ssh_key = env::var_os(SSH_KEY_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            app_dir: app_dir.into(),
            ssh_key,
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.app_dir.join(CONFIG_DIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.app_dir.join(LOG_FILE)
    }
}

/// Load the backup configuration called `name`
pub fn read_backup_config(app: &AppConfig, name: &str) -> Result<BackupConfig> {
    let dir = app.config_dir();

    for ext in CONFIG_EXTENSIONS {
        let path = dir.join(format!("{}.{}", name, ext));
        if path.is_file() {
            return load_file(&path);
        }
    }

    bail!(
        "Backup config '{}' not found in {} (expected {}.json, {}.yaml or {}.yml)",
        name,
        dir.display(),
        name,
        name,
        name
    );
}

/// Load every backup configuration in the config directory, sorted by file name
pub fn read_backup_configs(app: &AppConfig) -> Result<Vec<BackupConfig>> {
    let dir = app.config_dir();
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("Failed to read config directory: {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_config_extension(path))
        .collect();
    paths.sort();

    paths.iter().map(|path| load_file(path)).collect()
}

fn has_config_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONFIG_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn load_file(path: &Path) -> Result<BackupConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup config: {}", path.display()))?;

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&content),
        _ => parse_yaml(&content),
    };

    parsed.with_context(|| format!("Invalid backup config: {}", path.display()))
}

fn parse_json(content: &str) -> Result<BackupConfig> {
    serde_json::from_str(content).context("Failed to parse JSON backup config")
}

fn parse_yaml(content: &str) -> Result<BackupConfig> {
    serde_yaml::from_str(content).context("Failed to parse YAML backup config")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_configs(files: &[(&str, &str)]) -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        for (name, content) in files {
            fs::write(config_dir.join(name), content).unwrap();
        }
        let app = AppConfig::new(dir.path());
        (dir, app)
    }

    #[test]
    fn test_full_json_config() {
        let json = r#"{
            "name": "web",
            "folders": [{"from": "web:/srv/www", "to": "/backup/www"}],
            "db_ssh": "admin@web",
            "db_dest_folder": "/backup/db",
            "pg_user": "postgres",
            "pg_password": "secret",
            "pg_host": "localhost",
            "pg_port": "5432",
            "pg_db": "app",
            "backup_times": ["02:30", "14:00"],
            "backup_at_startup": true,
            "days_before_delete": 7,
            "rclone_sync": [{"from": "/backup", "to": "remote:backup"}]
        }"#;
        let config = parse_json(json).unwrap();

        assert_eq!(config.name, "web");
        assert_eq!(
            config.folders,
            vec![SyncPair {
                from: "web:/srv/www".into(),
                to: "/backup/www".into()
            }]
        );
        assert_eq!(config.db_ssh, "admin@web");
        assert_eq!(config.backup_times, vec!["02:30", "14:00"]);
        assert!(config.backup_at_startup);
        assert_eq!(config.days_before_delete, 7);
        assert_eq!(config.rclone_sync.len(), 1);
        assert!(config.has_database());
    }

    #[test]
    fn test_minimal_yaml_config() {
        let config = parse_yaml("name: files-only\n").unwrap();
        assert_eq!(config.name, "files-only");
        assert!(config.folders.is_empty());
        assert!(!config.backup_at_startup);
        assert!(!config.has_database());
    }

    #[test]
    fn test_read_named_config() {
        let (_dir, app) = app_with_configs(&[("web.json", r#"{"name": "web"}"#)]);
        let config = read_backup_config(&app, "web").unwrap();
        assert_eq!(config.name, "web");
    }

    #[test]
    fn test_read_named_yaml_config() {
        let (_dir, app) = app_with_configs(&[("db.yml", "name: db\npg_db: app\n")]);
        let config = read_backup_config(&app, "db").unwrap();
        assert_eq!(config.pg_db, "app");
    }

    #[test]
    fn test_missing_named_config() {
        let (_dir, app) = app_with_configs(&[]);
        let err = read_backup_config(&app, "nope").unwrap_err();
        assert!(err.to_string().contains("'nope' not found"));
    }

    #[test]
    fn test_read_all_configs_sorted_and_filtered() {
        let (_dir, app) = app_with_configs(&[
            ("b.yaml", "name: b\n"),
            ("a.json", r#"{"name": "a"}"#),
            ("notes.txt", "not a config"),
        ]);
        let names: Vec<String> = read_backup_configs(&app)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_config_names_file() {
        let (_dir, app) = app_with_configs(&[("broken.json", "{")]);
        let err = read_backup_configs(&app).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_app_paths() {
        let app = AppConfig::new("/opt/sbs");
        assert_eq!(app.config_dir(), PathBuf::from("/opt/sbs/config"));
        assert_eq!(
            app.log_file(),
            PathBuf::from("/opt/sbs/server-backup-simple.log")
        );
    }
}
