use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::cmd;
use crate::config::{AppConfig, BackupConfig};
use crate::paths::DUMP_TIME_FORMAT;

/// A pg_dump invocation, local or over ssh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpCommand {
    pub program: &'static str,
    pub args: Vec<String>,
    pub envs: Vec<(&'static str, String)>,
}

/// File name of a dump taken at `now`
pub fn dump_file_name(now: NaiveDateTime) -> String {
    format!("{}.tar", now.format(DUMP_TIME_FORMAT))
}

fn pg_dump_args(config: &BackupConfig) -> Vec<String> {
    [
        "-d",
        config.pg_db.as_str(),
        "-U",
        config.pg_user.as_str(),
        "-p",
        config.pg_port.as_str(),
        "-h",
        config.pg_host.as_str(),
        "-O",
        "-x",
        "-Ft",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Quote a value for the remote shell ssh hands the command to
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn dump_command(app: &AppConfig, config: &BackupConfig) -> DumpCommand {
    if config.db_ssh.is_empty() {
        return DumpCommand {
            program: "pg_dump",
            args: pg_dump_args(config),
            envs: vec![("PGPASSWORD", config.pg_password.clone())],
        };
    }

    let mut args = Vec::new();
    if let Some(key) = &app.ssh_key {
        args.push("-i".to_string());
        args.push(key.to_string_lossy().into_owned());
    }
    args.push(config.db_ssh.clone());
    args.push(format!("PGPASSWORD={}", shell_quote(&config.pg_password)));
    args.push("pg_dump".into());
    args.extend(pg_dump_args(config).iter().map(|arg| shell_quote(arg)));

    DumpCommand {
        program: "ssh",
        args,
        envs: Vec::new(),
    }
}

/// Dump the configured database into `db_dest_folder`.
///
/// Returns the dump path, or `None` when the config has no database.
pub fn backup_database(
    app: &AppConfig,
    config: &BackupConfig,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>> {
    if !config.db_container_name.is_empty() {
        bail!(
            "Dumping from container '{}' is not supported",
            config.db_container_name
        );
    }

    if !config.has_database() {
        return Ok(None);
    }

    if config.db_dest_folder.is_empty() {
        bail!("db_dest_folder must be set to dump database '{}'", config.pg_db);
    }

    let dest_dir = Path::new(&config.db_dest_folder);
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

    let command = dump_command(app, config);
    cmd::require(command.program)?;

    let dump_path = dest_dir.join(dump_file_name(now));
    let file = File::create(&dump_path)
        .with_context(|| format!("Failed to create dump file {}", dump_path.display()))?;

    let envs: Vec<(&str, &str)> = command
        .envs
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .collect();

    if let Err(e) = cmd::run_to_file(command.program, &command.args, &envs, file) {
        if let Err(rm) = fs::remove_file(&dump_path) {
            tracing::warn!(
                "Failed to remove partial dump {}: {}",
                dump_path.display(),
                rm
            );
        }
        return Err(e);
    }

    tracing::info!("Database dumped to {}", dump_path.display());

    Ok(Some(dump_path))
}
