use anyhow::{bail, Result};

use crate::cmd;
use crate::config::{AppConfig, BackupConfig};

use super::ssh_command;

/// rsync arguments for one folder pair
pub fn rsync_args(app: &AppConfig, from: &str, to: &str) -> Vec<String> {
    vec![
        "-avvHPS".into(),
        format!("--rsh={}", ssh_command(app)),
        from.into(),
        to.into(),
    ]
}

/// Sync every folder pair with rsync, continuing past failed pairs
pub fn backup_folders(app: &AppConfig, config: &BackupConfig) -> Result<()> {
    if config.folders.is_empty() {
        return Ok(());
    }

    cmd::require("rsync")?;

    let mut failed = 0;
    for pair in &config.folders {
        if let Err(e) = cmd::run("rsync", rsync_args(app, &pair.from, &pair.to)) {
            tracing::error!("rsync {} -> {} failed: {:#}", pair.from, pair.to, e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!(
            "{} of {} folder syncs failed",
            failed,
            config.folders.len()
        );
    }

    Ok(())
}
