use anyhow::{bail, Result};

use crate::cmd;
use crate::config::BackupConfig;

/// Mirror every rclone pair, continuing past failed pairs
pub fn rclone_sync(config: &BackupConfig) -> Result<()> {
    if config.rclone_sync.is_empty() {
        return Ok(());
    }

    tracing::info!("Running rclone sync for {:?}", config.name);
    cmd::require("rclone")?;

    let mut failed = 0;
    for pair in &config.rclone_sync {
        if let Err(e) = cmd::run("rclone", ["sync", pair.from.as_str(), pair.to.as_str()]) {
            tracing::error!("rclone sync {} -> {} failed: {:#}", pair.from, pair.to, e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!(
            "{} of {} rclone syncs failed",
            failed,
            config.rclone_sync.len()
        );
    }

    Ok(())
}
