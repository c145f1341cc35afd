//! Backup jobs: rsync folders, pg_dump databases, rclone mirrors, and
//! pruning of old dumps.

mod database;
mod folders;
mod rclone;
mod retention;

pub use database::{backup_database, dump_command, dump_file_name, DumpCommand};
pub use folders::{backup_folders, rsync_args};
pub use rclone::rclone_sync;
pub use retention::{delete_old, parse_dump_time};

use anyhow::{anyhow, bail, Result};
use std::thread;

use crate::config::{AppConfig, BackupConfig};

/// ssh command line used by rsync and remote dumps
pub fn ssh_command(app: &AppConfig) -> String {
    match &app.ssh_key {
        Some(key) => format!("ssh -i {}", key.display()),
        None => "ssh".to_string(),
    }
}

/// Run one backup: database and folders concurrently, then rclone.
///
/// Every step runs even if an earlier one failed; the error lists the
/// failed steps.
pub fn backup_all(app: &AppConfig, config: &BackupConfig) -> Result<()> {
    let (database, folders) = thread::scope(|s| {
        let database = s.spawn(|| {
            tracing::info!("Starting database backup of {:?}", config.name);
            let now = chrono::Local::now().naive_local();
            let result = backup_database(app, config, now).map(|_| ());
            tracing::info!("Database backup of {:?} finished", config.name);
            result
        });

        let folders = s.spawn(|| {
            tracing::info!("Starting folder sync of {:?}", config.name);
            let result = backup_folders(app, config);
            tracing::info!("Folder sync of {:?} finished", config.name);
            result
        });

        (
            database
                .join()
                .unwrap_or_else(|_| Err(anyhow!("database backup panicked"))),
            folders
                .join()
                .unwrap_or_else(|_| Err(anyhow!("folder sync panicked"))),
        )
    });

    let rclone = rclone_sync(config);

    let mut failed = Vec::new();
    for (step, result) in [("database", database), ("folders", folders), ("rclone", rclone)] {
        if let Err(e) = result {
            tracing::error!("{} step of {:?} failed: {:#}", step, config.name, e);
            failed.push(step);
        }
    }

    if !failed.is_empty() {
        bail!("Backup of {:?} failed: {}", config.name, failed.join(", "));
    }

    tracing::info!("Backup of {:?} complete", config.name);
    Ok(())
}

/// Prune old dumps, then back up; errors are logged, not returned
pub fn prune_and_backup(app: &AppConfig, config: &BackupConfig) {
    let now = chrono::Local::now().naive_local();
    if let Err(e) = delete_old(config, now) {
        tracing::error!("Pruning {:?} failed: {:#}", config.name, e);
    }
    if let Err(e) = backup_all(app, config) {
        tracing::error!("{:#}", e);
    }
}
