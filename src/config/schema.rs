use serde::{Deserialize, Serialize};

/// One backup target, loaded from `config/<name>.json` (or `.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Display name used in log lines
    #[serde(default)]
    pub name: String,

    /// Folder pairs synced with rsync
    #[serde(default)]
    pub folders: Vec<SyncPair>,

    /// ssh destination for pg_dump; empty runs pg_dump locally
    #[serde(default)]
    pub db_ssh: String,

    /// Directory receiving dump files
    #[serde(default)]
    pub db_dest_folder: String,

    /// Dumping from inside a container is not supported
    #[serde(default)]
    pub db_container_name: String,

    #[serde(default)]
    pub pg_user: String,

    #[serde(default)]
    pub pg_password: String,

    #[serde(default)]
    pub pg_host: String,

    #[serde(default)]
    pub pg_port: String,

    /// Database name; empty skips the database step
    #[serde(default)]
    pub pg_db: String,

    /// Daily trigger times, "HH:MM" or "HH:MM:SS"
    #[serde(default)]
    pub backup_times: Vec<String>,

    /// Run once when the scheduler starts
    #[serde(default)]
    pub backup_at_startup: bool,

    /// Dumps older than this many days are pruned
    #[serde(default)]
    pub days_before_delete: i64,

    /// Pairs mirrored with `rclone sync`
    #[serde(default)]
    pub rclone_sync: Vec<SyncPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPair {
    pub from: String,
    pub to: String,
}

impl BackupConfig {
    pub fn has_database(&self) -> bool {
        !self.pg_db.is_empty()
    }
}
