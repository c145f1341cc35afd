use std::path::{Path, PathBuf};

use crate::paths::{HOME_ROOT, SSH_DIR, UNIT_DEST, UNIT_TEMPLATE};

#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Account the unit runs as and whose SSH key is used
    pub user: String,
    /// Installation root holding `dist/`
    pub app_dir: PathBuf,
    /// Parent of user home directories
    pub home_root: PathBuf,
    /// Where the rendered unit is written
    pub unit_path: PathBuf,
}

impl InstallConfig {
    pub fn new(user: impl Into<String>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            app_dir: app_dir.into(),
            home_root: PathBuf::from(HOME_ROOT),
            unit_path: PathBuf::from(UNIT_DEST),
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.app_dir.join(UNIT_TEMPLATE)
    }

    pub fn ssh_dir(&self) -> PathBuf {
        self.home_root.join(&self.user).join(SSH_DIR)
    }

    pub fn unit_path(&self) -> &Path {
        &self.unit_path
    }
}
