//! systemd unit installation
//!
//! Locates the user's SSH private key, renders the unit template with the
//! user name and key path, and writes the result into the unit directory.

mod config;
mod key;
mod template;

pub use config::InstallConfig;
pub use key::find_ssh_key;
pub use template::{render, SSHKEY_TOKEN, USER_TOKEN};

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid user name {0:?}")]
    InvalidUser(String),

    #[error("ssh key not found")]
    KeyNotFound { dir: PathBuf },

    #[error("Failed to read unit template {}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub unit_path: PathBuf,
    pub ssh_key: PathBuf,
}

/// Reject names that cannot be a single path component under the home root
pub fn validate_user(user: &str) -> Result<(), InstallError> {
    if user.is_empty() || user == "." || user == ".." || user.contains(['/', '\0']) {
        return Err(InstallError::InvalidUser(user.to_string()));
    }
    Ok(())
}

/// Locate the key and render the unit without writing anything
pub fn render_unit(config: &InstallConfig) -> Result<(String, PathBuf), InstallError> {
    validate_user(&config.user)?;

    let ssh_key = find_ssh_key(&config.ssh_dir())?;
    tracing::debug!("Using SSH key {}", ssh_key.display());

    let template_path = config.template_path();
    let template =
        fs::read_to_string(&template_path).map_err(|source| InstallError::TemplateRead {
            path: template_path.clone(),
            source,
        })?;

    Ok((render(&template, &config.user, &ssh_key), ssh_key))
}

/// Render the unit and write it to `config.unit_path`, replacing any existing file
pub fn install(config: &InstallConfig) -> Result<Installed, InstallError> {
    let (unit, ssh_key) = render_unit(config)?;

    let unit_path = config.unit_path().to_path_buf();
    write_atomic(&unit_path, &unit).map_err(|source| InstallError::Write {
        path: unit_path.clone(),
        source,
    })?;

    tracing::info!("Installed {}", unit_path.display());

    Ok(Installed { unit_path, ssh_key })
}

/// Write to a temp file next to `dest`, then rename it over `dest`.
///
/// The temp file is removed if anything fails before the rename.
fn write_atomic(dest: &Path, contents: &str) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".sbs-unit")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))?;
    tmp.persist(dest).map_err(|e| e.error)?;

    Ok(())
}
