use std::fs;
use std::path::{Path, PathBuf};

use super::InstallError;

const PUBLIC_KEY_SUFFIX: &str = ".pub";

/// Find the private key in an SSH directory.
///
/// Public keys are the non-directory entries named `<stem>.pub`. The
/// lexicographically first one is selected and its private half (the same
/// path without `.pub`) must exist. A missing or unreadable directory, no
/// public key, or a missing private half are all `KeyNotFound`.
pub fn find_ssh_key(ssh_dir: &Path) -> Result<PathBuf, InstallError> {
    let not_found = || InstallError::KeyNotFound {
        dir: ssh_dir.to_path_buf(),
    };

    let entries = fs::read_dir(ssh_dir).map_err(|e| {
        tracing::debug!("Cannot read {}: {}", ssh_dir.display(), e);
        not_found()
    })?;

    let mut stems: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stem = name.strip_suffix(PUBLIC_KEY_SUFFIX)?;
            (!stem.is_empty()).then(|| stem.to_string())
        })
        .collect();
    stems.sort();

    let stem = stems.into_iter().next().ok_or_else(not_found)?;
    let private_key = ssh_dir.join(&stem);

    if !private_key.exists() {
        tracing::debug!(
            "Public key {}{} has no private half",
            stem,
            PUBLIC_KEY_SUFFIX
        );
        return Err(not_found());
    }

    Ok(private_key)
}
