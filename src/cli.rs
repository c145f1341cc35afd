//! Command-line parsing for `sbs-install` and `sbs`

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

const DEFAULT_LOG_LINES: usize = 10;

/// Arguments of `sbs-install`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallArgs {
    pub user: String,
    pub app_dir: Option<PathBuf>,
    pub home_root: Option<PathBuf>,
    pub unit_path: Option<PathBuf>,
    pub dry_run: bool,
}

/// Arguments of `sbs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbsArgs {
    pub log_to_file: bool,
    pub app_dir: Option<PathBuf>,
    pub command: SbsCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SbsCommand {
    Backup(String),
    Scheduler,
    DeleteOld,
    Log { lines: usize },
    Help,
}

fn flag_value<'a>(
    flag: &str,
    iter: &mut impl Iterator<Item = &'a String>,
) -> Result<&'a String> {
    match iter.next() {
        Some(value) => Ok(value),
        None => bail!("{} requires a value", flag),
    }
}

/// Parse `sbs-install` arguments (without the program name).
///
/// Returns `None` when help was requested.
pub fn parse_install_args(args: &[String]) -> Result<Option<InstallArgs>> {
    let mut parsed = InstallArgs::default();
    let mut user = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--app-dir" => parsed.app_dir = Some(flag_value(arg, &mut iter)?.into()),
            "--home-root" => parsed.home_root = Some(flag_value(arg, &mut iter)?.into()),
            "--unit-path" => parsed.unit_path = Some(flag_value(arg, &mut iter)?.into()),
            "--dry-run" => parsed.dry_run = true,
            s if s.starts_with('-') => bail!("Unknown option: {}", s),
            s => {
                if user.is_some() {
                    bail!("Unexpected argument: {}", s);
                }
                user = Some(s.to_string());
            }
        }
    }

    parsed.user = match user {
        Some(user) => user,
        None => bail!("A user name is required"),
    };

    Ok(Some(parsed))
}

/// Parse `sbs` arguments (without the program name)
pub fn parse_sbs_args(args: &[String]) -> Result<SbsArgs> {
    let mut log_to_file = false;
    let mut app_dir = None;
    let mut iter = args.iter();

    let command = loop {
        let Some(arg) = iter.next() else {
            break SbsCommand::Help;
        };

        match arg.as_str() {
            "-l" | "--logfile" => log_to_file = true,
            "--app-dir" => app_dir = Some(PathBuf::from(flag_value(arg, &mut iter)?)),
            "help" | "-h" | "--help" => break SbsCommand::Help,
            "backup" => match iter.next() {
                Some(name) => break SbsCommand::Backup(name.clone()),
                None => bail!("backup requires a config name"),
            },
            "scheduler" => break SbsCommand::Scheduler,
            "delete-old" => break SbsCommand::DeleteOld,
            "log" => {
                let mut lines = DEFAULT_LOG_LINES;
                while let Some(opt) = iter.next() {
                    match opt.as_str() {
                        "-n" | "--lines" => {
                            let value = flag_value(opt, &mut iter)?;
                            lines = value
                                .parse()
                                .with_context(|| format!("Invalid line count: {}", value))?;
                        }
                        other => bail!("Unknown log option: {}", other),
                    }
                }
                break SbsCommand::Log { lines };
            }
            other => bail!("Unknown command: {}", other),
        }
    };

    if let Some(extra) = iter.next() {
        bail!("Unexpected argument: {}", extra);
    }

    Ok(SbsArgs {
        log_to_file,
        app_dir,
        command,
    })
}

/// Directory containing the running executable, symlinks resolved
pub fn default_app_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("Failed to locate the running executable")?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);

    match exe.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => bail!("Executable {} has no parent directory", exe.display()),
    }
}
