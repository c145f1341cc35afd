use anyhow::Result;
use std::env;

use sbs::cli::{self, InstallArgs};
use sbs::install::{self, InstallConfig, InstallError};
use sbs::logging::{self, LogTarget};

fn main() -> Result<()> {
    logging::init(&LogTarget::Stderr)?;

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match cli::parse_install_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprint!("{}", USAGE);
            std::process::exit(1);
        }
    };

    let config = build_config(args.clone())?;

    if !args.dry_run && !nix::unistd::geteuid().is_root() {
        tracing::warn!(
            "Not running as root, writing {} will likely fail",
            config.unit_path().display()
        );
    }

    let result = if args.dry_run {
        install::render_unit(&config).map(|(unit, _)| print!("{}", unit))
    } else {
        install::install(&config).map(|_| ())
    };

    match result {
        Ok(()) => Ok(()),
        Err(InstallError::KeyNotFound { dir }) => {
            tracing::debug!("No usable key pair in {}", dir.display());
            println!("ssh key not found");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn build_config(args: InstallArgs) -> Result<InstallConfig> {
    let app_dir = match args.app_dir {
        Some(dir) => dir,
        None => cli::default_app_dir()?,
    };

    let mut config = InstallConfig::new(args.user, app_dir);
    if let Some(home_root) = args.home_root {
        config.home_root = home_root;
    }
    if let Some(unit_path) = args.unit_path {
        config.unit_path = unit_path;
    }

    Ok(config)
}

const USAGE: &str = r#"sbs-install - Install the server-backup-simple systemd unit

Usage:
    sbs-install [OPTIONS] <user>

Renders dist/server-backup-simple.service with the user name and the
user's SSH private key, and writes it to the systemd unit directory.

Options:
    --app-dir <dir>      Installation root holding dist/ (default: executable directory)
    --home-root <dir>    Parent of home directories (default: /home)
    --unit-path <path>   Destination (default: /etc/systemd/system/server-backup-simple.service)
    --dry-run            Print the rendered unit instead of writing it
    -h, --help           Show this help message
"#;
