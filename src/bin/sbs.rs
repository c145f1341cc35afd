use anyhow::Result;
use std::env;

use sbs::backup;
use sbs::cli::{self, SbsCommand};
use sbs::config::{self, AppConfig};
use sbs::logging::{self, LogTarget};
use sbs::logtail;
use sbs::scheduler;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match cli::parse_sbs_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprint!("{}", USAGE);
            std::process::exit(1);
        }
    };

    if args.command == SbsCommand::Help {
        print!("{}", USAGE);
        return Ok(());
    }

    let app_dir = match args.app_dir {
        Some(dir) => dir,
        None => cli::default_app_dir()?,
    };
    let app = AppConfig::from_env(app_dir);

    let target = if args.log_to_file {
        LogTarget::File(app.log_file())
    } else {
        LogTarget::Stderr
    };
    logging::init(&target)?;

    match args.command {
        SbsCommand::Backup(name) => {
            let config = config::read_backup_config(&app, &name)?;
            backup::backup_all(&app, &config)
        }
        SbsCommand::Scheduler => {
            let configs = config::read_backup_configs(&app)?;
            scheduler::run_scheduler(&app, &configs)
        }
        SbsCommand::DeleteOld => delete_old(&app),
        SbsCommand::Log { lines } => {
            println!("{}", logtail::read_tail(&app.log_file(), lines)?);
            Ok(())
        }
        SbsCommand::Help => Ok(()),
    }
}

fn delete_old(app: &AppConfig) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let mut failed = false;

    for config in config::read_backup_configs(app)? {
        match backup::delete_old(&config, now) {
            Ok(removed) => println!("{}: deleted {} old dumps", config.name, removed.len()),
            Err(e) => {
                tracing::error!("Pruning {:?} failed: {:#}", config.name, e);
                failed = true;
            }
        }
    }

    if failed {
        anyhow::bail!("Some dump folders could not be pruned");
    }

    Ok(())
}

const USAGE: &str = r#"sbs - Backups of databases and files from servers

Usage:
    sbs [-l|--logfile] [--app-dir <dir>] <command>

Commands:
    sbs backup <name>     Run the backup described by config/<name>.json
    sbs scheduler         Back up every config at its backup_times, daily
    sbs delete-old        Delete dumps older than days_before_delete
    sbs log [-n <lines>]  Print the tail of the log file (default 10 lines)
    sbs help              Show this help message

Options:
    -l, --logfile         Log to <app-dir>/server-backup-simple.log instead of stderr
    --app-dir <dir>       Directory holding config/ (default: executable directory)

Environment:
    SBS_SSH_KEY           Identity file passed to ssh and rsync
    RUST_LOG              Log filter (default: info)
"#;
