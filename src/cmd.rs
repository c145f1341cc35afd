use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fs::File;
use std::process::{Command, Stdio};

const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

const SECRET_ASSIGNMENTS: [&str; 1] = ["PGPASSWORD="];

/// Render a command line for echoing, masking secret assignments
pub fn display_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let args_str: Vec<String> = args
        .iter()
        .map(|s| redact(&s.as_ref().to_string_lossy()))
        .collect();

    if args_str.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args_str.join(" "))
    }
}

fn redact(arg: &str) -> String {
    for prefix in SECRET_ASSIGNMENTS {
        if arg.starts_with(prefix) {
            return format!("{}***", prefix);
        }
    }
    arg.to_string()
}

pub fn run<I, S>(program: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();

    println!("{}> {}{}", CYAN, display_command(program, &args), RESET);

    let status = Command::new(program)
        .args(&args)
        .status()
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        anyhow::bail!("{} failed with exit code {:?}", program, status.code());
    }

    Ok(())
}

/// Run a program with extra environment variables, sending stdout to `output`
pub fn run_to_file<I, S>(
    program: &str,
    args: I,
    envs: &[(&str, &str)],
    output: File,
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();

    println!("{}> {}{}", CYAN, display_command(program, &args), RESET);

    let status = Command::new(program)
        .args(&args)
        .envs(envs.iter().copied())
        .stdout(Stdio::from(output))
        .status()
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        anyhow::bail!("{} failed with exit code {:?}", program, status.code());
    }

    Ok(())
}

/// Fail early if `program` is not on PATH
pub fn require(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .with_context(|| format!("{} not found in PATH", program))
}
