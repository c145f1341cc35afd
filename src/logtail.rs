use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Last `n` lines of a file, joined with newlines
pub fn read_tail(path: &Path, n: usize) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open log file {}", path.display()))?;

    let mut lines = VecDeque::with_capacity(n);
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            continue;
        }
        if lines.len() == n {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    Ok(Vec::from(lines).join("\n"))
}
