use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use log::info;

use crate::error::{Error, Result};

/// Runs a benchmark executable with no arguments and returns its stdout.
///
/// Blocks until the process exits; there is no timeout. The captured output
/// is echoed line by line at info level. Stderr is passed through.
///
/// # Errors
///
/// * [`Error::Execution`] if `path` does not exist or cannot be spawned
/// * [`Error::ExitStatus`] if the process exits unsuccessfully
pub fn run_executable(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::Execution {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "executable not found"),
        });
    }

    info!("Running: {}", path.display());
    let output = Command::new(path)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| Error::Execution {
            path: path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::ExitStatus {
            path: path.to_path_buf(),
            status: output.status,
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    for line in text.lines() {
        info!("{}", line);
    }
    Ok(text)
}
