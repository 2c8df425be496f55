//! Build command execution.

use std::env;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::{Error, Result};

/// Captured output of a completed build.
#[derive(Debug)]
pub struct BuildOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run the configured build command in `working_dir`.
///
/// The child gets a scrubbed environment: only the variables named in
/// `pass_env` survive from the parent. Build tools pick up per-user state
/// from the environment, and a release must not depend on whoever happens
/// to run it.
pub fn run_build(command: &str, working_dir: &Path, pass_env: &[String]) -> Result<BuildOutput> {
    info!(command, dir = %working_dir.display(), "Running build");

    let mut child = Command::new(command);
    child.current_dir(working_dir).env_clear();
    for name in pass_env {
        if let Ok(value) = env::var(name) {
            child.env(name, value);
        }
    }

    let output = child.output().map_err(|source| Error::BuildLaunch {
        command: command.to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    debug!(status = %output.status, "Build finished");

    if !output.status.success() {
        return Err(Error::BuildFailed {
            command: command.to_string(),
            status: output.status.to_string(),
            stdout,
            stderr,
        });
    }
    Ok(BuildOutput { stdout, stderr })
}
