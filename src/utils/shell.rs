// src/utils/shell.rs
use std::process::{Command, Output, Stdio};
use anyhow::{Result, Context};
use tracing::{debug, trace, warn};

/// Run a program to completion and capture its output
pub fn execute_program(program: &str, args: &[String]) -> Result<Output> {
    debug!("Executing program: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .context(format!("Failed to execute program: {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("Program failed: {} ({})\nStderr: {}", program, output.status, stderr.trim());
    } else {
        trace!("Program succeeded: {}", program);
    }

    Ok(output)
}
