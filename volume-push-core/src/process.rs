//! Shared runner for external tool invocations.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::ToolError;

/// One external command: `program subcommand args...` run in `cwd`.
pub(crate) struct Invocation<'a> {
    pub program: &'a Path,
    pub subcommand: &'static str,
    pub args: Vec<OsString>,
    pub cwd: &'a Path,
    /// Scrubbed from logged argv and captured output.
    pub secret: Option<&'a str>,
    pub env: &'a [(&'a str, &'a str)],
}

impl Invocation<'_> {
    fn redact(&self, text: &str) -> String {
        match self.secret {
            Some(secret) if !secret.is_empty() => text.replace(secret, "***"),
            _ => text.to_string(),
        }
    }

    fn logged_args(&self) -> String {
        let joined = self
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        self.redact(&joined)
    }
}

/// Runs the invocation to completion, capturing stdout and stderr. A
/// non-zero exit becomes [`ToolError::Failed`] carrying the tool's output.
pub(crate) async fn run(invocation: Invocation<'_>) -> Result<Output, ToolError> {
    let program = invocation.program.display().to_string();
    debug!(
        program = %program,
        subcommand = invocation.subcommand,
        args = %invocation.logged_args(),
        cwd = %invocation.cwd.display(),
        "Spawning external tool"
    );

    let mut cmd = Command::new(invocation.program);
    cmd.arg(invocation.subcommand)
        .args(&invocation.args)
        .current_dir(invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in invocation.env {
        cmd.env(key, value);
    }

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) => {
            error!(
                error = ?e,
                program = %program,
                subcommand = invocation.subcommand,
                "Failed to launch external tool"
            );
            return Err(ToolError::Launch {
                program,
                subcommand: invocation.subcommand.to_string(),
                source: e,
            });
        }
    };

    if !output.status.success() {
        let captured = combined_output(&output);
        let captured = invocation.redact(captured.trim());
        error!(
            program = %program,
            subcommand = invocation.subcommand,
            code = ?output.status.code(),
            output = %captured,
            "External tool exited with non-zero status"
        );
        return Err(ToolError::Failed {
            program,
            subcommand: invocation.subcommand.to_string(),
            code: output.status.code(),
            output: captured,
        });
    }

    info!(
        program = %program,
        subcommand = invocation.subcommand,
        "External tool succeeded"
    );
    Ok(output)
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => stdout.into_owned(),
        (true, false) => stderr.into_owned(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr),
    }
}
