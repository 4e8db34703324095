//! Test execution adapter.
//!
//! Runs the test command inside the workspace and hands back whatever it
//! printed. Pass/fail is never decided here; exit codes, launch failures and
//! timeouts are folded into the text for the judge to read.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[async_trait]
pub trait TestRunner {
    /// Run `test_file` with `workdir` as the current directory and return
    /// stdout followed by stderr.
    async fn run(&self, workdir: &Path, test_file: &str) -> String;
}

pub type DynTestRunner = dyn TestRunner + Send + Sync;

/// Notes the runner folds into the output when the command did not finish cleanly.
pub const LAUNCH_FAILURE_NOTE: &str = "[failed to launch";
pub const COLLECT_FAILURE_NOTE: &str = "[failed to collect output";
pub const TIMEOUT_NOTE: &str = "[test command timed out after";
pub const SIGNAL_NOTE: &str = "[terminated by signal]";
pub const EXIT_STATUS_NOTE: &str = "[exit status: ";

/// Runs an external command such as `pytest <test_file>`.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTestRunner {
    pub fn new(command: &[String], timeout: Duration) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => ("pytest".to_string(), Vec::new()),
        };
        Self {
            program,
            args,
            timeout,
        }
    }

    fn render_command(&self, test_file: &str) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(test_file);
        parts.join(" ")
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run(&self, workdir: &Path, test_file: &str) -> String {
        let command_line = self.render_command(test_file);
        info!(command = %command_line, workdir = %workdir.display(), "executing tests");

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(test_file)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(err) => {
                warn!(command = %command_line, error = %err, "test command could not be launched");
                return format!("{LAUNCH_FAILURE_NOTE} `{command_line}`: {err}]\n");
            }
        };

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return format!("{COLLECT_FAILURE_NOTE} of `{command_line}`: {err}]\n");
            }
            Err(_) => {
                warn!(command = %command_line, timeout_secs = self.timeout.as_secs(), "test command timed out");
                return format!("{TIMEOUT_NOTE} {}s]\n", self.timeout.as_secs());
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            match output.status.code() {
                Some(code) => combined.push_str(&format!("\n{EXIT_STATUS_NOTE}{code}]\n")),
                None => combined.push_str(&format!("\n{SIGNAL_NOTE}\n")),
            }
        }
        debug!(status = ?output.status.code(), bytes = combined.len(), "test command finished");
        combined
    }
}
