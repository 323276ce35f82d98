//! # Command Execution Module / 命令执行模块
//!
//! Spawns external processes, captures their stdout and stderr separately,
//! and enforces a wall-clock timeout.
//!
//! 派生外部进程，分别捕获其 stdout 和 stderr，并强制执行超时。

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::SfError;

/// Captured result of a finished process.
/// 已完成进程的捕获结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Renders a program and its arguments as a single line for logs.
pub fn describe(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runs `program args...` to completion and captures both output streams.
///
/// The child is spawned with `kill_on_drop`, so when `timeout` elapses the
/// pending future is dropped and the process is killed.
///
/// # Arguments
/// * `program` - Executable name or path
/// * `args` - Arguments passed verbatim
/// * `timeout` - Maximum wall-clock time before the child is killed
///
/// # Returns
/// The captured [`CommandOutput`]; a non-zero exit is *not* an error here.
///
/// 运行 `program args...` 直至完成并捕获两个输出流。
/// 超时后子进程会被终止。非零退出码在此处不视为错误。
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput, SfError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let command_line = describe(program, args);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(SfError::Spawn {
                command: command_line,
                source,
            });
        }
        Err(_) => {
            return Err(SfError::Timeout {
                command: command_line,
                timeout,
            });
        }
    };

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
