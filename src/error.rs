//! # Error Types / 错误类型
//!
//! Failures that can occur while talking to the external Salesforce CLI.
//! Orchestration code wraps these in `anyhow::Error`; the typed variants
//! exist so callers can tell a missing CLI apart from a failed query.
//!
//! 与外部 Salesforce CLI 交互时可能出现的错误。

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SfError {
    /// No usable `sf`/`sfdx` installation was found.
    /// 未找到可用的 `sf`/`sfdx` 安装。
    #[error("Salesforce CLI not found")]
    NotFound,

    /// The process could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran longer than its allotted time and was killed.
    /// 进程运行时间超过限制并被终止。
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// The process exited non-zero.
    #[error("`{command}` failed (exit code {code:?}): {message}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    /// stdout was not the JSON document we expected.
    #[error("could not parse JSON from `{command}`: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}
