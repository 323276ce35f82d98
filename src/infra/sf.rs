//! # Salesforce CLI Client Module / Salesforce CLI 客户端模块
//!
//! A thin, typed wrapper around the commands this tool needs from `sf`:
//! `--version`, `org display`, `data query` and `apex run test`. Every call
//! except `--version` uses `--json` and is decoded from the CLI's envelope.
//!
//! 对本工具所需 `sf` 命令的轻量类型化封装：`--version`、`org display`、
//! `data query` 和 `apex run test`。除 `--version` 外均使用 `--json`。

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::execution::decode_records;
use crate::core::models::{
    ApexItem, ApexItemRecord, ApexKind, CliEnvelope, OrgDisplayResult, OrgInfo, QueryResult,
    TestRun,
};
use crate::error::SfError;
use crate::infra::command::{self, CommandOutput};
use crate::infra::t;

/// Everything needed to invoke the CLI against one org.
/// 针对单个组织调用 CLI 所需的全部信息。
#[derive(Debug, Clone)]
pub struct SfClient {
    /// argv prefix, e.g. `["sf"]` or `["npx", "sf"]`.
    command: Vec<String>,
    org: String,
    timeout: Duration,
    test_level: String,
    wait_minutes: u64,
}

impl SfClient {
    /// Creates a client for `org`. An empty `command` means no CLI was found.
    pub fn new(command: Vec<String>, org: impl Into<String>) -> Result<Self, SfError> {
        if command.is_empty() {
            return Err(SfError::NotFound);
        }
        Ok(Self {
            command,
            org: org.into(),
            timeout: Duration::from_secs(300),
            test_level: "RunLocalTests".to_string(),
            wait_minutes: 30,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_test_level(mut self, test_level: impl Into<String>) -> Self {
        self.test_level = test_level.into();
        self
    }

    pub fn with_wait_minutes(mut self, wait_minutes: u64) -> Self {
        self.wait_minutes = wait_minutes;
        self
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// The CLI invocation as typed by a user, for hints and logs.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Runs the CLI with `args` appended to the command prefix.
    /// A non-zero exit is returned as output, not as an error.
    pub async fn run(&self, args: &[String]) -> Result<CommandOutput, SfError> {
        let (program, prefix) = self
            .command
            .split_first()
            .ok_or(SfError::NotFound)?;
        let mut full_args = prefix.to_vec();
        full_args.extend_from_slice(args);

        info!("{}", t!("sf.running", command = command::describe(program, &full_args)));
        let output = command::run_with_timeout(program, &full_args, self.timeout).await?;
        if !output.success() {
            debug!("{}", t!("sf.command_failed", stderr = output.stderr.trim()));
        }
        Ok(output)
    }

    /// Runs a `--json` command and decodes `result` as `T`.
    async fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> Result<T, SfError> {
        let output = self.run(args).await?;
        let command_line = self.describe_args(args);
        if !output.success() {
            return Err(failure(command_line, &output));
        }
        decode_result(&command_line, &output.stdout)
    }

    fn describe_args(&self, args: &[String]) -> String {
        format!("{} {}", self.command_line(), args.join(" "))
    }

    /// `sf --version`, trimmed.
    pub async fn version(&self) -> Result<String, SfError> {
        let args = vec!["--version".to_string()];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(failure(self.describe_args(&args), &output));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// `sf org display --target-org <org> --json`.
    pub async fn display_org(&self) -> Result<OrgInfo, SfError> {
        let args = strings(&["org", "display", "--target-org", self.org.as_str(), "--json"]);
        let result: OrgDisplayResult = self.run_json(&args).await?;
        Ok(OrgInfo::from(result))
    }

    /// `sf data query --query <soql> --target-org <org> --json`, returning
    /// the raw `records` array.
    pub async fn query(&self, soql: &str) -> Result<Vec<Value>, SfError> {
        let args = strings(&[
            "data",
            "query",
            "--query",
            soql,
            "--target-org",
            self.org.as_str(),
            "--json",
        ]);
        let result: QueryResult = self.run_json(&args).await?;
        Ok(result.records)
    }

    /// Non-namespaced classes or triggers, ordered by name.
    ///
    /// 按名称排序的无命名空间类或触发器。
    pub async fn apex_items(&self, kind: ApexKind) -> Result<Vec<ApexItem>, SfError> {
        let soql = format!(
            "SELECT Id, Name FROM {} WHERE NamespacePrefix = null ORDER BY Name",
            kind.sobject()
        );
        let records = self.query(&soql).await?;
        Ok(decode_records::<ApexItemRecord>(kind.sobject(), records)
            .into_iter()
            .map(|record| ApexItem {
                name: record.name,
                id: record.id,
                kind,
            })
            .collect())
    }

    /// `sf apex run test --test-level <level> --target-org <org> --wait <n> --json`.
    ///
    /// The CLI exits non-zero when any test fails, so a non-zero exit whose
    /// stdout still carries a test summary is accepted.
    ///
    /// 任何测试失败时 CLI 都会以非零退出，因此只要 stdout 仍包含测试摘要，
    /// 非零退出也会被接受。
    pub async fn run_tests(&self) -> Result<TestRun, SfError> {
        let wait = self.wait_minutes.to_string();
        let args = strings(&[
            "apex",
            "run",
            "test",
            "--test-level",
            self.test_level.as_str(),
            "--target-org",
            self.org.as_str(),
            "--wait",
            wait.as_str(),
            "--json",
        ]);
        let output = self.run(&args).await?;
        let command_line = self.describe_args(&args);

        match decode_result::<TestRun>(&command_line, &output.stdout) {
            Ok(run) if output.success() || run.summary.is_some() => {
                if !output.success() {
                    info!("{}", t!("sf.tests_failed_with_summary"));
                }
                Ok(run)
            }
            Ok(_) | Err(_) if !output.success() => Err(failure(command_line, &output)),
            other => other,
        }
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Decodes the envelope on stdout and extracts `result`.
fn decode_result<T: DeserializeOwned>(command_line: &str, stdout: &str) -> Result<T, SfError> {
    let envelope: CliEnvelope<T> =
        serde_json::from_str(stdout).map_err(|source| SfError::InvalidJson {
            command: command_line.to_string(),
            source,
        })?;
    match envelope.result {
        Some(result) => Ok(result),
        None => Err(SfError::CommandFailed {
            command: command_line.to_string(),
            code: Some(envelope.status as i32),
            message: envelope
                .message
                .unwrap_or_else(|| t!("sf.missing_result").to_string()),
        }),
    }
}

/// Builds the error for a non-zero exit, preferring the envelope's
/// `message` over raw stderr.
fn failure(command_line: String, output: &CommandOutput) -> SfError {
    let from_json = serde_json::from_str::<CliEnvelope<Value>>(&output.stdout)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty());
    let message = from_json.unwrap_or_else(|| {
        let stderr = output.stderr.trim();
        if stderr.is_empty() {
            output.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    });
    SfError::CommandFailed {
        command: command_line,
        code: output.code,
        message,
    }
}
