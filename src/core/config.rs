//! # Configuration Module / 配置模块
//!
//! Loads and validates `CoverageCheck.toml`.
//!
//! 加载并校验 `CoverageCheck.toml`。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::analysis::DEFAULT_COVERAGE_THRESHOLD;
use crate::infra::t;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "CoverageCheck.toml";

/// Settings loaded from `CoverageCheck.toml`. Every field is optional in the
/// file; command-line flags take precedence over whatever is set here.
///
/// 从 `CoverageCheck.toml` 加载的设置。文件中的每个字段都是可选的；
/// 命令行参数优先于此处的设置。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Org alias or username passed as `--target-org`.
    /// 作为 `--target-org` 传递的组织别名或用户名。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// The language for the tool's messages (e.g., "en", "zh-CN").
    /// 工具消息的语言（例如 "en", "zh-CN"）。
    pub language: String,

    /// Concurrent CLI invocations; `0` means `min(4, cpu count)`.
    /// 并发 CLI 调用数；`0` 表示 `min(4, CPU 数)`。
    pub workers: usize,

    /// Whether to run the org's tests before collecting coverage.
    /// 收集覆盖率之前是否运行组织的测试。
    pub run_tests: bool,

    /// Value of `--test-level` for `sf apex run test`.
    pub test_level: String,

    /// Value of `--wait` (minutes) for `sf apex run test`.
    pub wait_minutes: u64,

    /// Upper bound for any single CLI invocation, in seconds.
    /// 单次 CLI 调用的时间上限（秒）。
    pub command_timeout_secs: u64,

    /// Minimum percentage for an artifact to count as well covered.
    pub coverage_threshold: f64,

    /// Explicit CLI command, e.g. `"npx sf"` or `"~/bin/sf"`. Skips detection.
    /// 显式指定的 CLI 命令，例如 `"npx sf"`。设置后跳过自动检测。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sf_command: Option<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            org: None,
            language: "en".to_string(),
            workers: 0,
            run_tests: true,
            test_level: "RunLocalTests".to_string(),
            wait_minutes: 30,
            command_timeout_secs: 300,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            sf_command: None,
        }
    }
}

impl CheckConfig {
    /// Parses a config document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: CheckConfig =
            toml::from_str(content).with_context(|| t!("config.parse_failed").to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config to use for this run.
    ///
    /// An explicit `path` must exist. Without one, `CoverageCheck.toml` in the
    /// current directory is used when present, defaults otherwise.
    ///
    /// 加载本次运行使用的配置。显式指定的路径必须存在；
    /// 否则若当前目录存在 `CoverageCheck.toml` 则使用它，否则使用默认值。
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok((Self::default(), None));
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| t!("config.read_failed", path = path.display()).to_string())?;
        let config = Self::from_toml(&content)?;
        Ok((config, Some(path)))
    }

    /// Worker count with `0` resolved to `min(4, cpu count)`.
    pub fn effective_workers(&self) -> usize {
        resolve_workers(self.workers)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.coverage_threshold) {
            anyhow::bail!(
                "{}",
                t!("config.invalid_threshold", value = self.coverage_threshold)
            );
        }
        if self.command_timeout_secs == 0 {
            anyhow::bail!("{}", t!("config.invalid_timeout"));
        }
        Ok(())
    }
}

/// `requested` when positive, otherwise `min(4, cpu count)`.
pub fn resolve_workers(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        num_cpus::get().clamp(1, 4)
    }
}
