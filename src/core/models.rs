//! # Data Models Module / 数据模型模块
//!
//! This module defines the value records used throughout the coverage check
//! and the JSON schema emitted by the Salesforce CLI's `--json` mode.
//!
//! 此模块定义了覆盖率检查中使用的值记录，
//! 以及 Salesforce CLI `--json` 模式输出的 JSON 结构。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::core::aggregation::coverage_percentage;

/// Placeholder used wherever the CLI omitted a name or identifier.
pub const UNKNOWN: &str = "Unknown";

/// The two kinds of Apex artifacts that carry executable lines.
/// 携带可执行代码行的两种 Apex 构件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApexKind {
    Class,
    Trigger,
}

impl ApexKind {
    /// The sObject that lists artifacts of this kind.
    pub fn sobject(&self) -> &'static str {
        match self {
            ApexKind::Class => "ApexClass",
            ApexKind::Trigger => "ApexTrigger",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApexKind::Class => "class",
            ApexKind::Trigger => "trigger",
        }
    }
}

impl fmt::Display for ApexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An Apex class or trigger found in the org inventory.
/// 组织清单中的 Apex 类或触发器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApexItem {
    pub name: String,
    pub id: String,
    pub kind: ApexKind,
}

/// Line coverage for one class or trigger. The name is the map key it is
/// stored under; total and percentage are derived, never stored.
///
/// 单个类或触发器的行覆盖率。名称是其存储的映射键；
/// 总行数和百分比是派生值，不会存储。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Artifact id, `None` when coverage was rebuilt from test results.
    pub id: Option<String>,
    pub covered_lines: u64,
    pub uncovered_lines: u64,
}

impl CoverageRecord {
    pub fn new(id: Option<String>, covered_lines: u64, uncovered_lines: u64) -> Self {
        Self {
            id,
            covered_lines,
            uncovered_lines,
        }
    }

    /// A zero-line record standing in for an artifact with no coverage data.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(Some(id.into()), 0, 0)
    }

    pub fn total_lines(&self) -> u64 {
        self.covered_lines + self.uncovered_lines
    }

    pub fn coverage_percentage(&self) -> f64 {
        coverage_percentage(self.covered_lines, self.uncovered_lines)
    }

    /// Adds another slice of lines to this record.
    pub fn absorb(&mut self, covered_lines: u64, uncovered_lines: u64) {
        self.covered_lines += covered_lines;
        self.uncovered_lines += uncovered_lines;
    }
}

/// Outcome reported for a single test method.
/// 单个测试方法的报告结果。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    Pass,
    Fail,
    CompileFail,
    Skip,
    /// Anything else the CLI reports, kept verbatim.
    Other(String),
}

impl TestOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::Pass)
    }
}

impl From<&str> for TestOutcome {
    fn from(value: &str) -> Self {
        match value {
            "Pass" => TestOutcome::Pass,
            "Fail" => TestOutcome::Fail,
            "CompileFail" => TestOutcome::CompileFail,
            "Skip" => TestOutcome::Skip,
            other => TestOutcome::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Pass => f.write_str("Pass"),
            TestOutcome::Fail => f.write_str("Fail"),
            TestOutcome::CompileFail => f.write_str("CompileFail"),
            TestOutcome::Skip => f.write_str("Skip"),
            TestOutcome::Other(s) => f.write_str(s),
        }
    }
}

/// One executed test method joined with the lines it covered.
/// 单个已执行的测试方法及其覆盖的代码行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethodResult {
    pub class_name: String,
    pub method_name: String,
    pub outcome: TestOutcome,
    pub runtime_ms: u64,
    pub message: String,
    pub covered_lines: u64,
    pub uncovered_lines: u64,
}

impl TestMethodResult {
    /// Composite key `Class.method` used to join results with coverage.
    pub fn key(&self) -> String {
        test_key(&self.class_name, &self.method_name)
    }

    pub fn total_lines(&self) -> u64 {
        self.covered_lines + self.uncovered_lines
    }

    pub fn coverage_percentage(&self) -> f64 {
        coverage_percentage(self.covered_lines, self.uncovered_lines)
    }
}

pub fn test_key(class_name: &str, method_name: &str) -> String {
    format!("{class_name}.{method_name}")
}

/// Details of the org under inspection. Each field falls back to `Unknown`.
/// 被检查组织的详细信息。每个字段默认为 `Unknown`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgInfo {
    pub org_name: String,
    pub org_url: String,
    pub username: String,
    pub org_id: String,
}

impl Default for OrgInfo {
    fn default() -> Self {
        Self {
            org_name: UNKNOWN.to_string(),
            org_url: UNKNOWN.to_string(),
            username: UNKNOWN.to_string(),
            org_id: UNKNOWN.to_string(),
        }
    }
}

impl From<OrgDisplayResult> for OrgInfo {
    fn from(value: OrgDisplayResult) -> Self {
        let username = value.username.unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            org_name: value.alias.unwrap_or_else(|| username.clone()),
            org_url: value.instance_url.unwrap_or_else(|| UNKNOWN.to_string()),
            username,
            org_id: value.id.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire schema of `sf ... --json` / `sf ... --json` 的输出结构
// ---------------------------------------------------------------------------

/// Envelope wrapping every `--json` response.
#[derive(Debug, Deserialize)]
pub struct CliEnvelope<T> {
    #[serde(default)]
    pub status: i64,
    pub result: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `result` of `sf org display`.
#[derive(Debug, Default, Deserialize)]
pub struct OrgDisplayResult {
    pub alias: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "instanceUrl")]
    pub instance_url: Option<String>,
    pub id: Option<String>,
}

/// `result` of `sf data query`. Records stay untyped until the caller
/// knows which query produced them.
#[derive(Debug, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub records: Vec<Value>,
}

/// A `{ "Name": ..., "Id": ... }` relationship reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

/// Row of `SELECT Id, Name FROM ApexClass|ApexTrigger`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApexItemRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Row of `ApexCodeCoverageAggregate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateRecord {
    #[serde(rename = "ApexClassOrTrigger", default)]
    pub class_or_trigger: Option<NamedRef>,
    #[serde(rename = "NumLinesCovered", default, deserialize_with = "lenient_u64")]
    pub num_lines_covered: u64,
    #[serde(rename = "NumLinesUncovered", default, deserialize_with = "lenient_u64")]
    pub num_lines_uncovered: u64,
}

/// Row of `ApexTestResult`, also the shape of `tests[]` from `apex run test`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestResultRecord {
    #[serde(rename = "ApexClass", default)]
    pub apex_class: Option<NamedRef>,
    #[serde(rename = "MethodName", default)]
    pub method_name: Option<String>,
    #[serde(rename = "Outcome", default)]
    pub outcome: Option<String>,
    #[serde(rename = "RunTime", default, deserialize_with = "lenient_u64")]
    pub run_time: u64,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl TestResultRecord {
    pub fn class_name(&self) -> &str {
        self.apex_class
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or(UNKNOWN)
    }

    pub fn method_name(&self) -> &str {
        self.method_name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn outcome(&self) -> TestOutcome {
        TestOutcome::from(self.outcome.as_deref().unwrap_or(UNKNOWN))
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// Row of the per-test-method `ApexCodeCoverage` grouping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestCoverageRecord {
    #[serde(rename = "ApexTestClass", default)]
    pub apex_test_class: Option<NamedRef>,
    #[serde(rename = "TestMethodName", default)]
    pub test_method_name: Option<String>,
    #[serde(rename = "CoveredLines", default, deserialize_with = "lenient_u64")]
    pub covered_lines: u64,
    #[serde(rename = "UncoveredLines", default, deserialize_with = "lenient_u64")]
    pub uncovered_lines: u64,
}

/// `summary` of `sf apex run test`. The CLI reports most of these as
/// strings (`"78%"`, `"1234"`), so every field is parsed leniently.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestRunSummary {
    #[serde(rename = "testsRan", deserialize_with = "lenient_u64")]
    pub tests_ran: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub passing: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub failing: u64,
    #[serde(rename = "testRunCoverage", deserialize_with = "lenient_f64")]
    pub test_run_coverage: f64,
    #[serde(rename = "testExecutionTimeInMs", deserialize_with = "lenient_u64")]
    pub execution_time_ms: u64,
}

/// `result` of `sf apex run test`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestRun {
    #[serde(default)]
    pub summary: Option<TestRunSummary>,
    #[serde(default)]
    pub tests: Vec<TestResultRecord>,
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).map(|v| v.max(0.0) as u64).unwrap_or(0))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).unwrap_or(0.0))
}
