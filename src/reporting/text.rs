//! # Text Reporting Module / 文本报告模块
//!
//! Renders the plain-text coverage report. Rendering is a pure function of
//! its inputs (the timestamp included), so identical data always yields a
//! byte-identical report.
//!
//! 渲染纯文本覆盖率报告。渲染是输入（包括时间戳）的纯函数，
//! 因此相同的数据总是生成逐字节相同的报告。

use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::core::aggregation::{CoverageMap, TestResultMap};
use crate::core::analysis::CoverageAnalysis;
use crate::core::models::{OrgInfo, TestMethodResult, TestRun};
use crate::infra::t;

const WIDE_RULE_WIDTH: usize = 80;
const NARROW_RULE_WIDTH: usize = 40;

/// Timestamp format used in the report header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the report shows, borrowed from the finished check.
/// 报告所需的全部数据，借用自已完成的检查。
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// Pre-formatted generation time.
    pub generated_at: &'a str,
    /// The `--target-org` value, used in the "run tests first" hint.
    pub org_alias: &'a str,
    pub org: &'a OrgInfo,
    pub coverage: &'a CoverageMap,
    pub analysis: &'a CoverageAnalysis,
    pub tests: &'a TestResultMap,
    /// Present when tests were run during this check.
    pub test_run: Option<&'a TestRun>,
}

/// Formats an integer with `,` thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `75.0` → `75`, `72.5` → `72.5`.
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold}")
}

fn status_indicator(test: &TestMethodResult) -> &'static str {
    if test.outcome.is_pass() { "PASS" } else { "FAIL" }
}

/// Renders the full report. Lines are joined with `\n`, no trailing newline.
///
/// 渲染完整报告。各行以 `\n` 连接，末尾没有换行符。
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let wide_rule = "=".repeat(WIDE_RULE_WIDTH);
    let dash_rule = "-".repeat(WIDE_RULE_WIDTH);
    let narrow_rule = "-".repeat(NARROW_RULE_WIDTH);
    let analysis = ctx.analysis;
    let overall = &analysis.overall;
    let threshold = format_threshold(analysis.threshold);

    let mut lines: Vec<String> = vec![
        wide_rule.clone(),
        "SALESFORCE CODE COVERAGE REPORT".to_string(),
        format!("Generated: {}", ctx.generated_at),
        wide_rule.clone(),
        String::new(),
        format!("**{}**", ctx.org.org_name),
        format!("Org Url: {}", ctx.org.org_url),
        format!("Covered Lines: {}", thousands(overall.covered_lines)),
        format!("Uncovered Lines: {}", thousands(overall.uncovered_lines)),
        format!("Total Coverage for Org: {:.2}%", overall.coverage_percentage),
        String::new(),
        wide_rule,
        String::new(),
    ];

    if let Some(run) = ctx.test_run {
        let summary = run.summary.clone().unwrap_or_default();
        lines.extend([
            "TEST EXECUTION SUMMARY:".to_string(),
            format!("  Tests Run: {}", thousands(summary.tests_ran)),
            format!("  Tests Passed: {}", thousands(summary.passing)),
            format!("  Tests Failed: {}", thousands(summary.failing)),
            format!("  Test Run Coverage: {:.2}%", summary.test_run_coverage),
            format!("  Execution Time: {}ms", thousands(summary.execution_time_ms)),
            String::new(),
        ]);
    }

    if !ctx.tests.is_empty() {
        lines.push("INDIVIDUAL TEST COVERAGE:".to_string());
        lines.push(dash_rule.clone());

        let mut sorted: Vec<&TestMethodResult> = ctx.tests.values().collect();
        sorted.sort_by(|a, b| {
            (a.class_name.as_str(), a.method_name.as_str())
                .cmp(&(b.class_name.as_str(), b.method_name.as_str()))
        });

        for test in sorted {
            lines.push(format!(
                "{:<4} {:<50} Covered: {:>4} | Uncovered: {:>4} | Coverage: {:>6.2}%",
                status_indicator(test),
                test.key(),
                test.covered_lines,
                test.uncovered_lines,
                test.coverage_percentage()
            ));
            if !test.outcome.is_pass() && !test.message.is_empty() {
                lines.push(format!("     Error: {}", test.message));
            }
        }
        lines.push(String::new());
    } else if let Some(run) = ctx.test_run {
        lines.push("TEST RESULTS (No detailed coverage available):".to_string());
        lines.push(dash_rule.clone());
        for test in &run.tests {
            let passed = test.outcome().is_pass();
            lines.push(format!(
                "{:<4} {}.{}",
                if passed { "PASS" } else { "FAIL" },
                test.class_name(),
                test.method_name()
            ));
            if !passed && !test.message().is_empty() {
                lines.push(format!("     Error: {}", test.message()));
            }
        }
        lines.push(String::new());
    }

    lines.extend([
        "COVERAGE BREAKDOWN:".to_string(),
        format!(
            "  Good Coverage (≥{threshold}%): {} items",
            thousands(analysis.good_coverage.len() as u64)
        ),
        format!(
            "  Low Coverage (<{threshold}%): {} items",
            thousands(analysis.low_coverage.len() as u64)
        ),
        format!(
            "  No Coverage (0%): {} items",
            thousands(analysis.no_coverage.len() as u64)
        ),
        format!(
            "  Completely Untested: {} items",
            thousands(analysis.untested.len() as u64)
        ),
        String::new(),
    ]);

    if !ctx.coverage.is_empty() {
        let mut with_lines: Vec<(&String, f64, u64, u64)> = ctx
            .coverage
            .iter()
            .filter(|(_, record)| record.total_lines() > 0)
            .map(|(name, record)| {
                (
                    name,
                    record.coverage_percentage(),
                    record.covered_lines,
                    record.total_lines(),
                )
            })
            .collect();

        if with_lines.is_empty() {
            lines.extend([
                String::new(),
                "NO DETAILED COVERAGE DATA AVAILABLE".to_string(),
                "Run tests first to generate coverage data:".to_string(),
                format!(
                    "  sf apex run test --test-level RunLocalTests --target-org {}",
                    ctx.org_alias
                ),
                String::new(),
            ]);
        } else {
            lines.push("DETAILED COVERAGE BY CLASS/TRIGGER:".to_string());
            lines.push(dash_rule);
            // Stable: equal percentages stay in name order.
            with_lines.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (name, percentage, covered, total) in with_lines {
                lines.push(format!(
                    "{:<40} {:>7.2}% ({:>4}/{:<4} lines)",
                    name,
                    percentage,
                    thousands(covered),
                    thousands(total)
                ));
            }
        }
    }

    if !analysis.untested.is_empty() {
        lines.extend([
            String::new(),
            "UNTESTED CLASSES/TRIGGERS:".to_string(),
            narrow_rule.clone(),
        ]);
        for item in &analysis.untested {
            lines.push(format!("  {} ({})", item.name, item.kind));
        }
    }

    if !analysis.no_coverage.is_empty() {
        lines.extend([
            String::new(),
            "ITEMS WITH 0% COVERAGE:".to_string(),
            narrow_rule.clone(),
        ]);
        for item in &analysis.no_coverage {
            lines.push(format!("  {} - {} lines", item.name, thousands(item.total_lines)));
        }
    }

    if !analysis.low_coverage.is_empty() {
        lines.extend([
            String::new(),
            format!("ITEMS WITH LOW COVERAGE (<{threshold}%):"),
            narrow_rule.clone(),
        ]);
        for item in &analysis.low_coverage {
            lines.push(format!(
                "  {:<35} {:>7.2}% ({}/{} lines)",
                item.name,
                item.coverage_percentage,
                thousands(item.covered_lines),
                thousands(item.total_lines)
            ));
        }
    }

    let failed: Vec<&TestMethodResult> = ctx
        .tests
        .values()
        .filter(|t| !t.outcome.is_pass())
        .collect();
    if !failed.is_empty() {
        lines.extend([
            String::new(),
            "FAILED TESTS SUMMARY:".to_string(),
            narrow_rule,
        ]);
        for test in failed {
            lines.push(format!("  {}", test.key()));
            if !test.message.is_empty() {
                lines.push(format!("    Error: {}", test.message));
            }
        }
    }

    lines.join("\n")
}

/// Writes the report to `output`, or prints it when no file is given.
///
/// If the file cannot be written the error is logged and the report is
/// printed instead. Returns `true` when the report ended up in the file.
///
/// 将报告写入 `output`；未指定文件时打印到标准输出。
/// 写入失败时记录错误并改为打印。报告写入文件时返回 `true`。
pub fn write_report(report: &str, output: Option<&Path>) -> bool {
    let Some(path) = output else {
        println!("{report}");
        return false;
    };
    match fs::write(path, report) {
        Ok(()) => {
            info!("{}", t!("report.saved", path = path.display()));
            true
        }
        Err(e) => {
            error!("{}", t!("report.save_failed", path = path.display(), error = e));
            println!("{report}");
            false
        }
    }
}
