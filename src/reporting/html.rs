//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a self-contained HTML page from a finished coverage
//! check: the org header, category counts, a per-artifact table and the
//! failing tests with their messages.
//!
//! 此模块根据已完成的覆盖率检查生成独立的 HTML 页面：
//! 组织信息、类别计数、每个构件的表格以及失败的测试及其消息。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::core::analysis::{CoverageCategory, categorize};
use crate::infra::t;
use crate::reporting::text::{ReportContext, format_threshold, thousands};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.2rem; }
.meta { color: #666; margin-bottom: 1.5rem; }
.summary-container { display: flex; gap: 1rem; margin-bottom: 2rem; flex-wrap: wrap; }
.summary-item { border: 1px solid #ddd; border-radius: 6px; padding: 0.8rem 1.2rem; min-width: 8rem; }
.summary-item .count { display: block; font-size: 1.6rem; font-weight: bold; }
.summary-item .label { color: #666; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border-bottom: 1px solid #eee; padding: 0.4rem 0.6rem; text-align: left; }
td.num, th.num { text-align: right; font-variant-numeric: tabular-nums; }
.good { color: #1a7f37; }
.low { color: #9a6700; }
.none, .untested, .failed { color: #cf222e; }
pre { white-space: pre-wrap; margin: 0; }
"#;

fn category_class(category: CoverageCategory) -> &'static str {
    match category {
        CoverageCategory::Good => "good",
        CoverageCategory::Low => "low",
        CoverageCategory::NoCoverage => "none",
        CoverageCategory::Untested => "untested",
    }
}

/// Renders the HTML document.
/// 渲染 HTML 文档。
pub fn render_html(ctx: &ReportContext<'_>) -> String {
    let analysis = ctx.analysis;
    let threshold = format_threshold(analysis.threshold);
    let failed: Vec<_> = ctx.tests.values().filter(|t| !t.outcome.is_pass()).collect();

    let page: Markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Salesforce Code Coverage Report - " (ctx.org.org_name) }
                style { (maud::PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { "Salesforce Code Coverage Report" }
                div class="meta" {
                    "Generated: " (ctx.generated_at) br;
                    "Org: " strong { (ctx.org.org_name) } br;
                    "Org Url: " (ctx.org.org_url)
                }
                div class="summary-container" {
                    div class="summary-item" {
                        span class="count" { (format!("{:.2}%", analysis.overall.coverage_percentage)) }
                        span class="label" {
                            (thousands(analysis.overall.covered_lines)) " / "
                            (thousands(analysis.overall.total_lines)) " lines"
                        }
                    }
                    div class="summary-item" {
                        span class="count good" { (analysis.good_coverage.len()) }
                        span class="label" { "Good (≥" (threshold) "%)" }
                    }
                    div class="summary-item" {
                        span class="count low" { (analysis.low_coverage.len()) }
                        span class="label" { "Low (<" (threshold) "%)" }
                    }
                    div class="summary-item" {
                        span class="count none" { (analysis.no_coverage.len()) }
                        span class="label" { "No Coverage (0%)" }
                    }
                    div class="summary-item" {
                        span class="count untested" { (analysis.untested.len()) }
                        span class="label" { "Untested" }
                    }
                }
                h2 { "Coverage by Class/Trigger" }
                table {
                    thead {
                        tr {
                            th { "Name" }
                            th class="num" { "Coverage" }
                            th class="num" { "Covered" }
                            th class="num" { "Total" }
                        }
                    }
                    tbody {
                        @for (name, record) in ctx.coverage {
                            @let pct = record.coverage_percentage();
                            tr {
                                td { (name) }
                                td class={ "num " (category_class(categorize(pct, analysis.threshold))) } {
                                    (format!("{pct:.2}%"))
                                }
                                td class="num" { (thousands(record.covered_lines)) }
                                td class="num" { (thousands(record.total_lines())) }
                            }
                        }
                        @for item in &analysis.untested {
                            tr {
                                td { (item.name) " (" (item.kind) ")" }
                                td class="num untested" { "untested" }
                                td class="num" { "-" }
                                td class="num" { "-" }
                            }
                        }
                    }
                }
                @if !failed.is_empty() {
                    h2 class="failed" { "Failed Tests" }
                    table {
                        thead { tr { th { "Test" } th { "Outcome" } th { "Message" } } }
                        tbody {
                            @for test in &failed {
                                tr {
                                    td { (test.key()) }
                                    td class="failed" { (test.outcome) }
                                    td { pre { (test.message) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    page.into_string()
}

/// Generates the HTML report and writes it to `output_path`.
///
/// # Errors / 错误
/// Returns an error if the file cannot be written.
/// 无法写入文件时返回错误。
pub fn generate_html_report(ctx: &ReportContext<'_>, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_html(ctx)).with_context(|| {
        t!("report.html_write_failed", path = output_path.display()).to_string()
    })?;
    info!("{}", t!("report.html_saved", path = output_path.display()));
    Ok(())
}
