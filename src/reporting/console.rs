//! # Console Reporting Module / 控制台报告模块
//!
//! Prints a short coloured summary after the full report has been written
//! to a file.
//!
//! 在完整报告写入文件后，打印简短的彩色摘要。

use colored::*;

use crate::core::analysis::CoverageAnalysis;
use crate::core::models::OrgInfo;
use crate::infra::t;
use crate::reporting::text::{format_threshold, thousands};

/// Colours a percentage against the coverage threshold.
fn colored_percentage(percentage: f64, threshold: f64) -> ColoredString {
    let text = format!("{percentage:.2}%");
    if percentage >= threshold {
        text.green().bold()
    } else if percentage > 0.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

/// Prints the org percentage and the category counts.
///
/// # Output Format / 输出格式
/// ```text
/// --- Coverage Summary ---
///   Org: my-org (https://example.my.salesforce.com)
///   Total Coverage: 81.25%  (1,300 / 1,600 lines)
///   - Good (≥75%)       :   12
///   - Low (<75%)        :    3
///   - No Coverage (0%)  :    1
///   - Untested          :    2
/// ```
pub fn print_summary(analysis: &CoverageAnalysis, org: &OrgInfo) {
    let threshold = format_threshold(analysis.threshold);
    let overall = &analysis.overall;

    println!("\n{}", t!("console.banner").bold());
    println!("  {}: {} ({})", t!("console.org"), org.org_name.cyan(), org.org_url);
    println!(
        "  {}: {}  ({} / {})",
        t!("console.total_coverage"),
        colored_percentage(overall.coverage_percentage, analysis.threshold),
        thousands(overall.covered_lines),
        thousands(overall.total_lines)
    );

    let rows = [
        (
            t!("console.good", threshold = threshold),
            analysis.good_coverage.len().to_string().green(),
        ),
        (
            t!("console.low", threshold = threshold),
            analysis.low_coverage.len().to_string().yellow(),
        ),
        (
            t!("console.no_coverage"),
            analysis.no_coverage.len().to_string().red(),
        ),
        (
            t!("console.untested"),
            analysis.untested.len().to_string().red(),
        ),
    ];
    for (label, count) in rows {
        println!("  - {:<18}: {:>4}", label, count);
    }
}
