//! # CSV Export Module / CSV 导出模块
//!
//! Exports the resolved coverage map as one CSV row per class or trigger.
//!
//! 将解析后的覆盖率映射导出为 CSV，每个类或触发器一行。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::core::aggregation::CoverageMap;
use crate::infra::t;

pub const CSV_HEADER: &str = "Name,Coverage_Percentage,Covered_Lines,Total_Lines,Uncovered_Lines";

/// Quotes a field when it contains a separator, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders the CSV document, rows sorted by name, `\r\n` line endings.
/// 渲染 CSV 文档，按名称排序，使用 `\r\n` 换行。
pub fn render_csv(coverage: &CoverageMap) -> String {
    let mut out = String::with_capacity(64 * (coverage.len() + 1));
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");
    for (name, record) in coverage {
        out.push_str(&format!(
            "{},{:.2},{},{},{}\r\n",
            escape_field(name),
            record.coverage_percentage(),
            record.covered_lines,
            record.total_lines(),
            record.uncovered_lines
        ));
    }
    out
}

/// Writes [`render_csv`] to `path`.
pub fn export_csv(coverage: &CoverageMap, path: &Path) -> Result<()> {
    fs::write(path, render_csv(coverage))
        .with_context(|| t!("report.csv_write_failed", path = path.display()).to_string())?;
    info!("{}", t!("report.csv_saved", path = path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::CoverageRecord;

    #[test]
    fn names_with_commas_are_quoted() {
        assert_eq!(escape_field("Plain"), "Plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn rows_follow_header_in_name_order() {
        let mut coverage = CoverageMap::new();
        coverage.insert("Zeta".into(), CoverageRecord::new(None, 1, 3));
        coverage.insert("Alpha".into(), CoverageRecord::new(None, 8, 2));

        let csv = render_csv(&coverage);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "Alpha,80.00,8,10,2");
        assert_eq!(lines[2], "Zeta,25.00,1,4,3");
        assert_eq!(lines[3], "");
    }
}
