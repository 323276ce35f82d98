//! # Coverage Gap Analysis Module / 覆盖率差距分析模块
//!
//! Splits every known artifact into exactly one of four categories and
//! computes the org-wide line totals.
//!
//! 将每个已知构件划分到四个类别之一，并计算组织级别的代码行总数。

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::core::aggregation::{CoverageMap, coverage_percentage};
use crate::core::models::{ApexItem, ApexKind};
use crate::infra::t;

/// Default minimum percentage for an artifact to count as well covered.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 75.0;

/// Coverage bucket of a single artifact.
/// 单个构件的覆盖率类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CoverageCategory {
    /// Percentage at or above the threshold.
    Good,
    /// Above zero but below the threshold.
    Low,
    /// Exactly zero percent.
    NoCoverage,
    /// In the inventory but absent from the coverage data.
    Untested,
}

/// Buckets a percentage against `threshold`. Never returns `Untested`;
/// that depends on whether coverage data exists at all.
pub fn categorize(percentage: f64, threshold: f64) -> CoverageCategory {
    if percentage == 0.0 {
        CoverageCategory::NoCoverage
    } else if percentage < threshold {
        CoverageCategory::Low
    } else {
        CoverageCategory::Good
    }
}

/// An artifact with coverage data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveredItem {
    pub name: String,
    pub coverage_percentage: f64,
    pub covered_lines: u64,
    pub total_lines: u64,
}

/// An inventory artifact without coverage data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntestedItem {
    pub name: String,
    pub kind: ApexKind,
    pub id: String,
}

/// Line totals across the whole coverage map.
/// 整个覆盖率映射的代码行总计。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_lines: u64,
    pub covered_lines: u64,
    pub uncovered_lines: u64,
    pub coverage_percentage: f64,
}

/// Result of [`analyze_coverage_gaps`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageAnalysis {
    /// Distinct names in the inventory.
    pub total_items: usize,
    /// Entries in the coverage map.
    pub tested_items: usize,
    pub untested: Vec<UntestedItem>,
    pub no_coverage: Vec<CoveredItem>,
    pub low_coverage: Vec<CoveredItem>,
    pub good_coverage: Vec<CoveredItem>,
    pub overall: OverallStats,
    pub threshold: f64,
}

impl CoverageAnalysis {
    pub fn count(&self, category: CoverageCategory) -> usize {
        match category {
            CoverageCategory::Good => self.good_coverage.len(),
            CoverageCategory::Low => self.low_coverage.len(),
            CoverageCategory::NoCoverage => self.no_coverage.len(),
            CoverageCategory::Untested => self.untested.len(),
        }
    }

    /// Size of the artifact set (inventory ∪ coverage keys).
    pub fn artifact_count(&self) -> usize {
        self.untested.len()
            + self.no_coverage.len()
            + self.low_coverage.len()
            + self.good_coverage.len()
    }
}

/// Categorises every artifact in `inventory ∪ coverage` exactly once.
///
/// Triggers and classes sharing a name collapse into one inventory entry,
/// the later (trigger) kind winning, the same way the coverage map is keyed.
///
/// # Arguments
/// * `coverage` - Resolved coverage map
/// * `inventory` - Classes and triggers found in the org
/// * `threshold` - Minimum percentage for the `Good` bucket
///
/// 对 `清单 ∪ 覆盖率键` 中的每个构件恰好分类一次。
pub fn analyze_coverage_gaps(
    coverage: &CoverageMap,
    inventory: &[ApexItem],
    threshold: f64,
) -> CoverageAnalysis {
    info!("{}", t!("analysis.analyzing"));

    let mut all_items: BTreeMap<&str, &ApexItem> = BTreeMap::new();
    for item in inventory {
        all_items.insert(item.name.as_str(), item);
    }

    let untested = all_items
        .values()
        .filter(|item| !coverage.contains_key(&item.name))
        .map(|item| UntestedItem {
            name: item.name.clone(),
            kind: item.kind,
            id: item.id.clone(),
        })
        .collect();

    let mut no_coverage = Vec::new();
    let mut low_coverage = Vec::new();
    let mut good_coverage = Vec::new();
    let mut total_lines = 0u64;
    let mut covered_lines = 0u64;

    for (name, record) in coverage {
        total_lines += record.total_lines();
        covered_lines += record.covered_lines;

        let item = CoveredItem {
            name: name.clone(),
            coverage_percentage: record.coverage_percentage(),
            covered_lines: record.covered_lines,
            total_lines: record.total_lines(),
        };
        match categorize(item.coverage_percentage, threshold) {
            CoverageCategory::NoCoverage => no_coverage.push(item),
            CoverageCategory::Low => low_coverage.push(item),
            _ => good_coverage.push(item),
        }
    }

    // Stable sort keeps name order among equal percentages.
    low_coverage.sort_by(|a, b| a.coverage_percentage.total_cmp(&b.coverage_percentage));

    let uncovered_lines = total_lines - covered_lines;
    CoverageAnalysis {
        total_items: all_items.len(),
        tested_items: coverage.len(),
        untested,
        no_coverage,
        low_coverage,
        good_coverage,
        overall: OverallStats {
            total_lines,
            covered_lines,
            uncovered_lines,
            coverage_percentage: coverage_percentage(covered_lines, uncovered_lines),
        },
        threshold,
    }
}
