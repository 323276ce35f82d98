//! # Coverage Aggregation Module / 覆盖率聚合模块
//!
//! Turns raw query records into the name-keyed coverage model and the
//! `Class.method`-keyed test results, and applies the fallbacks used when
//! the org has no aggregate coverage yet.
//!
//! 将原始查询记录转换为按名称索引的覆盖率模型和按 `Class.method`
//! 索引的测试结果，并在组织尚无聚合覆盖率时应用回退策略。

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::core::models::{
    AggregateRecord, ApexItem, CoverageRecord, TestCoverageRecord, TestMethodResult,
    TestResultRecord, test_key,
};
use crate::infra::t;

/// Name-keyed coverage map. Ordered so every iteration is deterministic.
pub type CoverageMap = BTreeMap<String, CoverageRecord>;

/// `Class.method`-keyed test results.
pub type TestResultMap = BTreeMap<String, TestMethodResult>;

/// Where the final coverage map came from.
/// 最终覆盖率映射的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageSource {
    /// `ApexCodeCoverageAggregate` rows.
    Aggregate,
    /// Rebuilt by summing per-test-method coverage per test class.
    TestResults,
    /// Zero-line stand-ins for every inventory item.
    Placeholder,
}

/// `covered / (covered + uncovered) * 100`, rounded to two decimals with
/// ties going to the even digit (`1/32` gives `3.12`). Defined as `0.0` when
/// there are no lines at all.
///
/// 计算覆盖率百分比，保留两位小数（恰好一半时取偶数）；总行数为 0 时返回 0。
pub fn coverage_percentage(covered: u64, uncovered: u64) -> f64 {
    let total = covered + uncovered;
    if total == 0 {
        return 0.0;
    }
    round2(covered as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Builds the coverage map from aggregate rows. Rows without a name are
/// dropped; a repeated name overwrites the earlier row.
pub fn process_coverage_data(records: &[AggregateRecord]) -> CoverageMap {
    let mut coverage = CoverageMap::new();
    for record in records {
        let Some(target) = &record.class_or_trigger else {
            continue;
        };
        let Some(name) = target.name.as_ref().filter(|n| !n.is_empty()) else {
            continue;
        };
        coverage.insert(
            name.clone(),
            CoverageRecord::new(
                target.id.clone(),
                record.num_lines_covered,
                record.num_lines_uncovered,
            ),
        );
    }
    debug!("{}", t!("aggregate.processed_coverage", count = coverage.len()));
    coverage
}

/// Joins test results with their per-method coverage.
///
/// Tests with no matching coverage row get zero lines. An empty `tests`
/// slice yields an empty map even when coverage rows exist.
///
/// 将测试结果与其按方法划分的覆盖率关联。
pub fn process_test_results(
    tests: &[TestResultRecord],
    coverage: &[TestCoverageRecord],
) -> TestResultMap {
    if tests.is_empty() {
        return TestResultMap::new();
    }

    let mut lookup: HashMap<String, (u64, u64)> = HashMap::new();
    for record in coverage {
        let class = record.apex_test_class.as_ref().and_then(|c| c.name.as_deref());
        let (Some(class), Some(method)) = (class, record.test_method_name.as_deref()) else {
            continue;
        };
        lookup.insert(
            test_key(class, method),
            (record.covered_lines, record.uncovered_lines),
        );
    }

    let mut results = TestResultMap::new();
    for test in tests {
        let class_name = test.class_name().to_string();
        let method_name = test.method_name().to_string();
        let key = test_key(&class_name, &method_name);
        let (covered_lines, uncovered_lines) = lookup.get(&key).copied().unwrap_or((0, 0));

        results.insert(
            key,
            TestMethodResult {
                class_name,
                method_name,
                outcome: test.outcome(),
                runtime_ms: test.run_time,
                message: test.message().to_string(),
                covered_lines,
                uncovered_lines,
            },
        );
    }
    debug!("{}", t!("aggregate.processed_tests", count = results.len()));
    results
}

/// Rebuilds coverage per test class by summing the lines of its methods.
/// Every class present in `tests` gets an entry, even with zero lines.
pub fn coverage_from_tests(tests: &TestResultMap) -> CoverageMap {
    let mut coverage = CoverageMap::new();
    for test in tests.values() {
        coverage
            .entry(test.class_name.clone())
            .or_insert_with(|| CoverageRecord::new(None, 0, 0))
            .absorb(test.covered_lines, test.uncovered_lines);
    }
    coverage
}

/// Zero-line records for every inventory item.
pub fn placeholder_coverage(inventory: &[ApexItem]) -> CoverageMap {
    inventory
        .iter()
        .map(|item| (item.name.clone(), CoverageRecord::placeholder(&item.id)))
        .collect()
}

/// Picks the first non-empty coverage source: aggregate rows, then
/// per-test coverage, then placeholders for the inventory.
///
/// 依次选择第一个非空的覆盖率来源：聚合记录、测试覆盖率、占位记录。
pub fn resolve_coverage(
    aggregate: &[AggregateRecord],
    tests: &TestResultMap,
    inventory: &[ApexItem],
) -> (CoverageMap, CoverageSource) {
    let coverage = process_coverage_data(aggregate);
    if !coverage.is_empty() {
        return (coverage, CoverageSource::Aggregate);
    }

    if !tests.is_empty() {
        info!("{}", t!("aggregate.building_from_tests"));
        let coverage = coverage_from_tests(tests);
        info!("{}", t!("aggregate.built_from_tests", count = coverage.len()));
        if !coverage.is_empty() {
            return (coverage, CoverageSource::TestResults);
        }
    }

    info!("{}", t!("aggregate.creating_placeholders"));
    (placeholder_coverage(inventory), CoverageSource::Placeholder)
}
