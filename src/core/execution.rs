//! # Query Execution Module / 查询执行模块
//!
//! Fans the independent, read-only org queries out over a bounded pool of
//! concurrent CLI invocations. A failed query is logged and contributes an
//! empty result; it never aborts its siblings.
//!
//! 将相互独立的只读组织查询分发到有界的并发 CLI 调用池中。
//! 失败的查询会被记录并返回空结果，不会中止其他查询。

use futures::{StreamExt, stream};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::models::{
    AggregateRecord, ApexItem, ApexKind, TestCoverageRecord, TestResultRecord,
};
use crate::infra::sf::SfClient;
use crate::infra::t;

/// The coverage-related queries issued after the (optional) test run.
/// 测试运行之后发出的覆盖率相关查询。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageQuery {
    /// Per class/trigger line totals.
    Aggregate,
    /// Outcome of every test method.
    TestResults,
    /// Lines covered by each test method.
    TestCoverage,
}

impl CoverageQuery {
    pub const ALL: [CoverageQuery; 3] = [
        CoverageQuery::Aggregate,
        CoverageQuery::TestResults,
        CoverageQuery::TestCoverage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CoverageQuery::Aggregate => "aggregate",
            CoverageQuery::TestResults => "test_results",
            CoverageQuery::TestCoverage => "test_coverage",
        }
    }

    pub fn soql(&self) -> &'static str {
        match self {
            CoverageQuery::Aggregate => {
                "SELECT ApexClassOrTrigger.Name, ApexClassOrTrigger.Id, NumLinesCovered, NumLinesUncovered \
                 FROM ApexCodeCoverageAggregate WHERE ApexClassOrTrigger.NamespacePrefix = null \
                 ORDER BY ApexClassOrTrigger.Name"
            }
            CoverageQuery::TestResults => {
                "SELECT ApexClass.Name, MethodName, Outcome, RunTime, Message, StackTrace \
                 FROM ApexTestResult ORDER BY ApexClass.Name, MethodName"
            }
            CoverageQuery::TestCoverage => {
                "SELECT ApexTestClass.Name, TestMethodName, SUM(NumLinesCovered) CoveredLines, \
                 SUM(NumLinesUncovered) UncoveredLines FROM ApexCodeCoverage \
                 WHERE ApexTestClass.NamespacePrefix = null \
                 GROUP BY ApexTestClass.Name, TestMethodName \
                 ORDER BY ApexTestClass.Name, TestMethodName"
            }
        }
    }
}

/// Decoded results of the coverage queries. A failed query leaves its
/// slot empty.
#[derive(Debug, Clone, Default)]
pub struct CoverageQueryResults {
    pub aggregate: Vec<AggregateRecord>,
    pub test_results: Vec<TestResultRecord>,
    pub test_coverage: Vec<TestCoverageRecord>,
}

impl CoverageQueryResults {
    /// Nothing usable came back: no aggregate rows and no test results.
    pub fn is_empty(&self) -> bool {
        self.aggregate.is_empty() && self.test_results.is_empty()
    }
}

/// Runs one query, turning any failure into an empty record list.
async fn execute_query(client: &SfClient, query: CoverageQuery) -> (CoverageQuery, Vec<Value>) {
    match client.query(query.soql()).await {
        Ok(records) => {
            info!(
                "{}",
                t!("execution.query_records", count = records.len(), query = query.name())
            );
            (query, records)
        }
        Err(e) => {
            warn!("{}", t!("execution.query_failed", query = query.name(), error = e));
            (query, Vec::new())
        }
    }
}

/// Decodes raw records, skipping (and logging) rows that do not fit `T`.
pub fn decode_records<T: DeserializeOwned>(query: &str, records: Vec<Value>) -> Vec<T> {
    let mut decoded = Vec::with_capacity(records.len());
    for value in records {
        match serde_json::from_value::<T>(value) {
            Ok(record) => decoded.push(record),
            Err(e) => warn!("{}", t!("execution.record_skipped", query = query, error = e)),
        }
    }
    decoded
}

/// Issues all [`CoverageQuery`] variants with at most `workers` running at
/// once and collects them as they complete.
///
/// # Arguments
/// * `client` - Shared CLI client
/// * `workers` - Maximum concurrent CLI processes (values below 1 act as 1)
///
/// 以最多 `workers` 个并发执行所有 [`CoverageQuery`]，并在完成时收集结果。
pub async fn fetch_coverage_data(client: Arc<SfClient>, workers: usize) -> CoverageQueryResults {
    info!("{}", t!("execution.retrieving_coverage"));

    let tasks = stream::iter(CoverageQuery::ALL.into_iter().map(|query| {
        let client = Arc::clone(&client);
        tokio::spawn(async move { execute_query(&client, query).await })
    }));

    let completed: Vec<_> = tasks.buffer_unordered(workers.max(1)).collect().await;

    let mut results = CoverageQueryResults::default();
    for joined in completed {
        let (query, records) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!("{}", t!("execution.task_failed", error = e));
                continue;
            }
        };
        match query {
            CoverageQuery::Aggregate => results.aggregate = decode_records(query.name(), records),
            CoverageQuery::TestResults => {
                results.test_results = decode_records(query.name(), records)
            }
            CoverageQuery::TestCoverage => {
                results.test_coverage = decode_records(query.name(), records)
            }
        }
    }
    results
}

/// Lists classes and triggers concurrently. Either list is empty when its
/// query fails.
///
/// 并发列出类和触发器。任一查询失败时对应列表为空。
pub async fn fetch_inventory(client: &SfClient) -> (Vec<ApexItem>, Vec<ApexItem>) {
    let (classes, triggers) = tokio::join!(
        fetch_items(client, ApexKind::Class),
        fetch_items(client, ApexKind::Trigger)
    );
    (classes, triggers)
}

async fn fetch_items(client: &SfClient, kind: ApexKind) -> Vec<ApexItem> {
    info!("{}", t!("execution.retrieving_items", kind = kind.sobject()));
    match client.apex_items(kind).await {
        Ok(items) => {
            info!("{}", t!("execution.found_items", count = items.len(), kind = kind.sobject()));
            items
        }
        Err(e) => {
            tracing::error!("{}", t!("execution.items_failed", kind = kind.sobject(), error = e));
            Vec::new()
        }
    }
}
