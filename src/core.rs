//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the coverage check,
//! including data models, configuration, query fan-out, aggregation and
//! gap analysis.
//!
//! 此模块包含覆盖率检查的核心功能，
//! 包括数据模型、配置、查询分发、聚合和差距分析。

pub mod aggregation;
pub mod analysis;
pub mod config;
pub mod execution;
pub mod models;

// Re-exports
pub use aggregation::{CoverageMap, TestResultMap, coverage_percentage};
pub use analysis::{CoverageAnalysis, CoverageCategory, analyze_coverage_gaps};
pub use config::CheckConfig;
pub use models::{CoverageRecord, TestMethodResult};
