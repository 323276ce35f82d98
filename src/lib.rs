//! # Apex Coverage Library / Apex Coverage 库
//!
//! This library provides the core functionality for the Apex Coverage tool,
//! which drives the Salesforce CLI to run Apex tests and report org-wide
//! code coverage.
//!
//! 此库为 Apex Coverage 工具提供核心功能，
//! 该工具通过 Salesforce CLI 运行 Apex 测试并报告组织级代码覆盖率。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, configuration, query fan-out, aggregation and analysis
//! - `infra` - Infrastructure services like command execution, CLI detection and logging
//! - `reporting` - Text report, CSV/HTML exports and console summary
//! - `cli` - Command-line interface
//! - `commands` - The check and init commands
//! - `error` - Typed errors for CLI invocations
//!
//! - `core` - 数据模型、配置、查询分发、聚合和分析
//! - `infra` - 基础设施服务，如命令执行、CLI 检测和日志
//! - `reporting` - 文本报告、CSV/HTML 导出和控制台摘要
//! - `cli` - 命令行接口
//! - `commands` - 检查和初始化命令
//! - `error` - CLI 调用的类型化错误

pub mod cli;
pub mod commands;
pub mod core;
pub mod error;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::aggregation;
pub use crate::core::analysis;
pub use crate::core::config;
pub use crate::core::models;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's messages. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en"). Returns the locale set.
pub fn init() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let lang = match_locale(&locale, &rust_i18n::available_locales!()).to_string();
    rust_i18n::set_locale(&lang);
    lang
}

/// Picks the best of `available` for `locale`: exact, then language code, then `en`.
pub fn match_locale<'a>(locale: &'a str, available: &[&'a str]) -> &'a str {
    if available.contains(&locale) {
        return locale;
    }
    locale
        .split(['-', '_'])
        .next()
        .filter(|lang_code| available.contains(lang_code))
        .unwrap_or("en")
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
