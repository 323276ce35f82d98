//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the coverage check,
//! including command execution, Salesforce CLI detection and invocation,
//! logging, and i18n support.
//!
//! 此模块为覆盖率检查提供基础设施服务，
//! 包括命令执行、Salesforce CLI 检测与调用、日志和国际化支持。

pub mod command;
pub mod detect;
pub mod logging;
pub mod sf;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
