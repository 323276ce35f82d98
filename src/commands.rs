//! # Commands Module / 命令模块
//!
//! Implementations of the CLI commands: the coverage check and the
//! configuration wizard.
//!
//! CLI 命令的实现：覆盖率检查和配置向导。

pub mod check;
pub mod init;
