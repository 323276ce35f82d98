//! # Logging Module / 日志模块
//!
//! Installs the global `tracing` subscriber. Log lines go to stderr with a
//! local `YYYY-MM-DD HH:MM:SS` timestamp so the report on stdout stays clean.
//!
//! 安装全局 `tracing` 订阅器。日志输出到 stderr，
//! 以保证 stdout 上的报告内容干净。

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Filter directive used when `RUST_LOG` is not set.
/// Verbose runs show progress; quiet runs only warnings and errors.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn" }
}

/// Initializes logging once; later calls are ignored.
/// 初始化日志（仅一次）；之后的调用将被忽略。
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(std::io::stderr)
        .try_init();
}
