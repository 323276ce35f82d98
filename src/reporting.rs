//! # Reporting Module / 报告模块
//!
//! This module renders the coverage check results: the plain-text report,
//! CSV and HTML exports, and a coloured summary on the console.
//!
//! 此模块渲染覆盖率检查结果：纯文本报告、CSV 和 HTML 导出，
//! 以及控制台上的彩色摘要。

pub mod console;
pub mod csv;
pub mod html;
pub mod text;

// Re-export common reporting functions
pub use console::print_summary;
pub use csv::{export_csv, render_csv};
pub use html::{generate_html_report, render_html};
pub use text::{ReportContext, render_report, write_report};
