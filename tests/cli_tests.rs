//! # Command-Line Tests / 命令行测试
//!
//! These tests run the compiled `apex-coverage` binary. The end-to-end runs
//! point `sf_command` at a fake CLI script, so they are Unix-only.
//!
//! 这些测试运行编译后的 `apex-coverage` 二进制文件。端到端运行通过
//! `sf_command` 指向模拟的 CLI 脚本，因此仅在 Unix 上运行。

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// The binary with `--lang en` placed last, so it also reaches subcommands.
fn apex_coverage(args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("apex-coverage").unwrap();
    cmd.args(args).arg("--lang").arg("en");
    cmd
}

/// `--help` lists the check flags and the `init` subcommand.
///
/// `--help` 列出检查参数和 `init` 子命令。
#[test]
fn test_help_lists_flags() {
    apex_coverage(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--org"))
        .stdout(predicate::str::contains("--no-tests"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("init"));
}

/// Without `--org` and without a config naming one, the run fails before
/// any CLI call.
///
/// 既没有 `--org` 也没有配置指定组织时，运行会在调用 CLI 之前失败。
#[test]
fn test_missing_org_fails() {
    let dir = tempdir().unwrap();
    apex_coverage(&[])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No org given"));
}

/// A config file that is not valid TOML aborts the run.
///
/// 不是有效 TOML 的配置文件会中止运行。
#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "org = \n").unwrap();

    apex_coverage(&["--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse the config file"));
}

/// `init --non-interactive` writes a loadable `CoverageCheck.toml`.
///
/// `init --non-interactive` 写入可加载的 `CoverageCheck.toml`。
#[test]
fn test_init_non_interactive_writes_config() {
    let dir = tempdir().unwrap();
    apex_coverage(&["init", "--non-interactive"])
        .current_dir(dir.path())
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("CoverageCheck.toml")).unwrap();
    assert!(content.contains("language = \"en\""));
    assert!(content.contains("run_tests = true"));
}

#[cfg(unix)]
mod end_to_end_tests {
    use super::*;
    use common::FakeSf;

    /// A full run writes the report file, the CSV export and the HTML
    /// export, then prints the console summary.
    ///
    /// 完整运行会写入报告文件、CSV 和 HTML 导出，然后打印控制台摘要。
    #[test]
    fn test_full_run_writes_all_outputs() {
        let fake = FakeSf::new();
        let config = fake.write_config("workers = 2");
        let out = tempdir().unwrap();
        let report = out.path().join("report.txt");
        let csv = out.path().join("coverage.csv");
        let html = out.path().join("coverage.html");

        apex_coverage(&[
            "--config",
            config.to_str().unwrap(),
            "--output",
            report.to_str().unwrap(),
            "--csv",
            csv.to_str().unwrap(),
            "--html",
            html.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("53.92%"));

        let text = fs::read_to_string(&report).unwrap();
        assert!(text.contains("SALESFORCE CODE COVERAGE REPORT"));
        assert!(text.contains("Org Url: https://example.my.salesforce.com"));
        assert!(text.contains("TEST EXECUTION SUMMARY:"));

        let csv_text = fs::read_to_string(&csv).unwrap();
        assert!(csv_text.starts_with("Name,Coverage_Percentage,Covered_Lines,Total_Lines,Uncovered_Lines"));
        assert!(csv_text.contains("OrderService,25.00,10,40,30"));

        let html_text = fs::read_to_string(&html).unwrap();
        assert!(html_text.contains("AccountService"));
    }

    /// Without `--output` the report goes to stdout.
    ///
    /// 未指定 `--output` 时报告输出到 stdout。
    #[test]
    fn test_report_on_stdout_with_no_tests() {
        let fake = FakeSf::new();
        let config = fake.write_config("");

        apex_coverage(&["--config", config.to_str().unwrap(), "--no-tests"])
            .assert()
            .success()
            .stdout(predicate::str::contains("SALESFORCE CODE COVERAGE REPORT"))
            .stdout(predicate::str::contains("Total Coverage for Org: 53.92%"));

        assert!(!fake.calls().iter().any(|c| c.contains("apex run test")));
    }

    /// The `--org` flag overrides the org from the config file.
    ///
    /// `--org` 参数覆盖配置文件中的组织。
    #[test]
    fn test_org_flag_overrides_config() {
        let fake = FakeSf::new();
        let config = fake.write_config("run_tests = false");

        apex_coverage(&["--config", config.to_str().unwrap(), "--org", "uat"])
            .assert()
            .success();

        assert!(fake.calls().iter().any(|c| c.contains("--target-org uat")));
        assert!(!fake.calls().iter().any(|c| c.contains("--target-org dev")));
    }

    /// `-v` shows each CLI invocation and the test-run totals on stderr.
    ///
    /// `-v` 在 stderr 上显示每次 CLI 调用和测试运行汇总。
    #[test]
    fn test_verbose_shows_cli_calls_and_test_totals() {
        let fake = FakeSf::new();
        let config = fake.write_config("");

        apex_coverage(&["--config", config.to_str().unwrap(), "-v"])
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stderr(predicate::str::contains("Running: "))
            .stderr(predicate::str::contains("org display"))
            .stderr(predicate::str::contains(
                "Tests ran: 2, passed: 1, failed: 1, test run coverage: 54.00%",
            ));
    }

    /// Without `-v` the CLI invocations stay out of the log.
    ///
    /// 不带 `-v` 时日志中不显示 CLI 调用。
    #[test]
    fn test_quiet_run_hides_cli_calls() {
        let fake = FakeSf::new();
        let config = fake.write_config("run_tests = false");

        apex_coverage(&["--config", config.to_str().unwrap()])
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stderr(predicate::str::contains("Running: ").not());
    }

    /// An org the CLI cannot reach makes the process exit non-zero.
    ///
    /// CLI 无法访问的组织会使进程以非零状态退出。
    #[test]
    fn test_unreachable_org_fails() {
        let fake = FakeSf::new();
        fake.fail("org", "No authorization information found for dev.");
        let config = fake.write_config("");

        apex_coverage(&["--config", config.to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No authorization information found"));
    }
}
