//! # Check Command Module / 检查命令模块
//!
//! This module implements the default command of the CLI: verify the
//! Salesforce CLI and org, optionally run the org's tests, collect coverage
//! through the worker pool, and write the report and exports.
//!
//! 此模块实现 CLI 的默认命令：验证 Salesforce CLI 和组织，
//! 可选地运行组织测试，通过工作池收集覆盖率，并写出报告和导出文件。

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::aggregation::{
    CoverageMap, CoverageSource, TestResultMap, process_test_results, resolve_coverage,
};
use crate::core::analysis::{CoverageAnalysis, analyze_coverage_gaps};
use crate::core::config::{CheckConfig, resolve_workers};
use crate::core::execution::{fetch_coverage_data, fetch_inventory};
use crate::core::models::{ApexItem, OrgInfo, TestRun};
use crate::error::SfError;
use crate::infra::detect::{SfCliDetector, parse_command};
use crate::infra::sf::SfClient;
use crate::infra::{logging, t};
use crate::reporting::text::TIMESTAMP_FORMAT;
use crate::reporting::{
    ReportContext, export_csv, generate_html_report, print_summary, render_report, write_report,
};

/// Arguments of the check command as given on the command line.
/// 命令行上给出的检查命令参数。
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub org: Option<String>,
    pub no_tests: bool,
    pub output: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub verbose: bool,
    /// `Some(0)` behaves like `None`.
    pub workers: Option<usize>,
    pub config: Option<PathBuf>,
    /// Set when `--lang` was passed; the config's `language` is ignored then.
    pub lang: Option<String>,
}

/// Options of one coverage check after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    pub org: String,
    pub run_tests: bool,
    pub workers: usize,
    pub coverage_threshold: f64,
    pub test_level: String,
    pub wait_minutes: u64,
    pub command_timeout: Duration,
    pub sf_command: Option<String>,
}

impl CheckOptions {
    /// Flags win over the config file; `--org` is required unless the
    /// config names one.
    ///
    /// 命令行参数优先于配置文件；除非配置中指定了组织，否则必须提供 `--org`。
    pub fn resolve(args: &CheckArgs, config: &CheckConfig) -> Result<Self> {
        let org = args
            .org
            .clone()
            .or_else(|| config.org.clone())
            .filter(|org| !org.trim().is_empty())
            .ok_or_else(|| anyhow!("{}", t!("check.missing_org")))?;

        let workers = match args.workers {
            Some(n) if n > 0 => n,
            _ => resolve_workers(config.workers),
        };

        Ok(Self {
            org,
            run_tests: config.run_tests && !args.no_tests,
            workers,
            coverage_threshold: config.coverage_threshold,
            test_level: config.test_level.clone(),
            wait_minutes: config.wait_minutes,
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            sf_command: config.sf_command.clone(),
        })
    }
}

/// Everything a finished check produced, ready to be rendered.
/// 一次完成的检查所产生的全部数据，可直接用于渲染。
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub org: OrgInfo,
    pub inventory: Vec<ApexItem>,
    pub test_run: Option<TestRun>,
    pub tests: TestResultMap,
    pub coverage: CoverageMap,
    pub source: CoverageSource,
    pub analysis: CoverageAnalysis,
}

impl CheckOutcome {
    pub fn report_context<'a>(&'a self, org_alias: &'a str, generated_at: &'a str) -> ReportContext<'a> {
        ReportContext {
            generated_at,
            org_alias,
            org: &self.org,
            coverage: &self.coverage,
            analysis: &self.analysis,
            tests: &self.tests,
            test_run: self.test_run.as_ref(),
        }
    }
}

/// Executes the check command end to end, stopping on Ctrl-C.
///
/// # Arguments
/// * `args` - Parsed command-line arguments
///
/// # Returns
/// `Ok(())` when the report was produced; an error for every failure that
/// aborts the run, including Ctrl-C.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let stop_token = setup_signal_handler();
    execute_until_cancelled(args, stop_token).await
}

/// Same as [`execute`], with the caller owning the cancellation token.
///
/// Cancelling the token at any point before the report is rendered, CLI
/// detection included, drops the in-flight work and fails with the
/// "cancelled by user" message.
///
/// 与 [`execute`] 相同，但由调用方持有取消令牌。在渲染报告之前的任何时刻
/// （包括 CLI 检测阶段）取消令牌，都会丢弃进行中的工作并返回"用户取消"错误。
pub async fn execute_until_cancelled(
    args: CheckArgs,
    stop_token: CancellationToken,
) -> Result<()> {
    let (config, config_path) = CheckConfig::load(args.config.as_deref())?;
    if args.lang.is_none() && config_path.is_some() {
        rust_i18n::set_locale(&config.language);
    }
    logging::init(args.verbose);
    if let Some(path) = &config_path {
        info!("{}", t!("check.config_loaded", path = path.display()));
    }

    let options = CheckOptions::resolve(&args, &config)?;
    let started = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = stop_token.cancelled() => {
            anyhow::bail!("{}", t!("check.cancelled"));
        }
        outcome = async {
            let client = Arc::new(build_client(&options).await?);
            run_comprehensive_check(client, &options).await
        } => outcome?,
    };

    let generated_at = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let ctx = outcome.report_context(&options.org, &generated_at);

    let report = render_report(&ctx);
    let written_to_file = write_report(&report, args.output.as_deref());

    if let Some(path) = &args.csv {
        if let Err(e) = export_csv(&outcome.coverage, path) {
            error!("{e:#}");
        }
    }
    if let Some(path) = &args.html {
        if let Err(e) = generate_html_report(&ctx, path) {
            error!("{e:#}");
        }
    }

    if written_to_file {
        print_summary(&outcome.analysis, &outcome.org);
        if let Some(path) = &args.output {
            println!("\n{}", t!("check.report_location", path = path.display()).cyan());
        }
    }

    info!(
        "{}",
        t!("check.completed", seconds = format!("{:.2}", started.elapsed().as_secs_f64()))
    );
    Ok(())
}

/// Uses the configured `sf_command` when set, otherwise detects the CLI.
async fn build_client(options: &CheckOptions) -> Result<SfClient> {
    let command = match &options.sf_command {
        Some(raw) => parse_command(raw)?,
        None => {
            info!("{}", t!("check.detecting_cli"));
            SfCliDetector::new()
                .detect()
                .await
                .ok_or(SfError::NotFound)
                .with_context(|| t!("check.cli_not_found").to_string())?
        }
    };
    Ok(SfClient::new(command, options.org.clone())?
        .with_timeout(options.command_timeout)
        .with_test_level(options.test_level.clone())
        .with_wait_minutes(options.wait_minutes))
}

/// Cancels the returned token on Ctrl-C.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", t!("check.shutdown_signal").yellow());
            token_clone.cancel();
        }
    });

    token
}

/// Runs every step of the check and returns the analysed result.
///
/// Steps, in order: CLI version, org display, inventory, optional test run,
/// coverage queries, coverage resolution and gap analysis. Missing CLI,
/// unreachable org, empty inventory and "no coverage data at all" abort the
/// check; a failed test run only logs a warning.
///
/// 按顺序执行：CLI 版本、组织信息、清单、可选的测试运行、覆盖率查询、
/// 覆盖率解析和差距分析。CLI 缺失、组织不可达、清单为空以及完全没有
/// 覆盖率数据时中止检查；测试运行失败只记录警告。
pub async fn run_comprehensive_check(
    client: Arc<SfClient>,
    options: &CheckOptions,
) -> Result<CheckOutcome> {
    info!("{}", t!("check.starting", org = options.org));

    let version = client
        .version()
        .await
        .with_context(|| t!("check.cli_unavailable").to_string())?;
    info!("{}", t!("check.cli_version", version = version));

    let org = client
        .display_org()
        .await
        .with_context(|| {
            t!(
                "check.org_unavailable",
                org = options.org,
                command = client.command_line()
            )
            .to_string()
        })?;
    info!("{}", t!("check.org_connected", name = org.org_name, url = org.org_url));

    let (classes, triggers) = fetch_inventory(&client).await;
    if classes.is_empty() && triggers.is_empty() {
        warn!("{}", t!("check.no_inventory"));
        anyhow::bail!("{}", t!("check.no_inventory"));
    }
    let mut inventory = classes;
    inventory.extend(triggers);

    let test_run = if options.run_tests {
        info!("{}", t!("check.running_tests", level = options.test_level));
        match client.run_tests().await {
            Ok(run) => {
                if let Some(summary) = &run.summary {
                    info!(
                        "{}",
                        t!(
                            "check.test_summary",
                            ran = summary.tests_ran,
                            passed = summary.passing,
                            failed = summary.failing,
                            coverage = format!("{:.2}", summary.test_run_coverage)
                        )
                    );
                }
                Some(run)
            }
            Err(e) => {
                warn!("{}", t!("check.tests_failed", error = e));
                None
            }
        }
    } else {
        info!("{}", t!("check.skipping_tests"));
        None
    };

    let results = fetch_coverage_data(Arc::clone(&client), options.workers).await;
    if results.is_empty() {
        error!("{}", t!("check.no_coverage_data"));
        anyhow::bail!("{}", t!("check.no_coverage_data"));
    }

    let tests = process_test_results(&results.test_results, &results.test_coverage);
    let (coverage, source) = resolve_coverage(&results.aggregate, &tests, &inventory);
    let analysis = analyze_coverage_gaps(&coverage, &inventory, options.coverage_threshold);

    Ok(CheckOutcome {
        org,
        inventory,
        test_run,
        tests,
        coverage,
        source,
        analysis,
    })
}

