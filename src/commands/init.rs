//! # Configuration Initialization Module / 配置初始化模块
//!
//! This module provides an interactive command-line wizard that writes a
//! `CoverageCheck.toml` file for the current directory.
//!
//! 此模块提供交互式命令行向导，为当前目录写入 `CoverageCheck.toml` 文件。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: asks for the org, worker count, threshold and test run
//! - **Non-interactive Mode**: writes the defaults without prompting
//! - **Overwrite Protection**: confirmation prompt before replacing an existing file
//!
//! - **交互式向导**: 询问组织、工作线程数、阈值以及是否运行测试
//! - **非交互模式**: 不提示直接写入默认配置
//! - **覆盖保护**: 替换现有文件前进行确认

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::config::{CheckConfig, DEFAULT_CONFIG_FILE};
use crate::infra::t;

/// Runs the wizard and writes `CoverageCheck.toml` in the current directory.
///
/// 运行向导并在当前目录写入 `CoverageCheck.toml`。
///
/// # Arguments / 参数
/// * `language` - Language recorded in the generated file
///                写入生成文件的语言
/// * `non_interactive` - Write defaults without any prompt, overwriting an existing file
///                       不提示直接写入默认值，会覆盖已有文件
pub fn run_init_wizard(language: &str, non_interactive: bool) -> Result<()> {
    run_init_wizard_at(Path::new(DEFAULT_CONFIG_FILE), language, non_interactive)
}

/// [`run_init_wizard`] with an explicit target path.
pub fn run_init_wizard_at(config_path: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let mut config = default_config(language);

    if non_interactive {
        return write_config(config_path, &config);
    }

    let theme = ColorfulTheme::default();
    println!("\n{}", t!("init.welcome").cyan().bold());
    println!("{}", t!("init.description"));

    if config_path.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", path = config_path.display()))
            .default(false)
            .interact()
            .with_context(|| t!("init.confirmation_failed").to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted"));
            return Ok(());
        }
    }

    let org: String = Input::with_theme(&theme)
        .with_prompt(t!("init.org_prompt"))
        .allow_empty(true)
        .interact_text()
        .with_context(|| t!("init.confirmation_failed").to_string())?;
    let org = org.trim();
    config.org = (!org.is_empty()).then(|| org.to_string());

    config.workers = Input::with_theme(&theme)
        .with_prompt(t!("init.workers_prompt"))
        .default(config.workers)
        .interact_text()
        .with_context(|| t!("init.confirmation_failed").to_string())?;

    config.coverage_threshold = Input::with_theme(&theme)
        .with_prompt(t!("init.threshold_prompt"))
        .default(config.coverage_threshold)
        .validate_with(|value: &f64| -> Result<(), String> {
            if (0.0..=100.0).contains(value) {
                Ok(())
            } else {
                Err(t!("init.threshold_invalid").to_string())
            }
        })
        .interact_text()
        .with_context(|| t!("init.confirmation_failed").to_string())?;

    config.run_tests = Confirm::with_theme(&theme)
        .with_prompt(t!("init.run_tests_prompt"))
        .default(config.run_tests)
        .interact()
        .with_context(|| t!("init.confirmation_failed").to_string())?;

    write_config(config_path, &config)
}

/// Defaults written by `init --non-interactive`.
pub fn default_config(language: &str) -> CheckConfig {
    CheckConfig {
        language: language.to_string(),
        ..CheckConfig::default()
    }
}

fn write_config(path: &Path, config: &CheckConfig) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .with_context(|| t!("init.serialize_failed").to_string())?;

    fs::write(path, toml_string)
        .with_context(|| t!("init.write_failed", path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint"));

    Ok(())
}
