// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::commands::{self, check::CheckArgs};
use crate::infra::t;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` or `--lang=<VALUE>`.
pub fn pre_parse_language<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--lang" {
            return iter.next();
        }
        if let Some(value) = arg.strip_prefix("--lang=") {
            return Some(value.to_string());
        }
    }
    None
}

pub fn build_cli() -> Command {
    Command::new("apex-coverage")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("org")
                .long("org")
                .help(t!("cli.org").to_string())
                .value_name("ORG")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-tests")
                .long("no-tests")
                .help(t!("cli.no_tests").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .help(t!("cli.output").to_string())
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .help(t!("cli.csv").to_string())
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help(t!("cli.html").to_string())
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.verbose").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .help(t!("cli.workers").to_string())
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.config").to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about").to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.non_interactive").to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Maps parsed matches onto the check command's arguments.
pub fn check_args(matches: &ArgMatches) -> CheckArgs {
    CheckArgs {
        org: matches.get_one::<String>("org").cloned(),
        no_tests: matches.get_flag("no-tests"),
        output: matches.get_one::<PathBuf>("output").cloned(),
        csv: matches.get_one::<PathBuf>("csv").cloned(),
        html: matches.get_one::<PathBuf>("html").cloned(),
        verbose: matches.get_flag("verbose"),
        workers: matches.get_one::<usize>("workers").copied(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        lang: matches.get_one::<String>("lang").cloned(),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language(env::args());
    let language = match &explicit_language {
        Some(lang) => {
            rust_i18n::set_locale(lang);
            lang.clone()
        }
        None => crate::init(),
    };

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            if explicit_language.is_none() && !non_interactive {
                println!("🌐 {}", t!("cli.language_detected", lang = &language));
            }
            commands::init::run_init_wizard(&language, non_interactive)
        }
        _ => commands::check::execute(check_args(&matches)).await,
    }
}
