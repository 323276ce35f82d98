//! # Detection Module Unit Tests / Detect 模块单元测试
//!
//! This module contains unit tests for `detect.rs`: candidate directories,
//! executable checks, `sf_command` parsing and `--version` probing.
//!
//! 此模块包含 `detect.rs` 的单元测试：候选目录、可执行检查、
//! `sf_command` 解析和 `--version` 探测。

mod common;

use apex_coverage::infra::detect::{
    Platform, SfCliDetector, candidate_dirs, find_in_dir, is_executable, parse_command,
    version_looks_like_salesforce,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const LINUX: Platform = Platform {
    windows: false,
    wsl: false,
};
const WINDOWS: Platform = Platform {
    windows: true,
    wsl: false,
};

#[cfg(test)]
mod version_tests {
    use super::*;

    #[test]
    fn test_salesforce_version_strings() {
        assert!(version_looks_like_salesforce("@salesforce/cli/2.60.1 linux-x64 node-v20.11.0"));
        assert!(version_looks_like_salesforce("sfdx-cli/7.209.6 win32-x64 node-v18.15.0 (Salesforce)"));
        assert!(!version_looks_like_salesforce("sf version 1.0 (some other tool)"));
        assert!(!version_looks_like_salesforce(""));
    }
}

#[cfg(test)]
mod candidate_dir_tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_unix_dirs_include_home_and_npm_prefix() {
        let home = PathBuf::from("/home/dev");
        let prefix = PathBuf::from("/opt/node");
        let dirs = candidate_dirs(LINUX, Some(&home), Some(&prefix), no_env);

        assert_eq!(dirs[0], PathBuf::from("/usr/local/bin"));
        assert!(dirs.contains(&home.join(".local").join("bin")));
        assert!(dirs.contains(&home.join(".npm-global").join("bin")));
        assert!(dirs.contains(&prefix.join("bin")));
        assert!(dirs.contains(&prefix.join("lib").join("node_modules").join(".bin")));
        assert_eq!(dirs.last(), Some(&prefix));
    }

    #[test]
    fn test_windows_dirs_use_environment() {
        let env = |key: &str| match key {
            "PROGRAMFILES" => Some("D:\\Apps".to_string()),
            "USERPROFILE" => Some("C:\\Users\\dev".to_string()),
            _ => None,
        };
        let dirs = candidate_dirs(WINDOWS, None, None, env);

        assert!(dirs.contains(&Path::new("D:\\Apps").join("Salesforce CLI")));
        assert!(dirs.contains(&Path::new("C:\\Program Files (x86)").join("sfdx")));
        assert!(dirs.contains(&Path::new("C:\\Users\\dev").join("AppData").join("Roaming").join("npm")));
        assert!(!dirs.contains(&PathBuf::from("/usr/local/bin")));
    }

    #[test]
    fn test_duplicates_are_removed() {
        let prefix = PathBuf::from("/usr/local");
        let dirs = candidate_dirs(LINUX, None, Some(&prefix), no_env);
        let bin = PathBuf::from("/usr/local/bin");
        assert_eq!(dirs.iter().filter(|d| **d == bin).count(), 1);
    }

    #[test]
    fn test_executable_names_per_platform() {
        assert_eq!(LINUX.executable_names(), &["sf", "sfdx"]);
        assert!(WINDOWS.executable_names().contains(&"sf.cmd"));
        let wsl = Platform {
            windows: true,
            wsl: true,
        };
        assert!(!wsl.native_windows());
        assert_eq!(wsl.executable_names(), &["sf", "sfdx"]);
    }
}

#[cfg(test)]
mod executable_tests {
    use super::*;

    #[cfg(unix)]
    fn chmod(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(mode);
        fs::set_permissions(path, perms).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_bit_is_required_on_unix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sf");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        chmod(&path, 0o644);
        assert!(!is_executable(&path, LINUX));
        assert!(find_in_dir(dir.path(), LINUX).is_none());

        chmod(&path, 0o755);
        assert!(is_executable(&path, LINUX));
        assert_eq!(find_in_dir(dir.path(), LINUX), Some(path));
    }

    #[test]
    fn test_extension_is_enough_on_windows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sf.cmd");
        fs::write(&path, "@echo off\n").unwrap();
        assert!(is_executable(&path, WINDOWS));
        assert_eq!(find_in_dir(dir.path(), WINDOWS), Some(path));
    }

    #[test]
    fn test_directories_and_missing_files_are_not_executable() {
        let dir = tempdir().unwrap();
        assert!(!is_executable(dir.path(), LINUX));
        assert!(!is_executable(&dir.path().join("sf"), LINUX));
        assert!(find_in_dir(&dir.path().join("missing"), LINUX).is_none());
    }
}

#[cfg(test)]
mod parse_command_tests {
    use super::*;

    #[test]
    fn test_splits_words_and_quotes() {
        assert_eq!(parse_command("npx sf").unwrap(), vec!["npx", "sf"]);
        assert_eq!(
            parse_command("'/opt/my tools/sf' --dev-debug").unwrap(),
            vec!["/opt/my tools/sf", "--dev-debug"]
        );
    }

    #[test]
    fn test_expands_tilde_and_variables() {
        let expanded = parse_command("~/bin/sf").unwrap();
        assert_eq!(expanded.len(), 1);
        assert!(!expanded[0].starts_with('~'));
        assert!(expanded[0].ends_with("/bin/sf"));

        if let Ok(home) = std::env::var("HOME") {
            let from_env = parse_command("$HOME/sf").unwrap();
            assert_eq!(from_env, vec![format!("{home}/sf")]);
        }
    }

    #[test]
    fn test_rejects_bad_commands() {
        assert!(parse_command("").is_err());
        assert!(parse_command("   ").is_err());
        assert!(parse_command("'unterminated").is_err());
        assert!(parse_command("$APEX_COVERAGE_TEST_UNSET_VARIABLE/sf").is_err());
    }
}

#[cfg(all(test, unix))]
mod probe_tests {
    use super::*;
    use common::FakeSf;

    #[tokio::test]
    async fn test_probe_accepts_salesforce_cli() {
        let fake = FakeSf::new();
        let detector = SfCliDetector::with_platform(LINUX);
        assert!(detector.probe(&fake.command()).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_other_tools() {
        let fake = FakeSf::empty();
        fake.respond("version", "sf 0.1.0 (a different tool)");
        let detector = SfCliDetector::with_platform(LINUX);
        assert!(!detector.probe(&fake.command()).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_failures_and_missing_programs() {
        let fake = FakeSf::new();
        fake.exit_code("version", 1);
        let detector = SfCliDetector::with_platform(LINUX);
        assert!(!detector.probe(&fake.command()).await);
        assert!(!detector.probe(&["definitely-not-a-real-sf-binary".to_string()]).await);
        assert!(!detector.probe(&[]).await);
    }
}
