//! # Salesforce CLI Detection Module / Salesforce CLI 检测模块
//!
//! Locates a working `sf` (or legacy `sfdx`) installation on Windows,
//! macOS, Linux and WSL. Candidates are tried in order: plain commands on
//! `PATH`, `npx` wrappers, well-known install directories (including those
//! under the npm prefix), and finally a `which` lookup.
//!
//! 在 Windows、macOS、Linux 和 WSL 上定位可用的 `sf`（或旧版 `sfdx`）。
//! 候选项按顺序尝试：`PATH` 上的命令、`npx` 包装、常见安装目录
//! （包括 npm 前缀下的目录），最后使用 `which` 查找。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::infra::command;
use crate::infra::t;

/// Time allowed for each `--version` probe and for `npm config get prefix`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const SIMPLE_COMMANDS: &[&str] = &["sf", "sfdx"];
const NPX_COMMANDS: &[&[&str]] = &[
    &["npx", "sf"],
    &["npx", "@salesforce/cli"],
    &["npx", "sfdx"],
];
const UNIX_NAMES: &[&str] = &["sf", "sfdx"];
const WINDOWS_NAMES: &[&str] = &[
    "sf.exe", "sf.cmd", "sf.bat", "sf", "sfdx.exe", "sfdx.cmd", "sfdx.bat", "sfdx",
];
const WINDOWS_EXTENSIONS: &[&str] = &["exe", "cmd", "bat", "com"];

/// The host environment as far as detection cares.
/// 检测所关心的主机环境。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub windows: bool,
    /// Running under the Windows Subsystem for Linux.
    pub wsl: bool,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            windows: cfg!(windows),
            wsl: detect_wsl(),
        }
    }

    /// Windows proper, where executables are recognised by extension.
    pub fn native_windows(&self) -> bool {
        self.windows && !self.wsl
    }

    /// File names to look for inside a candidate directory.
    pub fn executable_names(&self) -> &'static [&'static str] {
        if self.native_windows() {
            WINDOWS_NAMES
        } else {
            UNIX_NAMES
        }
    }
}

fn detect_wsl() -> bool {
    fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Whether `--version` output identifies the Salesforce CLI.
pub fn version_looks_like_salesforce(stdout: &str) -> bool {
    stdout.to_lowercase().contains("salesforce")
}

/// Checks that `path` is a regular file the current platform would execute.
///
/// On native Windows the extension decides; elsewhere (WSL included) an
/// execute permission bit must be set.
pub fn is_executable(path: &Path, platform: Platform) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    if platform.native_windows() {
        let has_exe_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| WINDOWS_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        return has_exe_extension || has_execute_bit(&metadata);
    }
    has_execute_bit(&metadata)
}

#[cfg(unix)]
fn has_execute_bit(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bit(_metadata: &fs::Metadata) -> bool {
    false
}

/// First executable CLI binary inside `dir`, if any.
pub fn find_in_dir(dir: &Path, platform: Platform) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }
    info!(
        "{}",
        t!(
            "detect.searching_dir",
            names = platform.executable_names().join(", "),
            path = dir.display()
        )
    );
    platform
        .executable_names()
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| {
            let found = is_executable(candidate, platform);
            if !found && candidate.is_file() {
                debug!("{}", t!("detect.not_executable", path = candidate.display()));
            }
            found
        })
}

/// Directories worth searching, in priority order and without duplicates.
/// Existence is not checked here.
///
/// # Arguments
/// * `platform` - Host platform
/// * `home` - The user's home directory, when known
/// * `npm_prefix` - Output of `npm config get prefix`, when available
/// * `env` - Environment lookup, injected so the function stays pure
///
/// 按优先级排列且去重的候选目录。此处不检查目录是否存在。
pub fn candidate_dirs(
    platform: Platform,
    home: Option<&Path>,
    npm_prefix: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if platform.windows {
        let roots = [
            env("PROGRAMFILES").unwrap_or_else(|| "C:\\Program Files".to_string()),
            env("PROGRAMFILES(X86)").unwrap_or_else(|| "C:\\Program Files (x86)".to_string()),
            env("LOCALAPPDATA").unwrap_or_default(),
            env("APPDATA").unwrap_or_default(),
        ];
        for root in roots.iter().filter(|r| !r.is_empty()) {
            let root = Path::new(root);
            dirs.push(root.join("Salesforce CLI"));
            dirs.push(root.join("sfdx"));
            dirs.push(root.join("sf"));
            dirs.push(root.join("nodejs"));
            dirs.push(root.join("npm").join("node_modules").join(".bin"));
            dirs.push(root.join("npm").join("node_modules").join("@salesforce").join("cli").join("bin"));
        }
        if let Some(profile) = env("USERPROFILE").filter(|p| !p.is_empty()) {
            let profile = Path::new(&profile);
            let roaming_npm = profile.join("AppData").join("Roaming").join("npm");
            dirs.push(roaming_npm.clone());
            dirs.push(roaming_npm.join("node_modules").join(".bin"));
            dirs.push(profile.join(".npm-global").join("bin"));
            dirs.push(profile.join("scoop").join("apps").join("salesforce-cli"));
            dirs.push(profile.join("scoop").join("shims"));
        }
    } else {
        for fixed in [
            "/usr/local/bin",
            "/usr/bin",
            "/bin",
            "/opt/sf/bin",
            "/opt/salesforce/bin",
        ] {
            dirs.push(PathBuf::from(fixed));
        }
        if let Some(home) = home {
            dirs.push(home.join(".local").join("bin"));
            dirs.push(home.join(".npm-global").join("bin"));
            dirs.push(home.join("node_modules").join(".bin"));
        }
        dirs.push(PathBuf::from("/usr/local/lib/node_modules/.bin"));
        dirs.push(PathBuf::from("/usr/lib/node_modules/.bin"));
    }

    if let Some(prefix) = npm_prefix {
        dirs.push(prefix.join("bin"));
        dirs.push(prefix.join("node_modules").join(".bin"));
        dirs.push(prefix.join("lib").join("node_modules").join(".bin"));
        dirs.push(prefix.join("node_modules").join("@salesforce").join("cli").join("bin"));
        dirs.push(prefix.join("lib").join("node_modules").join("@salesforce").join("cli").join("bin"));
        dirs.push(prefix.join("node_modules").join("sfdx").join("bin"));
        dirs.push(prefix.join("lib").join("node_modules").join("sfdx").join("bin"));
        dirs.push(prefix.to_path_buf());
    }

    let mut unique: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !unique.contains(&dir) {
            unique.push(dir);
        }
    }
    unique
}

/// Turns a configured command such as `"npx sf"` or `"~/bin/sf"` into argv.
/// Environment variables and `~` are expanded before splitting.
///
/// 将配置的命令（如 `"npx sf"`）转换为参数列表。拆分前会展开环境变量和 `~`。
pub fn parse_command(raw: &str) -> Result<Vec<String>> {
    let expanded = shellexpand::full(raw)
        .with_context(|| t!("detect.expand_failed", command = raw).to_string())?
        .to_string();
    let parts = shlex::split(&expanded)
        .ok_or_else(|| {
            anyhow::anyhow!("{}", t!("detect.parse_failed", command = expanded.as_str()))
        })?;
    if parts.is_empty() {
        anyhow::bail!("{}", t!("detect.empty_command"));
    }
    Ok(parts)
}

/// Finds the Salesforce CLI by probing candidates with `--version`.
#[derive(Debug, Clone)]
pub struct SfCliDetector {
    platform: Platform,
    probe_timeout: Duration,
}

impl Default for SfCliDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SfCliDetector {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self {
            platform,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Returns the argv prefix of a working CLI, or `None` when nothing
    /// answered `--version` like the Salesforce CLI.
    ///
    /// 返回可用 CLI 的参数前缀；若没有候选项像 Salesforce CLI 一样响应
    /// `--version`，则返回 `None`。
    pub async fn detect(&self) -> Option<Vec<String>> {
        info!(
            "{}",
            t!(
                "detect.start",
                os = std::env::consts::OS,
                wsl = self.platform.wsl
            )
        );

        for name in SIMPLE_COMMANDS {
            let cmd = vec![name.to_string()];
            if self.probe(&cmd).await {
                info!("{}", t!("detect.found_simple", command = *name));
                return Some(cmd);
            }
        }

        for parts in NPX_COMMANDS {
            let cmd: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
            if self.probe(&cmd).await {
                info!("{}", t!("detect.found_npx", command = cmd.join(" ")));
                return Some(cmd);
            }
        }

        let npm_prefix = self.npm_prefix().await;
        let home = dirs::home_dir();
        let search_dirs: Vec<PathBuf> =
            candidate_dirs(self.platform, home.as_deref(), npm_prefix.as_deref(), |key| {
                std::env::var(key).ok()
            })
            .into_iter()
            .filter(|d| d.exists())
            .collect();
        info!("{}", t!("detect.search_count", count = search_dirs.len()));

        for dir in &search_dirs {
            if let Some(executable) = find_in_dir(dir, self.platform) {
                let cmd = vec![executable.display().to_string()];
                if self.probe(&cmd).await {
                    info!("{}", t!("detect.found_path", path = executable.display()));
                    return Some(cmd);
                }
            }
        }

        let mut names: Vec<&str> = SIMPLE_COMMANDS.to_vec();
        if self.platform.native_windows() {
            names.extend(["sf.exe", "sf.cmd", "sf.bat", "sfdx.exe", "sfdx.cmd", "sfdx.bat"]);
        }
        for name in names {
            if let Ok(found) = which::which(name) {
                let cmd = vec![found.display().to_string()];
                if self.probe(&cmd).await {
                    info!("{}", t!("detect.found_which", path = found.display()));
                    return Some(cmd);
                }
            }
        }

        info!("{}", t!("detect.not_found"));
        None
    }

    /// Runs `<cmd> --version` and checks the answer.
    pub async fn probe(&self, cmd: &[String]) -> bool {
        let Some((program, rest)) = cmd.split_first() else {
            return false;
        };
        let mut args = rest.to_vec();
        args.push("--version".to_string());

        match command::run_with_timeout(program, &args, self.probe_timeout).await {
            Ok(output) => {
                let ok = output.success() && version_looks_like_salesforce(&output.stdout);
                if !ok {
                    debug!(
                        "{}",
                        t!(
                            "detect.probe_failed",
                            command = cmd.join(" "),
                            code = format!("{:?}", output.code)
                        )
                    );
                }
                ok
            }
            Err(e) => {
                debug!("{}", t!("detect.probe_error", command = cmd.join(" "), error = e));
                false
            }
        }
    }

    async fn npm_prefix(&self) -> Option<PathBuf> {
        let args = vec!["config".to_string(), "get".to_string(), "prefix".to_string()];
        match command::run_with_timeout("npm", &args, self.probe_timeout).await {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                let prefix = output.stdout.trim().to_string();
                info!("{}", t!("detect.npm_prefix", prefix = prefix.as_str()));
                Some(PathBuf::from(prefix))
            }
            Ok(_) => None,
            Err(e) => {
                debug!("{}", t!("detect.npm_prefix_failed", error = e));
                None
            }
        }
    }
}
