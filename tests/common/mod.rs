// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use apex_coverage::models::{
    AggregateRecord, ApexItem, ApexKind, NamedRef, TestCoverageRecord, TestResultRecord,
};

pub const VERSION_OUTPUT: &str = "@salesforce/cli/2.60.1 linux-x64 node-v20.11.0";

pub const ORG_JSON: &str = r#"{"status":0,"result":{"alias":"dev","username":"admin@example.com","instanceUrl":"https://example.my.salesforce.com","id":"00D000000000001"}}"#;

pub const CLASSES_JSON: &str = r#"{"status":0,"result":{"totalSize":4,"done":true,"records":[
  {"attributes":{"type":"ApexClass"},"Id":"01p000000000001","Name":"AccountService"},
  {"attributes":{"type":"ApexClass"},"Id":"01p000000000002","Name":"AccountServiceTest"},
  {"attributes":{"type":"ApexClass"},"Id":"01p000000000003","Name":"LegacyUtil"},
  {"attributes":{"type":"ApexClass"},"Id":"01p000000000004","Name":"OrderService"}]}}"#;

pub const TRIGGERS_JSON: &str = r#"{"status":0,"result":{"totalSize":1,"done":true,"records":[
  {"attributes":{"type":"ApexTrigger"},"Id":"01q000000000001","Name":"AccountTrigger"}]}}"#;

/// AccountService 45/50 (90%), OrderService 10/40 (25%), AccountTrigger 0/12.
pub const AGGREGATE_JSON: &str = r#"{"status":0,"result":{"totalSize":3,"done":true,"records":[
  {"ApexClassOrTrigger":{"Name":"AccountService","Id":"01p000000000001"},"NumLinesCovered":45,"NumLinesUncovered":5},
  {"ApexClassOrTrigger":{"Name":"AccountTrigger","Id":"01q000000000001"},"NumLinesCovered":0,"NumLinesUncovered":12},
  {"ApexClassOrTrigger":{"Name":"OrderService","Id":"01p000000000004"},"NumLinesCovered":10,"NumLinesUncovered":30}]}}"#;

pub const TEST_RESULTS_JSON: &str = r#"{"status":0,"result":{"totalSize":2,"done":true,"records":[
  {"ApexClass":{"Name":"AccountServiceTest"},"MethodName":"testCreate","Outcome":"Pass","RunTime":120,"Message":null,"StackTrace":null},
  {"ApexClass":{"Name":"AccountServiceTest"},"MethodName":"testUpdate","Outcome":"Fail","RunTime":80,"Message":"System.AssertException: Assertion Failed","StackTrace":"Class.AccountServiceTest.testUpdate: line 12"}]}}"#;

pub const TEST_COVERAGE_JSON: &str = r#"{"status":0,"result":{"totalSize":2,"done":true,"records":[
  {"ApexTestClass":{"Name":"AccountServiceTest"},"TestMethodName":"testCreate","CoveredLines":40,"UncoveredLines":10},
  {"ApexTestClass":{"Name":"AccountServiceTest"},"TestMethodName":"testUpdate","CoveredLines":5,"UncoveredLines":45}]}}"#;

pub const RUN_TESTS_JSON: &str = r#"{"status":100,"result":{"summary":{"outcome":"Failed","testsRan":2,"passing":1,"failing":1,"skipped":0,"testRunCoverage":"54%","testExecutionTimeInMs":"200"},"tests":[
  {"ApexClass":{"Name":"AccountServiceTest"},"MethodName":"testCreate","Outcome":"Pass","RunTime":120},
  {"ApexClass":{"Name":"AccountServiceTest"},"MethodName":"testUpdate","Outcome":"Fail","RunTime":80,"Message":"System.AssertException: Assertion Failed"}]}}"#;

pub const EMPTY_QUERY_JSON: &str = r#"{"status":0,"result":{"totalSize":0,"done":true,"records":[]}}"#;

/// A stand-in for the `sf` executable: a shell script answering each
/// command from files in its directory.
///
/// For a response named `org`, the script prints `org.out` to stdout,
/// `org.err` to stderr and exits with the code in `org.code` (default 0).
/// Every answer is bracketed by `start org` / `end org` lines in
/// `events.log`, so tests can see which commands were in flight together.
pub struct FakeSf {
    pub dir: TempDir,
    pub script: PathBuf,
}

impl FakeSf {
    /// A fake CLI answering every command with the standard fixtures.
    pub fn new() -> Self {
        let fake = Self::empty();
        fake.respond("version", VERSION_OUTPUT);
        fake.respond("org", ORG_JSON);
        fake.respond("classes", CLASSES_JSON);
        fake.respond("triggers", TRIGGERS_JSON);
        fake.respond("aggregate", AGGREGATE_JSON);
        fake.respond("test_results", TEST_RESULTS_JSON);
        fake.respond("test_coverage", TEST_COVERAGE_JSON);
        fake.respond("run_tests", RUN_TESTS_JSON);
        fake.exit_code("run_tests", 100);
        fake
    }

    /// A fake CLI with no responses configured.
    pub fn empty() -> Self {
        let dir = tempdir().expect("Failed to create temporary directory");
        let script = dir.path().join("sf");
        let content = format!(
            r#"#!/bin/sh
DIR='{dir}'
respond() {{
  echo "start $1" >> "$DIR/events.log"
  if [ -f "$DIR/$1.out" ]; then cat "$DIR/$1.out"; fi
  if [ -f "$DIR/$1.err" ]; then cat "$DIR/$1.err" >&2; fi
  if [ -f "$DIR/$1.delay" ]; then sleep "$(cat "$DIR/$1.delay")"; fi
  echo "end $1" >> "$DIR/events.log"
  if [ -f "$DIR/$1.code" ]; then exit "$(cat "$DIR/$1.code")"; fi
  exit 0
}}
echo "$*" >> "$DIR/calls.log"
case "$*" in
  *--version*) respond version ;;
  *"org display"*) respond org ;;
  *"apex run test"*) respond run_tests ;;
  *"FROM ApexClass WHERE"*) respond classes ;;
  *"FROM ApexTrigger WHERE"*) respond triggers ;;
  *"FROM ApexCodeCoverageAggregate"*) respond aggregate ;;
  *"FROM ApexTestResult"*) respond test_results ;;
  *"FROM ApexCodeCoverage WHERE"*) respond test_coverage ;;
esac
echo "unexpected arguments: $*" >&2
exit 2
"#,
            dir = dir.path().display()
        );
        write_executable(&script, &content);
        Self { dir, script }
    }

    pub fn respond(&self, name: &str, stdout: &str) {
        fs::write(self.dir.path().join(format!("{name}.out")), stdout).unwrap();
    }

    pub fn stderr(&self, name: &str, stderr: &str) {
        fs::write(self.dir.path().join(format!("{name}.err")), stderr).unwrap();
    }

    pub fn exit_code(&self, name: &str, code: i32) {
        fs::write(self.dir.path().join(format!("{name}.code")), code.to_string()).unwrap();
    }

    pub fn delay(&self, name: &str, seconds: u64) {
        fs::write(self.dir.path().join(format!("{name}.delay")), seconds.to_string()).unwrap();
    }

    /// Makes a command fail the way the CLI does: JSON error on stdout, exit 1.
    pub fn fail(&self, name: &str, message: &str) {
        self.respond(
            name,
            &format!(r#"{{"status":1,"name":"Error","message":"{message}"}}"#),
        );
        self.exit_code(name, 1);
    }

    pub fn command(&self) -> Vec<String> {
        vec![self.script.display().to_string()]
    }

    /// The calls the fake has answered, one argument line per call.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// `start <name>` / `end <name>` lines in the order the fake wrote them.
    pub fn events(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("events.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// The largest number of `names` answers that were running at once.
    pub fn max_in_flight(&self, names: &[&str]) -> usize {
        let mut running = 0usize;
        let mut peak = 0usize;
        for event in self.events() {
            match event.split_once(' ') {
                Some(("start", name)) if names.contains(&name) => {
                    running += 1;
                    peak = peak.max(running);
                }
                Some(("end", name)) if names.contains(&name) => {
                    running = running.saturating_sub(1);
                }
                _ => {}
            }
        }
        peak
    }

    /// Writes a `CoverageCheck.toml` pointing at this fake and returns its path.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("CoverageCheck.toml");
        let content = format!(
            "org = \"dev\"\nlanguage = \"en\"\nsf_command = '{}'\n{extra}\n",
            self.script.display()
        );
        fs::write(&path, content).unwrap();
        path
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, content).expect("Failed to write fake sf script");
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

#[cfg(not(unix))]
fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write fake sf script");
}

// --- In-memory record builders ---

pub fn named(name: &str, id: Option<&str>) -> Option<NamedRef> {
    Some(NamedRef {
        name: Some(name.to_string()),
        id: id.map(str::to_string),
    })
}

pub fn aggregate(name: &str, covered: u64, uncovered: u64) -> AggregateRecord {
    AggregateRecord {
        class_or_trigger: named(name, Some(&format!("id-{name}"))),
        num_lines_covered: covered,
        num_lines_uncovered: uncovered,
    }
}

pub fn test_result(class: &str, method: &str, outcome: &str, message: Option<&str>) -> TestResultRecord {
    TestResultRecord {
        apex_class: named(class, None),
        method_name: Some(method.to_string()),
        outcome: Some(outcome.to_string()),
        run_time: 10,
        message: message.map(str::to_string),
    }
}

pub fn test_coverage(class: &str, method: &str, covered: u64, uncovered: u64) -> TestCoverageRecord {
    TestCoverageRecord {
        apex_test_class: named(class, None),
        test_method_name: Some(method.to_string()),
        covered_lines: covered,
        uncovered_lines: uncovered,
    }
}

pub fn class(name: &str) -> ApexItem {
    ApexItem {
        name: name.to_string(),
        id: format!("01p-{name}"),
        kind: ApexKind::Class,
    }
}

pub fn trigger(name: &str) -> ApexItem {
    ApexItem {
        name: name.to_string(),
        id: format!("01q-{name}"),
        kind: ApexKind::Trigger,
    }
}
