// Process invocation: run adb, capture output and exit code
use super::error::{AdbError, AdbResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Merge stderr into stdout and split into lines.
    Text,
    /// Binary-safe stdout, never split.
    Raw,
}

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub mode: CaptureMode,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, mode: CaptureMode) -> Self {
        Self {
            program: program.into(),
            args,
            mode,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human readable command line for logs and error messages.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Lines(Vec<String>),
    Raw(Vec<u8>),
}

/// Captured output plus exit code of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: Output,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn text(lines: Vec<String>, exit_code: Option<i32>) -> Self {
        Self {
            output: Output::Lines(lines),
            exit_code,
        }
    }

    pub fn raw(bytes: Vec<u8>, exit_code: Option<i32>) -> Self {
        Self {
            output: Output::Raw(bytes),
            exit_code,
        }
    }

    /// True iff the recorded exit code equals `target`.
    pub fn judge(&self, target: i32) -> bool {
        self.exit_code == Some(target)
    }

    pub fn succeeded(&self) -> bool {
        self.judge(0)
    }

    /// Captured lines; empty for raw captures.
    pub fn lines(&self) -> &[String] {
        match &self.output {
            Output::Lines(lines) => lines,
            Output::Raw(_) => &[],
        }
    }

    pub fn first_line(&self) -> Option<&str> {
        self.lines().first().map(String::as_str)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self.output {
            Output::Raw(bytes) => bytes,
            Output::Lines(lines) => lines.join("\n").into_bytes(),
        }
    }

    /// Output rendered back to a single string.
    pub fn joined(&self) -> String {
        match &self.output {
            Output::Lines(lines) => lines.join("\n"),
            Output::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Split captured text into lines. Trailing line separators are dropped,
/// internal blank lines are kept.
pub fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Append stderr after stdout, keeping a line break between them so the
/// last stdout line is not glued to the first stderr line.
fn merge_streams(mut stdout: Vec<u8>, stderr: &[u8]) -> Vec<u8> {
    if stderr.is_empty() {
        return stdout;
    }
    if !stdout.is_empty() && !stdout.ends_with(b"\n") {
        stdout.push(b'\n');
    }
    stdout.extend_from_slice(stderr);
    stdout
}

// Seam between the adb façade and the host process launcher
#[allow(async_fn_in_trait)]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> AdbResult<CommandOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> AdbResult<CommandOutput> {
        let command_line = invocation.command_line();
        log::debug!("exec: {}", command_line);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let pending = cmd.output();
        let result = match invocation.timeout {
            Some(duration) => tokio::time::timeout(duration, pending).await.map_err(|_| {
                AdbError::Timeout {
                    command: command_line.clone(),
                    duration,
                }
            })?,
            None => pending.await,
        };
        let output = result.map_err(|source| AdbError::SpawnFailed {
            command: command_line.clone(),
            source,
        })?;

        let exit_code = output.status.code();
        log::debug!("exit: {:?} <- {}", exit_code, command_line);

        Ok(match invocation.mode {
            CaptureMode::Raw => {
                if !output.stderr.is_empty() {
                    log::debug!(
                        "stderr from raw capture: {}",
                        String::from_utf8_lossy(&output.stderr).trim_end()
                    );
                }
                CommandOutput::raw(output.stdout, exit_code)
            }
            CaptureMode::Text => {
                let merged = merge_streams(output.stdout, &output.stderr);
                CommandOutput::text(split_lines(&String::from_utf8_lossy(&merged)), exit_code)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_trailing_newline_only() {
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b"]);
        assert!(split_lines("").is_empty());
        assert!(split_lines("\n\n").is_empty());
        assert_eq!(split_lines("  padded  \n"), vec!["  padded  "]);
    }

    #[test]
    fn judge_requires_exact_exit_code() {
        let ok = CommandOutput::text(vec![], Some(0));
        let failed = CommandOutput::text(vec![], Some(1));
        let signalled = CommandOutput::text(vec![], None);

        assert!(ok.judge(0));
        assert!(ok.succeeded());
        assert!(!failed.succeeded());
        assert!(failed.judge(1));
        assert!(!signalled.judge(0));
        assert!(!signalled.succeeded());
    }

    #[test]
    fn raw_output_is_never_split() {
        let bytes = b"\x89PNG\r\n\x1a\n\nrest\n".to_vec();
        let out = CommandOutput::raw(bytes.clone(), Some(0));
        assert!(out.lines().is_empty());
        assert_eq!(out.into_bytes(), bytes);
    }

    #[test]
    fn command_line_quotes_spaced_args() {
        let inv = Invocation::new(
            "adb",
            vec!["shell".into(), "dumpsys window | grep mCurrentFocus".into()],
            CaptureMode::Text,
        );
        assert_eq!(
            inv.command_line(),
            "adb shell \"dumpsys window | grep mCurrentFocus\""
        );
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let inv = Invocation::new(
            "definitely-not-an-adb-binary-7c1f",
            vec!["devices".into()],
            CaptureMode::Text,
        );
        let err = SystemRunner.run(&inv).await.unwrap_err();
        assert!(matches!(err, AdbError::SpawnFailed { .. }));
        assert!(!err.is_timeout());
    }

    #[test]
    fn merge_keeps_line_boundary() {
        assert_eq!(merge_streams(b"out\nlast".to_vec(), b"err\n"), b"out\nlast\nerr\n");
        assert_eq!(merge_streams(b"out\n".to_vec(), b"err"), b"out\nerr");
        assert_eq!(merge_streams(Vec::new(), b"err\n"), b"err\n");
        assert_eq!(merge_streams(b"out".to_vec(), b""), b"out");
    }

    #[cfg(unix)]
    fn sh(script: &str, mode: CaptureMode) -> Invocation {
        Invocation::new("sh", vec!["-c".into(), script.into()], mode)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deadline_kills_slow_child() {
        let inv = Invocation::new("sleep", vec!["5".into()], CaptureMode::Text)
            .with_timeout(Some(Duration::from_millis(200)));
        let started = std::time::Instant::now();
        let err = SystemRunner.run(&inv).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, AdbError::Timeout { duration, .. } if duration == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn text_mode_merges_stderr_after_stdout() {
        let inv = sh("echo out; echo err 1>&2; exit 3", CaptureMode::Text);
        let out = SystemRunner.run(&inv).await.unwrap();
        assert_eq!(out.lines(), ["out", "err"]);
        assert_eq!(out.exit_code, Some(3));
        assert!(out.judge(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn text_mode_separates_unterminated_stdout() {
        let inv = sh("printf 'out\\nlast'; echo err 1>&2", CaptureMode::Text);
        let out = SystemRunner.run(&inv).await.unwrap();
        assert_eq!(out.lines(), ["out", "last", "err"]);
        assert!(out.succeeded());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn raw_mode_drops_stderr() {
        let inv = sh("printf 'bytes'; echo noise 1>&2", CaptureMode::Raw);
        let out = SystemRunner.run(&inv).await.unwrap();
        assert!(out.succeeded());
        assert_eq!(out.into_bytes(), b"bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fast_child_finishes_within_deadline() {
        let inv = sh("echo done", CaptureMode::Text).with_timeout(Some(Duration::from_secs(10)));
        let out = SystemRunner.run(&inv).await.unwrap();
        assert_eq!(out.first_line(), Some("done"));
    }
}
