// src/compile/invoker.rs
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::errors::{Result, ServerError};

pub const COMPILER_EXECUTABLE: &str = "qat";

/// Bytes of compiler stderr kept in a `ProcessError` message.
const STDERR_TAIL: usize = 2048;

/// Runs a compiler against a provisioned workspace.
///
/// `Ok(())` means the process ran to completion and exited zero. Source-level
/// diagnostics are reported through the result file, not through this call.
#[async_trait]
pub trait CompilerInvoker: Send + Sync {
    async fn invoke(&self, source_path: &Path, build_dir: &Path) -> Result<()>;
}

/// The `qat` executable, run as a subprocess with a deadline.
#[derive(Debug, Clone)]
pub struct QatCompiler {
    program: PathBuf,
    timeout: Duration,
}

impl QatCompiler {
    /// Use `<compiler_dir>/qat`, or plain `qat` resolved from `PATH`.
    pub fn new(compiler_dir: Option<&Path>, timeout: Duration) -> Self {
        let program = match compiler_dir {
            Some(dir) => dir.join(COMPILER_EXECUTABLE),
            None => PathBuf::from(COMPILER_EXECUTABLE),
        };
        Self { program, timeout }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.compiler_dir.as_deref(), config.compile_timeout())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// SIGKILL every process in the group led by `pid`. A group that is already
/// empty is fine.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::error!("Failed to kill compiler process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// `build <source> -o <build_dir> --no-colors`
pub fn build_args(source_path: &Path, build_dir: &Path) -> Vec<OsString> {
    vec![
        OsString::from("build"),
        source_path.as_os_str().to_owned(),
        OsString::from("-o"),
        build_dir.as_os_str().to_owned(),
        OsString::from("--no-colors"),
    ]
}

#[async_trait]
impl CompilerInvoker for QatCompiler {
    async fn invoke(&self, source_path: &Path, build_dir: &Path) -> Result<()> {
        log::debug!(
            "Running {} build {} -o {}",
            self.program.display(),
            source_path.display(),
            build_dir.display()
        );

        let mut command = Command::new(&self.program);
        command
            .args(build_args(source_path, build_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so anything the compiler forks can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            ServerError::ProcessError(format!("could not start {}: {}", self.program.display(), e))
        })?;
        // id() is gone once the child is reaped; keep it for the group kill.
        let pid = child.id();

        let stderr = child.stderr.take();
        let stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            buf
        });

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        if waited.is_ok() {
            // The compiler has exited. Sweep whatever it left running in its group.
            kill_process_group(pid);
        }

        match waited {
            Ok(Ok(status)) if status.success() => {
                stderr_reader.abort();
                Ok(())
            }
            Ok(Ok(status)) => {
                let stderr = tokio::time::timeout(Duration::from_secs(1), stderr_reader)
                    .await
                    .ok()
                    .and_then(|joined| joined.ok())
                    .unwrap_or_default();
                let tail = stderr_tail(&stderr);
                if tail.is_empty() {
                    Err(ServerError::ProcessError(status.to_string()))
                } else {
                    Err(ServerError::ProcessError(format!("{}: {}", status, tail)))
                }
            }
            Ok(Err(e)) => {
                stderr_reader.abort();
                Err(ServerError::ProcessError(e.to_string()))
            }
            Err(_) => {
                log::warn!(
                    "Compiler exceeded {:?}, killing {}",
                    self.timeout,
                    self.program.display()
                );
                kill_process_group(pid);
                // kill() also waits, so the process is reaped before the
                // workspace is removed.
                if let Err(e) = child.kill().await {
                    log::error!("Failed to kill compiler process: {}", e);
                }
                stderr_reader.abort();
                Err(ServerError::CompileTimeout(self.timeout))
            }
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_contract() {
        let args = build_args(Path::new("/w/main.qat"), Path::new("/w/build"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, ["build", "/w/main.qat", "-o", "/w/build", "--no-colors"]);
    }

    #[test]
    fn test_program_resolution() {
        let from_path = QatCompiler::new(None, Duration::from_secs(1));
        assert_eq!(from_path.program(), Path::new("qat"));

        let prefixed = QatCompiler::new(Some(Path::new("/opt/qat/bin")), Duration::from_secs(1));
        assert_eq!(prefixed.program(), Path::new("/opt/qat/bin/qat"));
    }

    #[test]
    fn test_stderr_tail_keeps_the_end() {
        let long = "x".repeat(STDERR_TAIL) + "fatal: boom\n";
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.ends_with("fatal: boom"));
        assert_eq!(tail.len(), STDERR_TAIL - 1);
    }

    #[tokio::test]
    async fn test_missing_executable_is_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = QatCompiler::new(Some(dir.path()), Duration::from_secs(5));

        let err = compiler
            .invoke(&dir.path().join("main.qat"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ProcessError(_)));
    }
}
