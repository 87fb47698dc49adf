//! Interpreter process management (startup, job I/O, shutdown).

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};

use crate::execution::{ExecutionResult, Job};

pub mod python;

/// A long-lived interpreter child holding the session namespace. Variables
/// and imports defined by one executed script stay visible to the next one
/// for the lifetime of the session.
pub struct PythonSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PythonSession {
    pub async fn start() -> Result<Self> {
        let (child, stdin, stdout) = python::start_python().await?;
        Ok(Self { child, stdin, stdout: BufReader::new(stdout) })
    }

    /// Syntax-only parse; never executes anything.
    pub async fn check_syntax(&mut self, code: &str) -> Result<ExecutionResult> {
        self.roundtrip(Job::parse(code)).await
    }

    /// Run a script against the session namespace, capturing its stdout.
    pub async fn execute(&mut self, code: &str) -> Result<ExecutionResult> {
        self.roundtrip(Job::exec(code)).await
    }

    async fn roundtrip(&mut self, job: Job<'_>) -> Result<ExecutionResult> {
        // serde_json escapes embedded newlines, so a job is always one line
        let line = serde_json::to_string(&job)?;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let mut reply = String::new();
        let n = self
            .stdout
            .read_line(&mut reply)
            .await
            .context("failed reading from interpreter")?;
        if n == 0 {
            bail!("python interpreter exited unexpectedly");
        }
        serde_json::from_str(&reply).context("malformed reply from interpreter")
    }

    /// Close stdin and let the interpreter drain out.
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.stdin);
        let _ = self.child.wait().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn python_available() -> bool {
    ["python3", "python"].iter().any(|bin| {
        std::process::Command::new(bin)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exactly_what_the_script_prints() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        let r = py.execute("print('hi')").await.unwrap();
        assert!(r.ok);
        assert_eq!(r.output, "hi\n");
        py.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn namespace_persists_across_turns() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        assert!(py.execute("x = 41").await.unwrap().ok);
        assert!(py.execute("import os").await.unwrap().ok);
        let r = py.execute("print(x + 1)").await.unwrap();
        assert!(r.ok);
        assert_eq!(r.output, "42\n");
        // imports persist too
        let r = py.execute("print(type(os).__name__)").await.unwrap();
        assert_eq!(r.output, "module\n");
        py.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn empty_script_is_a_noop() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        let r = py.execute("").await.unwrap();
        assert!(r.ok);
        assert_eq!(r.output, "");
        py.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn syntax_check_accepts_and_rejects() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        assert!(py.check_syntax("print(1+1)").await.unwrap().ok);
        assert!(py.check_syntax("").await.unwrap().ok);
        let bad = py.check_syntax("def f(:\n  pass").await.unwrap();
        assert!(!bad.ok);
        assert!(!bad.error.is_empty());
        py.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn syntax_check_never_executes() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        let r = py.check_syntax("print('side effect')").await.unwrap();
        assert!(r.ok);
        assert_eq!(r.output, "");
        // nothing was defined either
        let probe = py.execute("print('leak' in dir())").await.unwrap();
        assert_eq!(probe.output, "False\n");
        py.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn runtime_error_keeps_partial_output() {
        if !python_available() {
            eprintln!("python not found; skipping");
            return;
        }
        let mut py = PythonSession::start().await.unwrap();
        let r = py
            .execute("print('partial')\nraise ValueError('boom')")
            .await
            .unwrap();
        assert!(!r.ok);
        assert!(r.error.contains("boom"));
        assert_eq!(r.output, "partial\n");
        // the session survives a raising script
        let after = py.execute("print('still alive')").await.unwrap();
        assert!(after.ok);
        assert_eq!(after.output, "still alive\n");
        py.shutdown().await.unwrap();
    }
}
