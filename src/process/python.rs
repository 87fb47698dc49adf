//! Python interpreter bootstrap and process startup.

use anyhow::{anyhow, Context, Result};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Job loop piped to `python -c`: one NDJSON job per stdin line, one JSON
/// reply per stdout line. `exec` jobs share the `ns` dict, and stdout is
/// redirected into a buffer for exactly the duration of the `exec` call —
/// `redirect_stdout` restores it whether the script returns or raises.
const BOOTSTRAP: &str = r#"
import ast, io, json, sys
from contextlib import redirect_stdout

ns = {}
for line in sys.stdin:
    line = line.strip()
    if not line:
        continue
    req = json.loads(line)
    code = req.get("code", "")
    if req.get("op") == "parse":
        try:
            ast.parse(code)
            resp = {"ok": True, "output": "", "error": ""}
        except SyntaxError as exc:
            resp = {"ok": False, "output": "", "error": str(exc)}
    else:
        buf = io.StringIO()
        try:
            with redirect_stdout(buf):
                exec(code, ns)
            resp = {"ok": True, "output": buf.getvalue(), "error": ""}
        except Exception as exc:
            resp = {"ok": False, "output": buf.getvalue(), "error": str(exc)}
    sys.stdout.write(json.dumps(resp) + "\n")
    sys.stdout.flush()
"#;

/// Candidate interpreter names, first match wins. `DRAGALA_PYTHON` overrides.
fn interpreter_candidates() -> Vec<String> {
    if let Ok(explicit) = std::env::var("DRAGALA_PYTHON") {
        return vec![explicit];
    }
    vec!["python3".to_string(), "python".to_string()]
}

pub async fn start_python() -> Result<(Child, ChildStdin, ChildStdout)> {
    let mut last_err: Option<std::io::Error> = None;
    for bin in interpreter_candidates() {
        let mut cmd = Command::new(&bin);
        cmd.arg("-u") // unbuffered
            .arg("-c")
            .arg(BOOTSTRAP)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(mut child) => {
                let stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| anyhow!("no stdin on interpreter process"))?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| anyhow!("no stdout on interpreter process"))?;
                return Ok((child, stdin, stdout));
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err
        .map(anyhow::Error::from)
        .unwrap_or_else(|| anyhow!("no python interpreter configured")))
    .context("failed to start a python interpreter")
}
