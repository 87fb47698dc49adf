//! Execution protocol and result types.

use serde::{Deserialize, Serialize};

/// One job line sent to the interpreter: `parse` is a syntax-only check,
/// `exec` runs the code against the session namespace.
#[derive(Debug, Clone, Serialize)]
pub struct Job<'a> {
    pub op: &'a str,
    pub code: &'a str,
}

impl<'a> Job<'a> {
    pub fn parse(code: &'a str) -> Self {
        Self { op: "parse", code }
    }

    pub fn exec(code: &'a str) -> Self {
        Self { op: "exec", code }
    }
}

/// One reply line from the interpreter. `output` holds whatever the job wrote
/// to stdout before completing or raising.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionResult {
    pub ok: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: String,
}

/// Terminal state of one user turn.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// A script ran to completion; holds its captured stdout.
    Success(String),
    /// The response carried no runnable script; holds the printable message.
    NoScript(String),
    /// The script raised; holds the error text.
    Failure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_serializes_to_one_line() {
        let job = Job::exec("print('hi')\nprint('bye')");
        let line = serde_json::to_string(&job).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains(r#""op":"exec""#));
    }

    #[test]
    fn reply_fields_default_when_absent() {
        let r: ExecutionResult = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(r.ok);
        assert!(r.output.is_empty());
        assert!(r.error.is_empty());
    }
}
