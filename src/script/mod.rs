//! Response parsing: pull one fenced script out of the model's free text,
//! repair common formatting mistakes, and gate it behind a syntax check.

use anyhow::Result;

use crate::process::PythonSession;

const FENCE: &str = "```";

/// Outcome of parsing one model response.
///
/// Either `script` is empty, or it has passed a syntax-only parse. `message`
/// is always printable: the original response on success, an error
/// description (echoing the response) otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub message: String,
    pub script: String,
}

/// Split the response into a message and a script, validating the script
/// through the interpreter session.
///
/// Expected use is: run the script if there is one, otherwise print the
/// message.
pub async fn parse_script(response: &str, py: &mut PythonSession) -> Result<ParseResult> {
    let Some(split) = split_fenced(response) else {
        return Ok(ParseResult {
            message: format!("Error: No script found in response:\n{response}"),
            script: String::new(),
        });
    };

    // Check for common mistakes
    let candidate = strip_language_tag(split.candidate.trim());
    let candidate = unescape_json_literal(&candidate);

    let verdict = py.check_syntax(&candidate).await?;
    if !verdict.ok {
        return Ok(ParseResult {
            message: format!("Script contains invalid Python:\n{response}"),
            script: String::new(),
        });
    }

    Ok(ParseResult { message: response.to_string(), script: candidate })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FencedSplit {
    /// Text outside the outermost fences, first and last segment joined by a
    /// newline.
    message: String,
    /// Raw text between the outermost fences. Inner fences are left alone.
    candidate: String,
}

fn split_fenced(response: &str) -> Option<FencedSplit> {
    if response.matches(FENCE).count() < 2 {
        return None;
    }
    let segments: Vec<&str> = response.split(FENCE).collect();
    let message = format!("{}\n{}", segments[0], segments[segments.len() - 1]);
    let candidate = segments[1..segments.len() - 1].join(FENCE);
    Some(FencedSplit { message, candidate })
}

/// Models commonly prefix the block with a language annotation; drop it.
fn strip_language_tag(candidate: &str) -> String {
    let first_line = candidate.lines().next().unwrap_or("");
    if first_line.trim_end().starts_with("python") {
        match candidate.split_once('\n') {
            Some((_, rest)) => rest.to_string(),
            None => String::new(),
        }
    } else {
        candidate.to_string()
    }
}

/// Some responses arrive as a JSON-escaped string literal instead of raw
/// code. Only a decoded *string* replaces the candidate; any other JSON value
/// (or a parse failure) leaves it untouched.
fn unescape_json_literal(candidate: &str) -> String {
    match serde_json::from_str::<String>(candidate) {
        Ok(decoded) => decoded,
        Err(_) => candidate.to_string(),
    }
}
