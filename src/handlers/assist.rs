//! One assistant turn: request a response, extract the script, execute it,
//! print only what the script wrote to stdout.

use anyhow::{anyhow, Result};
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::execution::ExecutionOutcome;
use crate::llm::GeminiClient;
use crate::printer::{MarkdownPrinter, TextPrinter};
use crate::process::PythonSession;
use crate::script;

/// Drive the full pipeline for one prompt. Ctrl-C anywhere in the turn is
/// reported as an interruption and propagated, so the process exits non-zero.
pub async fn run(prompt: &str, cfg: &mut Config) -> Result<()> {
    let outcome = tokio::select! {
        res = turn(prompt, cfg) => res?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Execution interrupted");
            return Err(anyhow!("Execution interrupted"));
        }
    };

    match outcome {
        ExecutionOutcome::Success(output) => {
            println!("{}", output);
            Ok(())
        }
        ExecutionOutcome::NoScript(message) => {
            println!("No script generated");
            if cfg.get_bool("PRETTIFY_MARKDOWN") {
                MarkdownPrinter::default().print(&message);
            } else {
                TextPrinter { color: cfg.get("DEFAULT_COLOR") }.print(&message);
            }
            Ok(())
        }
        ExecutionOutcome::Failure(error) => {
            let label = format!("Error: {}", error);
            eprintln!("{}", label.red());
            Err(anyhow!(label))
        }
    }
}

async fn turn(prompt: &str, cfg: &mut Config) -> Result<ExecutionOutcome> {
    let client = GeminiClient::from_config(cfg)?;
    let response = client.generate(cfg, prompt).await?;

    let mut py = PythonSession::start().await?;
    let parsed = script::parse_script(&response, &mut py).await?;
    if parsed.script.is_empty() {
        let _ = py.shutdown().await;
        return Ok(ExecutionOutcome::NoScript(parsed.message));
    }

    let result = py.execute(&parsed.script).await?;
    let _ = py.shutdown().await;
    if result.ok {
        Ok(ExecutionOutcome::Success(result.output))
    } else {
        Ok(ExecutionOutcome::Failure(result.error))
    }
}
