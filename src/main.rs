mod cli;
mod config;
mod execution;
mod handlers;
mod llm;
mod printer;
mod process;
mod role;
mod script;

use anyhow::Result;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let mut cfg = Config::load();

    handlers::assist::run(&args.prompt_text(), &mut cfg).await
}
