use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "dragala", version)]
#[command(about = "A command-line coding assistant that generates and auto-executes Python scripts")]
pub struct Cli {
    /// A natural language prompt for the assistant to respond to.
    #[arg(value_name = "PROMPT", required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The prompt words joined back into one free-form request.
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }
}
