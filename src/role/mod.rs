//! Standing instructions and the seed conversation sent ahead of every prompt.

use std::env;
use std::path::Path;

use crate::config::Config;

/// Which side of the seed conversation a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Model,
}

/// The assistant's standing instructions, filled in with the current date,
/// working directory, git status and operating system.
pub fn standing_instructions(cfg: &Config) -> String {
    let date = chrono::Local::now().date_naive().to_string();
    let cwd = env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| ".".to_string());
    let is_git = if Path::new(".git").exists() { "IS" } else { "is NOT" };
    let os = detect_os(cfg);

    format!(
        "You are a command-line coding assistant called dragala that generates and auto-executes Python scripts.\n\
         \n\
         A typical interaction goes like this:\n\
         1. The user gives you a natural language.\n\
         2. You:\n\
         \x20   i. Determine what needs to be done\n\
         \x20   ii. Write a short Python SCRIPT to do it \n\
         \x20   iii. Communicate back to the user by printing to the console in that SCRIPT\n\
         3. The compiler checks your SCRIPT using ast.parse() then runs it using exec()\n\
         \n\
         Please follow these conventions carefully:\n\
         - Decline any tasks that seem dangerous, irreversible, or that you don't understand.\n\
         - Always review the full conversation prior to answering and maintain continuity.\n\
         - If asked for information, just print the information clearly and concisely.\n\
         - If asked to do something, print a concise summary of what you've done as confirmation.\n\
         - If asked a question, respond in a friendly, conversational way. Use programmatically-generated and natural language responses as appropriate.\n\
         - If you need clarification, return a SCRIPT that prints your question. In the next interaction, continue based on the user's response.\n\
         - Assume the user would like something concise. For example rather than printing a massive table, filter or summarize it to what's likely of interest.\n\
         - Actively clean up any temporary processes or files you use.\n\
         - When looking through files, use git as available to skip files, and skip hidden files (.env, .git, etc) by default.\n\
         - You can plot anything with matplotlib.\n\
         - ALWAYS Return your SCRIPT inside of a single pair of ``` delimiters. Only the console output of the first such SCRIPT is visible to the user, so make sure that it's complete and don't bother returning anything else.\n\
         \n\
         Today's date is {date}.\n\
         The current working directory is {cwd}, which {is_git} a git repository.\n\
         The user's operating system is {os}\n"
    )
}

/// Fixed worked examples establishing the fenced-script response format. Sent
/// verbatim as conversation history before the user's real prompt.
pub fn seed_history(cfg: &Config) -> Vec<(Speaker, String)> {
    vec![
        (Speaker::User, standing_instructions(cfg)),
        (
            Speaker::Model,
            "```python\nprint(\"OK. I'm dragala, a command-line coding assistant that generates and auto-executes Python scripts.\")\nprint(\"You can check my work with the ast module, but you can also just ask me for a summary.\")\nprint(\"Let's get started!\")\nCONTINUE\n```".to_string(),
        ),
        (Speaker::User, WORKED_EXAMPLES.to_string()),
        (
            Speaker::Model,
            "```python\nprint(\"Got it! I'll help you with that.\")\n```".to_string(),
        ),
        (Speaker::User, "show me file".to_string()),
        (
            Speaker::Model,
            r#"```python
def print_file(filename):
    """Prints the contents of a file to the console."""
    try:
        with open(filename, "r") as f:
            print(f.read())
    except FileNotFoundError:
        print("File not found.")
    except Exception as e:
        print("Error:", e)

print_file("file.txt")
```"#
                .to_string(),
        ),
    ]
}

// Sent with escaped newlines, exactly as written. Gemini reads the examples
// fine either way and the fence structure is what matters.
const WORKED_EXAMPLES: &str = r#"EXAMPLES:\nPROMPT: Kill the process running on port 3000\n\nSCRIPT: \n```\nimport os\ntry:\n    os.system("kill $(lsof -t -i:3000)")\n    print("Process killed")\nexcept Exception as e:\n    print("Error:", e)\n```\n-------------------------------------------------------------------------------\nPROMPT: Rename the photos in this directory with "nyc" and their timestamp\n\nSCRIPT: \n```\nimport os\nimport time\ntry:\n    image_files = [f for f in os.listdir(\'.\') if f.lower().endswith((\'.png\', \'.jpg\', \'.jpeg\'))]\n    def get_name(f):\n        timestamp = time.strftime(\'%Y%m%d_%H%M%S\', time.localtime(os.path.getmtime(f)))\n        return f"nyc_{timestamp}{os.path.splitext(f)[1]}"\n    [os.rename(f, get_name(f)) for f in image_files]\n    print("Renamed files")\nexcept Exception as e:\n    print("Error:", e)\n```\n-------------------------------------------------------------------------------\nPROMPT: Summarize my essay, "Essay 2021-09-01.txt"\n\nSCRIPT: \n```\nwith open("Essay 2021-09-01.txt", "r") as f:\n    print(f.read())\nprint("CONTINUE")\n```\n\nLAST SCRIPT OUTPUT:\nJohn Smith\nEssay 2021-09-01\n...\n\nSCRIPT:\n```\nprint("The essay is about...")\n```\n-------------------------------------------------------------------------------\n"#;

fn detect_os(cfg: &Config) -> String {
    if let Some(v) = cfg.get("OS_NAME") {
        if v != "auto" {
            return v;
        }
    }
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin/MacOS".to_string(),
        "windows" => format!("Windows {}", std::env::var("OS").unwrap_or_default()),
        other => other.to_string(),
    }
}
