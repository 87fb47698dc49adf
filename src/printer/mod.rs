//! Printers: colored text and markdown (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

pub struct TextPrinter {
    pub color: Option<String>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        match self.color.as_deref() {
            Some("green") => println!("{}", text.green()),
            Some("cyan") => println!("{}", text.cyan()),
            Some("magenta") => println!("{}", text.magenta()),
            Some("yellow") => println!("{}", text.yellow()),
            Some("red") => println!("{}", text.red()),
            _ => println!("{}", text),
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}
