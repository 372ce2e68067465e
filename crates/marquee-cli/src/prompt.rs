use anyhow::Result;
use bat::WrappingMode;
use console::style;
use std::io::{self, Write};

const THEME: &str = "zenburn";

/// Render model output as markdown
pub fn print(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()?;
    println!();
    io::stdout().flush()?;
    Ok(())
}

pub fn print_notice(content: &str) {
    println!("{}\n", style(content).yellow());
}

pub fn print_status(content: &str) {
    println!("{}", style(content).dim());
}
