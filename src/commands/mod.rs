mod catalog;
mod config_cmd;
mod recipe;

pub use catalog::CatalogCommand;
pub use config_cmd::ConfigCommand;
pub use recipe::RecipeCommand;

use clap::ValueEnum;
use std::io::{self, Write};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Asks a yes/no question on stdin; anything but `y` declines.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
