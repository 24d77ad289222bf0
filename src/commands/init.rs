use std::io::{self, Write};

use crate::config::{parse_base_url, Config, DEFAULT_BASE_URL, DEFAULT_PER_PAGE};
use crate::error::{Result, TodoError};

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub async fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        let answer = prompt(&format!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        ))?;

        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("Todo CLI Configuration");
    println!("======================\n");

    let base_url = prompt(&format!("Backend URL [{DEFAULT_BASE_URL}]: "))?;
    let base_url = if base_url.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        parse_base_url(&base_url)?;
        base_url
    };

    let per_page = prompt(&format!("Tasks per page [{DEFAULT_PER_PAGE}]: "))?;
    let per_page = if per_page.is_empty() {
        DEFAULT_PER_PAGE
    } else {
        per_page
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| TodoError::Validation(format!("Invalid page size: {per_page}")))?
    };

    // Create config directory if it doesn't exist
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TodoError::ConfigRead {
            path: config_path.clone(),
            source: e,
        })?;
    }

    let config_content = format!("base_url = \"{base_url}\"\nper_page = {per_page}\n");

    std::fs::write(&config_path, config_content).map_err(|e| TodoError::ConfigRead {
        path: config_path.clone(),
        source: e,
    })?;

    println!("\nConfig saved to {}", config_path.display());
    println!("You can now use 'todo' commands!");

    Ok(())
}
