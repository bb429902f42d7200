//! First-run interactive setup wizard.
//!
//! Steps:
//! 1. Display banner
//! 2. Choose the database file
//! 3. Choose the model and Ollama server
//! 4. Decide whether `execute_sql` may commit
//! 5. Write dbchat.toml

use crate::config::{self, DbChatConfig};
use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// ASCII banner displayed during setup.
const BANNER: &str = r#"
      _ _          _           _
   __| | |__   ___| |__   __ _| |_
  / _` | '_ \ / __| '_ \ / _` | __|
 | (_| | |_) | (__| | | | (_| | |_
  \__,_|_.__/ \___|_| |_|\__,_|\__|

     Ask your SQLite database anything
"#;

/// Run the interactive setup wizard against stdin.
pub fn run_setup_wizard(home_dir: &Path) -> Result<DbChatConfig> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    run_setup_wizard_with(home_dir, &mut reader)
}

/// Run the wizard reading answers from `reader`.
pub fn run_setup_wizard_with(home_dir: &Path, reader: &mut impl BufRead) -> Result<DbChatConfig> {
    println!("{}", BANNER);
    println!("Welcome to dbchat setup.\n");

    let current = config::load_config(home_dir)?;

    // Step 1: Database
    println!("[1/4] Database");
    let db_path = prompt_with_default(reader, "  SQLite database path", &current.db_path)?;
    let resolved = current.resolve_path(&db_path);
    if !Path::new(&resolved).exists() {
        println!(
            "  {} {} does not exist yet; dbchat will not create it.",
            "Warning:".yellow().bold(),
            resolved
        );
    }

    // Step 2: Model
    println!("\n[2/4] Model");
    let model = prompt_with_default(reader, "  Ollama model", &current.model)?;
    let ollama_url = prompt_with_default(reader, "  Ollama URL", &current.ollama_url)?;

    // Step 3: Writes
    println!("\n[3/4] Safety");
    let default_writes = if current.allow_writes { "y" } else { "n" };
    let allow_writes = prompt_with_default(
        reader,
        "  Allow the model to modify the database? (y/n)",
        default_writes,
    )?;
    let allow_writes = matches!(allow_writes.to_lowercase().as_str(), "y" | "yes");

    // Step 4: Write config
    println!("\n[4/4] Writing configuration...");
    let config = DbChatConfig {
        db_path,
        model,
        ollama_url,
        allow_writes,
        ..current
    };
    let written = config::save_config(&config, home_dir)?;
    println!("  Written: {}", written.display());

    println!("\nSetup complete! Run `dbchat chat` to start.\n");

    Ok(config)
}

/// Prompt with a default value.
fn prompt_with_default(reader: &mut impl BufRead, label: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", label, default);
    io::stdout().flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
