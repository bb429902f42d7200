//! dbchat: chat with a local SQLite database.
//!
//! Usage:
//!   dbchat setup                 Run the setup wizard
//!   dbchat info                  Show the database overview
//!   dbchat ask <question>        Answer one question
//!   dbchat chat                  Start an interactive session
//!   dbchat ingest [--schema] F   Add background passages
//!   dbchat tools                 List the tools offered to the model

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, warn};

use dbchat::agent::{system_prompt, Agent, AgentSettings, Session};
use dbchat::config::{self, DbChatConfig};
use dbchat::error::AgentError;
use dbchat::inference::OllamaClient;
use dbchat::logging::{self, redact_sql};
use dbchat::retrieval::passages::STORE_FILE;
use dbchat::retrieval::{ContextRetriever, NoContext, PassageStore};
use dbchat::state::{AccessGate, DatabaseOverview};
use dbchat::tools::{self, ToolRegistry, ToolSettings};
use dbchat::ui::LoadingMessages;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "dbchat")]
#[command(version)]
#[command(about = "Ask questions of a SQLite database in plain language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to dbchat home directory (defaults to ~/.dbchat).
    #[arg(long)]
    home: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,

    /// SQLite database to query. Overrides the config file.
    #[arg(long)]
    db: Option<String>,

    /// Ollama model to use. Overrides the config file.
    #[arg(long)]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the first-time setup wizard.
    Setup,

    /// Show the database overview.
    Info,

    /// Answer a single question and exit.
    Ask {
        /// The question, in plain language.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Start an interactive chat session.
    Chat,

    /// Add background passages to the retrieval store.
    Ingest {
        /// Also index one passage per table describing its schema.
        #[arg(long)]
        schema: bool,

        /// Text files to index, split on blank lines.
        files: Vec<PathBuf>,
    },

    /// List the tools offered to the model.
    Tools,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let home_dir = config::home_dir(cli.home.as_deref());
    let mut cfg = config::load_config(&home_dir)?;
    if let Some(db) = &cli.db {
        cfg.db_path = db.clone();
    }
    if let Some(model) = &cli.model {
        cfg.model = model.clone();
    }

    logging::init(cli.log_level.as_deref().unwrap_or(&cfg.log_level));

    match cli.command {
        Commands::Setup => cmd_setup(&home_dir),
        Commands::Info => cmd_info(&cfg).await,
        Commands::Ask { question } => cmd_ask(&cfg, &question.join(" ")).await,
        Commands::Chat => cmd_chat(&cfg).await,
        Commands::Ingest { schema, files } => cmd_ingest(&cfg, schema, &files),
        Commands::Tools => cmd_tools(),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_setup(home_dir: &Path) -> Result<()> {
    dbchat::setup::run_setup_wizard(home_dir)?;
    Ok(())
}

async fn cmd_info(cfg: &DbChatConfig) -> Result<()> {
    let gate = open_gate(cfg)?;
    let overview = DatabaseOverview::load(&gate)?;

    println!();
    println!("{}", "=== Database Overview ===".bold());
    println!();
    print_overview(&overview);
    println!();
    println!("  {}:", "Model".bold());
    println!("    Name:     {}", cfg.model);
    println!("    Server:   {}", cfg.ollama_url);

    let client = OllamaClient::from_config(cfg)?;
    match client.list_models().await {
        Ok(models) if models.iter().any(|m| m == &cfg.model) => {
            println!("    Status:   {}", "available".green());
        }
        Ok(_) => {
            println!(
                "    Status:   {} (run `ollama pull {}`)",
                "not pulled".yellow(),
                cfg.model
            );
        }
        Err(e) => {
            warn!("Ollama check failed: {}", e);
            println!("    Status:   {}", "server unreachable".red());
        }
    }
    println!();
    println!(
        "  {}:  {}",
        "Writes".bold(),
        if cfg.allow_writes {
            "committed".yellow()
        } else {
            "rolled back".green()
        }
    );
    println!();
    Ok(())
}

async fn cmd_ask(cfg: &DbChatConfig, question: &str) -> Result<()> {
    let mut session = build_session(cfg)?;
    let mut loading = LoadingMessages::new(cfg.seed);

    if !answer(&mut session, &mut loading, question).await {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_chat(cfg: &DbChatConfig) -> Result<()> {
    let gate = open_gate(cfg)?;
    let overview = DatabaseOverview::load(&gate)?;
    let mut session = build_session(cfg)?;
    let mut loading = LoadingMessages::new(cfg.seed);

    println!();
    println!("{}", "=== dbchat ===".bold());
    print_overview(&overview);
    println!(
        "\n  Model: {}. Type {} to quit, {} to start over.\n",
        cfg.model,
        "/exit".bold(),
        "/reset".bold()
    );

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    loop {
        print!("{} ", ">>>".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let question = line.trim();
        match question {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                session.reset();
                println!("{}\n", "History cleared.".dimmed());
                continue;
            }
            _ => {}
        }
        answer(&mut session, &mut loading, question).await;
    }

    Ok(())
}

fn cmd_ingest(cfg: &DbChatConfig, schema: bool, files: &[PathBuf]) -> Result<()> {
    if !schema && files.is_empty() {
        bail!("Nothing to ingest: pass --schema and/or one or more files");
    }

    let dir = PathBuf::from(cfg.resolved_vectors_dir());
    let store = PassageStore::open(&dir)
        .with_context(|| format!("Failed to open passage store in {}", dir.display()))?;

    if schema {
        let gate = open_gate(cfg)?;
        let n = store.ingest_schema(&gate)?;
        println!("{} Indexed schema of {} tables", ">>>".green().bold(), n);
    }
    for file in files {
        let n = store
            .ingest_file(file)
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        println!(
            "{} Indexed {} passages from {}",
            ">>>".green().bold(),
            n,
            file.display()
        );
    }
    println!("  Store now holds {} passages.", store.count()?);
    Ok(())
}

fn cmd_tools() -> Result<()> {
    println!();
    for def in tools::tool_definitions() {
        let required: Vec<&str> = def.parameters["required"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        println!("  {}({})", def.name.bold(), required.join(", "));
        println!("    {}", def.description.dimmed());
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Gate over the configured database, which must already exist.
fn open_gate(cfg: &DbChatConfig) -> Result<AccessGate> {
    let db_path = PathBuf::from(cfg.resolved_db_path());
    if !db_path.is_file() {
        bail!(
            "No database found at {}. Run `dbchat setup` or pass --db.",
            db_path.display()
        );
    }
    Ok(AccessGate::new(db_path))
}

/// Wire config, provider, retriever and tools into a fresh session.
fn build_session(cfg: &DbChatConfig) -> Result<Session> {
    let gate = open_gate(cfg)?;
    let registry = ToolRegistry::new(gate, ToolSettings::from(cfg));
    let provider = Arc::new(OllamaClient::from_config(cfg)?);

    let vectors_dir = PathBuf::from(cfg.resolved_vectors_dir());
    let retriever: Arc<dyn ContextRetriever> = if vectors_dir.join(STORE_FILE).is_file() {
        Arc::new(
            PassageStore::open(&vectors_dir)
                .with_context(|| format!("Failed to open passage store in {}", vectors_dir.display()))?,
        )
    } else {
        Arc::new(NoContext)
    };

    let agent = Agent::new(provider, retriever, registry, AgentSettings::from(cfg));
    Ok(Session::new(agent, system_prompt::system_prompt_for_today()))
}

/// Ask one question and print the outcome. Returns false on failure.
async fn answer(session: &mut Session, loading: &mut LoadingMessages, question: &str) -> bool {
    println!("{}", loading.pick().dimmed());
    match session.ask(question).await {
        Ok(reply) => {
            println!("\n{}\n", reply.answer.trim());
            println!(
                "{}",
                format!(
                    "({} model calls, {} tokens)",
                    reply.iterations, reply.usage.total_tokens
                )
                .dimmed()
            );
            println!();
            true
        }
        Err(e) => {
            report_failure(&e);
            false
        }
    }
}

fn report_failure(e: &AgentError) {
    error!("Query failed: {}", redact_sql(&e.to_string()));
    eprintln!("{} {}\n", "Error:".red().bold(), e.user_message());
}

fn print_overview(overview: &DatabaseOverview) {
    println!("  {}:", "Database".bold());
    println!("    Path:     {}", overview.path.display());
    println!("    Size:     {:.2} MB", overview.size_mb());
    println!("    Tables:   {}", overview.tables.len());
    for table in &overview.tables {
        println!("      - {} ({} rows)", table.name, table.rows);
    }
}
