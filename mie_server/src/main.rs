//! The `mie` binary: CLI for managing the Memory Intelligence Engine plus
//! the MCP server mode.
//!
//! ```bash
//! mie init                      # create .mie/config.toml
//! mie --mcp                     # serve MCP over stdio
//! mie status [--json]           # show memory graph status
//! mie reset --yes               # delete all memory data
//! mie export --format json      # export the memory graph
//! mie import --input backup.json
//! mie query "?[name] := *mie_entity{name} :limit 10"
//! ```
//!
//! Logs go to stderr; stdout is reserved for command output and, in MCP
//! mode, for the JSON-RPC protocol.

mod mcp;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rmcp::ServiceExt;

use mie_config::MieConfig;
use mie_core::{ClientConfig, ExportData, MemoryClient};
use mie_tools::{ExportParams, ListParams};

const EXIT_GENERAL: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_DATABASE: i32 = 3;
const EXIT_QUERY: i32 = 4;

/// MIE - Memory Intelligence Engine.
///
/// A local-first personal memory graph for AI agents: semantic memory of
/// facts, decisions, entities, events, and their relationships, accessible
/// via MCP (Model Context Protocol).
#[derive(Parser)]
#[command(name = "mie", version, about, long_about = None)]
struct Cli {
    /// Start as MCP server (JSON-RPC over stdio)
    #[arg(long)]
    mcp: bool,

    /// Path to .mie/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .mie/config.toml configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Show memory graph status
    Status,
    /// Delete all memory data (destructive!)
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Export the memory graph
    Export {
        /// Export format: json or datalog
        #[arg(long, default_value = "json")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Include embedding vectors
        #[arg(long)]
        include_embeddings: bool,
    },
    /// Import a previously exported memory graph
    Import {
        /// Path to an export file
        #[arg(long)]
        input: PathBuf,
    },
    /// Execute a raw CozoScript query (debugging)
    Query {
        /// The CozoScript to run
        script: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs to stderr; stdout is for command output / the MCP protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.mcp {
        run_mcp(cli.config.as_deref()).await;
        return;
    }

    match cli.command {
        Some(Commands::Init { force }) => run_init(force),
        Some(Commands::Status) => run_status(cli.config.as_deref(), cli.json).await,
        Some(Commands::Reset { yes }) => run_reset(cli.config.as_deref(), yes),
        Some(Commands::Export {
            format,
            output,
            include_embeddings,
        }) => run_export(cli.config.as_deref(), &format, output.as_deref(), include_embeddings).await,
        Some(Commands::Import { input }) => run_import(cli.config.as_deref(), &input).await,
        Some(Commands::Query { script }) => run_query(cli.config.as_deref(), &script).await,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            std::process::exit(EXIT_GENERAL);
        }
    }
}

/// Load config (strict) and open the memory client.
fn open_client(config_path: Option<&Path>) -> Result<(MemoryClient, MieConfig), i32> {
    let config = match MieConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(EXIT_CONFIG);
        }
    };
    match open_client_with(&config) {
        Ok(client) => Ok((client, config)),
        Err(code) => Err(code),
    }
}

fn open_client_with(config: &MieConfig) -> Result<MemoryClient, i32> {
    let data_dir = match config.resolve_data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(EXIT_CONFIG);
        }
    };
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Error: cannot create data directory {}: {e}", data_dir.display());
        return Err(EXIT_DATABASE);
    }
    let storage_path = match config.resolve_storage_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(EXIT_CONFIG);
        }
    };

    MemoryClient::open(ClientConfig {
        storage_engine: config.storage.engine.clone(),
        storage_path: storage_path.to_string_lossy().into_owned(),
        embedding_enabled: config.embedding.enabled,
        embedding_provider: config.embedding.provider.clone(),
        embedding_base_url: config.embedding.base_url.clone(),
        embedding_model: config.embedding.model.clone(),
        embedding_api_key: config.embedding.api_key.clone(),
        embedding_dimensions: config.embedding.dimensions,
        embedding_workers: config.embedding.workers,
    })
    .map_err(|e| {
        eprintln!("Error: cannot initialize MIE: {e}");
        EXIT_DATABASE
    })
}

async fn run_mcp(config_path: Option<&Path>) {
    // MCP mode falls back to defaults so a fresh machine can still serve.
    let config = match MieConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}");
            eprintln!("Using default configuration with environment variable overrides");
            let mut config = MieConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    let client = match open_client_with(&config) {
        Ok(client) => client,
        Err(code) => std::process::exit(code),
    };

    tracing::info!(
        "MIE MCP server starting: storage={} embeddings={}",
        config.storage.engine,
        if config.embedding.enabled {
            config.embedding.provider.as_str()
        } else {
            "disabled"
        }
    );

    let server = mcp::MieMcpServer::new(Arc::new(client));
    let service = match server.serve(rmcp::transport::stdio()).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: cannot start MCP server: {e}");
            std::process::exit(EXIT_GENERAL);
        }
    };
    if let Err(e) = service.waiting().await {
        eprintln!("Error: MCP server terminated: {e}");
        std::process::exit(EXIT_GENERAL);
    }
}

fn run_init(force: bool) {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: cannot access working directory: {e}");
            std::process::exit(EXIT_GENERAL);
        }
    };
    let path = mie_config::config_path(&cwd);
    if path.exists() && !force {
        eprintln!(
            "Error: {} already exists; use --force to overwrite",
            path.display()
        );
        std::process::exit(EXIT_CONFIG);
    }

    let config = MieConfig::default();
    if let Err(e) = config.save(&path) {
        eprintln!("Error: {e}");
        std::process::exit(EXIT_CONFIG);
    }

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust storage and embedding settings if needed");
    println!("  2. Start the MCP server:  mie --mcp");
    println!("  3. Point your AI client at MIE as an MCP server");
}

async fn run_status(config_path: Option<&Path>, json: bool) {
    let (client, _config) = match open_client(config_path) {
        Ok(pair) => pair,
        Err(code) => std::process::exit(code),
    };

    if json {
        match client.get_stats().await {
            Ok(stats) => match serde_json::to_string_pretty(&stats) {
                Ok(out) => println!("{out}"),
                Err(e) => {
                    eprintln!("Error: cannot encode stats: {e}");
                    std::process::exit(EXIT_GENERAL);
                }
            },
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(EXIT_DATABASE);
            }
        }
        return;
    }

    let result = mie_tools::status(&client).await;
    if result.is_error {
        eprintln!("Error: {}", result.text);
        std::process::exit(EXIT_DATABASE);
    }
    println!("{}", result.text);
}

fn run_reset(config_path: Option<&Path>, yes: bool) {
    if !yes {
        eprintln!("Error: reset deletes all memory data; pass --yes to confirm");
        std::process::exit(EXIT_GENERAL);
    }

    let config = match MieConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };
    let data_dir = match config.resolve_data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    if data_dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&data_dir) {
            eprintln!("Error: cannot delete {}: {e}", data_dir.display());
            std::process::exit(EXIT_DATABASE);
        }
        println!("Deleted {}", data_dir.display());
    } else {
        println!("Nothing to delete at {}", data_dir.display());
    }
}

async fn run_export(
    config_path: Option<&Path>,
    format: &str,
    output: Option<&Path>,
    include_embeddings: bool,
) {
    let (client, _config) = match open_client(config_path) {
        Ok(pair) => pair,
        Err(code) => std::process::exit(code),
    };

    let result = mie_tools::export(
        &client,
        ExportParams {
            format: Some(format.to_string()),
            include_embeddings: Some(include_embeddings),
            node_types: None,
        },
    )
    .await;
    if result.is_error {
        eprintln!("Error: {}", result.text);
        std::process::exit(EXIT_DATABASE);
    }

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &result.text) {
                eprintln!("Error: cannot write {}: {e}", path.display());
                std::process::exit(EXIT_GENERAL);
            }
            eprintln!("Exported to {}", path.display());
        }
        None => println!("{}", result.text),
    }
}

async fn run_import(config_path: Option<&Path>, input: &Path) {
    let (client, _config) = match open_client(config_path) {
        Ok(pair) => pair,
        Err(code) => std::process::exit(code),
    };

    let contents = match std::fs::read_to_string(input) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", input.display());
            std::process::exit(EXIT_GENERAL);
        }
    };
    let data: ExportData = match serde_json::from_str(&contents) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: invalid export file {}: {e}", input.display());
            std::process::exit(EXIT_GENERAL);
        }
    };

    match client.import_graph(&data).await {
        Ok(count) => {
            println!("Imported {count} nodes from {}", input.display());
            summarize_after_import(&client).await;
        }
        Err(e) => {
            eprintln!("Error: import failed: {e}");
            std::process::exit(EXIT_DATABASE);
        }
    }
}

async fn summarize_after_import(client: &MemoryClient) {
    let result = mie_tools::list(
        client,
        ListParams {
            node_type: "fact".into(),
            limit: Some(5),
            ..Default::default()
        },
    )
    .await;
    if !result.is_error {
        println!();
        println!("{}", result.text);
    }
}

async fn run_query(config_path: Option<&Path>, script: &str) {
    let (client, _config) = match open_client(config_path) {
        Ok(pair) => pair,
        Err(code) => std::process::exit(code),
    };

    match client.raw_query(script) {
        Ok(rows) => {
            let out = serde_json::json!({
                "headers": rows.headers,
                "rows": rows.rows,
            });
            match serde_json::to_string_pretty(&out) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error: cannot encode result: {e}");
                    std::process::exit(EXIT_GENERAL);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: query failed: {e}");
            std::process::exit(EXIT_QUERY);
        }
    }
}
