//! Tristore CLI: triple store server and graph maintenance.
//!
//! Usage:
//!   tristore serve [--port 9666] [--backend sqlite|memory] [--db path] [--graphs a,b]
//!   tristore graphs [--db path]
//!   tristore drop <name> [--db path]

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tristore::http::{self, AppState};
use tristore::{CallContext, GraphEngine, InferenceRegistry, ServerConfig};

#[derive(Parser)]
#[command(name = "tristore", version, about = "Triple store with a join query engine")]
struct Cli {
    /// Log filter directives, used when RUST_LOG is unset
    #[arg(long, env = "TRISTORE_LOG", default_value = "tristore=info,tower_http=info", global = true)]
    log_filter: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[command(flatten)]
        config: ServerConfig,
    },
    /// List all graphs
    Graphs {
        #[command(flatten)]
        config: ServerConfig,
    },
    /// Delete a graph and all its triples
    Drop {
        /// Name of the graph to delete
        name: String,
        #[command(flatten)]
        config: ServerConfig,
    },
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_engine(config: &ServerConfig) -> Result<GraphEngine, String> {
    let store = config
        .open_store()
        .map_err(|e| format!("Failed to open storage: {}", e))?;
    Ok(GraphEngine::new(store))
}

fn cmd_serve(config: ServerConfig) -> i32 {
    let engine = match open_engine(&config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let cx = CallContext::background();
    for name in config.startup_graphs() {
        if let Err(e) = engine.resolve_or_create(&cx, &name) {
            eprintln!("Error: failed to create graph '{}': {}", name, e);
            return 1;
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return 1;
        }
    };

    let state = Arc::new(AppState::new(
        Arc::clone(&engine),
        Arc::new(InferenceRegistry::new()),
        config.request_timeout(),
    ));
    let result: std::io::Result<()> = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
        http::serve(listener, state).await
    });

    if let Err(e) = engine.close() {
        tracing::warn!(error = %e, "failed to close storage cleanly");
    }
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_graphs(config: ServerConfig) -> i32 {
    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match engine.list(&CallContext::background()) {
        Ok(names) if names.is_empty() => {
            println!("No graphs");
            0
        }
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_drop(config: ServerConfig, name: &str) -> i32 {
    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let cx = CallContext::background();
    match engine.resolve(&cx, name) {
        Ok(Some(_)) => {}
        Ok(None) => {
            eprintln!("Error: graph '{}' not found", name);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    match engine.drop_graph(&cx, name) {
        Ok(()) => {
            println!("Dropped graph '{}'", name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_filter);

    let code = match cli.command {
        Commands::Serve { config } => cmd_serve(config),
        Commands::Graphs { config } => cmd_graphs(config),
        Commands::Drop { name, config } => cmd_drop(config, &name),
    };
    std::process::exit(code);
}
