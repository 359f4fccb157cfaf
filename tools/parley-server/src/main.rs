// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parley demonstration server
//!
//! Serves the in-memory notes procedures over HTTP and exports their schema.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the default port 8080
//! parley-server
//!
//! # Custom port, requiring a bearer token for notes.*
//! parley-server --port 9000 --auth-token secret
//!
//! # Using a configuration file
//! parley-server --config parley.toml
//!
//! # Print the schema document without serving
//! parley-server schema --output schema.json
//! ```
//!
//! # Endpoints
//!
//! - `GET <prefix>/__definition` - Schema document
//! - `GET <prefix>/utils/say-hello` - Greeting
//! - `POST <prefix>/notes/create-note` - Create a note
//! - `POST <prefix>/notes/watch-notes` - Server-sent change feed

mod config;
mod notes;

use axum::Router;
use clap::{Parser, Subcommand};
use config::ServerConfig;
use notes::{NoteStore, ServerContext};
use parley::{App, RegistrationError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parley demonstration server
#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Schema-driven RPC demonstration server")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// HTTP server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Route prefix, e.g. /rpc (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// Bearer token required by notes.* procedures
    #[arg(long)]
    auth_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the procedures (default)
    Serve,

    /// Print the schema document
    Schema {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "parley.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::GenConfig { ref output }) => return cmd_gen_config(output),
        Some(Commands::Validate { ref config }) => return cmd_validate(config),
        _ => {}
    }

    let config = build_config(&args)?;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Some(Commands::Schema { output }) => cmd_schema(&config, output),
        _ => serve(config).await,
    }
}

fn build_config(args: &Args) -> Result<ServerConfig, config::ServerConfigError> {
    let mut config = match args.config {
        Some(ref path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(ref bind) = args.bind {
        config.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(ref prefix) = args.prefix {
        config.app.route_prefix = prefix.clone();
    }
    if let Some(ref token) = args.auth_token {
        config.auth_token = Some(token.clone());
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_app(config: &ServerConfig) -> Result<App<ServerContext>, RegistrationError> {
    let store = Arc::new(NoteStore::new());
    let mut app = App::with_context(
        config.app.clone(),
        notes::context_factory(store, config.auth_token.clone()),
    );
    notes::install_hooks(&mut app);
    notes::register(&mut app)?;
    Ok(app)
}

fn build_router(config: &ServerConfig) -> Result<Router, RegistrationError> {
    let router = build_app(config)?.into_router()?;
    Ok(router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http()))
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = build_router(&config)?;
    let addr = config.addr();

    info!("Parley Server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", addr);
    if !config.app.definition_path.is_empty() {
        info!(
            "Schema: http://{}{}{}",
            addr, config.app.route_prefix, config.app.definition_path
        );
    }
    if config.auth_token.is_some() {
        info!("Bearer token required for notes.*");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;
    Ok(())
}

fn cmd_schema(config: &ServerConfig, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let schema = build_app(config)?.schema();
    let text = serde_json::to_string_pretty(&schema.to_json())?;
    match output {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Wrote schema: {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn cmd_gen_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();
    config.app.name = "notes".into();
    config.app.description = "In-memory notes service".into();
    config.app.route_prefix = "/rpc".into();

    let toml_str = toml::to_string_pretty(&config)?;
    let content = format!(
        r#"# Parley Server Configuration
# Generated by parley-server gen-config

{}
"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = match ServerConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = build_app(&config).and_then(|app| app.into_dispatcher().map(|_| ())) {
        eprintln!("Procedures invalid: {}", e);
        std::process::exit(1);
    }

    println!("Configuration valid!");
    println!();
    println!("App: {} v{}", config.app.name, config.app.version);
    println!("Listen: {}", config.addr());
    println!(
        "Prefix: {}",
        if config.app.route_prefix.is_empty() {
            "(none)"
        } else {
            config.app.route_prefix.as_str()
        }
    );
    Ok(())
}
