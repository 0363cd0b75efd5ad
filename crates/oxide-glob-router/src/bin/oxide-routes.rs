//! oxide-routes CLI
//!
//! Command-line tool for inspecting a router configuration.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_glob_router::middleware::BasePath;
use oxide_glob_router::{Method, Request, Response, RouteTable, RouterConfig};

/// Glob-pattern route inspection.
#[derive(Parser)]
#[command(name = "oxide-routes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Router configuration file (JSON).
    #[arg(short, long, env = "ROUTES_CONFIG", default_value = "routes.json")]
    config: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the routes in declaration order.
    List,

    /// Resolve a request and print the bound route.
    Resolve {
        /// HTTP method.
        method: String,

        /// Request target, with an optional query string.
        target: String,

        /// Request headers as `Name: value`.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RouterConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let routes = RouteTable::from_json(config.routes.clone())?;
    debug!(routes = routes.len(), "Configuration loaded");

    match cli.command {
        Commands::List => {
            if routes.is_empty() {
                info!("No routes configured.");
            }
            for route in routes.iter() {
                println!("{}\t{}", route.pattern(), route.template().to_json());
            }
        }

        Commands::Resolve {
            method,
            target,
            headers,
        } => {
            let Some(method) = Method::parse(&method) else {
                bail!("Unknown method '{method}'");
            };

            let mut request = Request::new(method, target);
            for header in &headers {
                let Some((name, value)) = header.split_once(':') else {
                    bail!("Invalid header '{header}', expected 'Name: value'");
                };
                request = request.header(name.trim(), value.trim());
            }

            if let Some(base) = &config.base_path {
                let Some(path) = BasePath::new(base)?.strip(&request.path) else {
                    print_verdict(404);
                    return Ok(());
                };
                request = request.with_path(path);
            }

            match routes.lookup(&request)? {
                Some(route) => {
                    println!("{}", serde_json::to_string_pretty(&route.to_json())?);
                }
                None => match config.method_not_allowed {
                    Some(status) if routes.has_route(&request, false) => print_verdict(status),
                    _ => print_verdict(config.not_found),
                },
            }
        }
    }

    Ok(())
}

fn print_verdict(status: u16) {
    println!("{status} {}", Response::new(status).status_text());
}
