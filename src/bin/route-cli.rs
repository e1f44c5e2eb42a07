use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use route_tree::config::{load_config, ConfigError, RouterConfig};
use route_tree::routing::Router;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect and test route-tree configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and report every problem
    Check { config: PathBuf },
    /// Look up a request against the configured routes
    Match {
        config: PathBuf,
        method: String,
        path: String,
    },
    /// Print the route tree of each method
    Tree {
        config: PathBuf,
        /// Only print the tree for this method
        #[arg(short, long)]
        method: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Match { config, method, path } => lookup(&config, &method, &path),
        Commands::Tree { config, method } => tree(&config, method.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Route names keyed by method and pattern.
fn build(config: &RouterConfig) -> Result<Router<String>, Box<dyn std::error::Error>> {
    let mut router = Router::new();
    for route in &config.routes {
        router.insert(&route.method, &route.path, [route.name.clone()])?;
    }
    Ok(router)
}

fn check(path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match load_config(path) {
        Ok(config) => {
            println!("{}: ok ({} routes)", path.display(), config.routes.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: {} problem(s)", path.display(), errors.len());
            for error in errors {
                eprintln!("  - {error}");
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn lookup(config: &Path, method: &str, path: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let router = build(&load_config(config)?)?;

    let output = match router.lookup(method, path) {
        Some(found) => json!({
            "matched": true,
            "route": found.handlers.first(),
            "method": method.to_ascii_uppercase(),
            "path": found.path(),
            "params": found
                .params()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect::<Vec<_>>(),
        }),
        None => json!({
            "matched": false,
            "method": method.to_ascii_uppercase(),
            "path": path,
            "allowed": router.allowed_methods(path, Some(method)),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if output["matched"] == true {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn tree(config: &Path, method: Option<&str>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let router = build(&load_config(config)?)?;

    let methods: Vec<&str> = match method {
        Some(m) => vec![m],
        None => router.methods().collect(),
    };

    for m in methods {
        match router.method_tree(m) {
            Some(tree) => {
                println!("{} ({} routes)", m.to_ascii_uppercase(), tree.len());
                print!("{tree}");
            }
            None => {
                eprintln!("no routes for method {m}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
