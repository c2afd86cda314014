use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use catalog_dashboard::api::SeedData;
use catalog_dashboard::config::Config;
use catalog_dashboard::logging;
use catalog_dashboard::rest::{self, ApiDoc, ApiState};

#[derive(Parser)]
#[command(name = "catalog-dashboard")]
#[command(about = "Application catalog dashboard with deployment wizards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SpecFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: server.port, 7010)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Serve from a YAML fixture instead of the remote API
        #[arg(long, value_name = "FIXTURE")]
        offline: Option<PathBuf>,
    },

    /// Print the OpenAPI document
    Openapi {
        #[arg(short, long, value_enum, default_value = "json")]
        format: SpecFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Save it to the user config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            offline,
        } => {
            let logging_handle = logging::init_logging(&config, cli.debug)?;
            let result = cmd_serve(config, port, host, offline).await;

            if let Some(log_path) = logging_handle.log_file_path {
                eprintln!("Server log: {}", log_path.display());
            }
            result?;
        }
        Commands::Openapi { format, output } => {
            cmd_openapi(format, output)?;
        }
        Commands::Config { save } => {
            cmd_config(&config, save)?;
        }
    }

    Ok(())
}

async fn cmd_serve(
    mut config: Config,
    port: Option<u16>,
    host: Option<String>,
    offline: Option<PathBuf>,
) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    let state = match offline {
        Some(fixture) => {
            let seed = SeedData::from_yaml_file(&fixture)
                .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
            tracing::info!(
                packages = seed.packages.len(),
                environments = seed.environments.len(),
                "Serving offline from {}",
                fixture.display()
            );
            ApiState::offline(config, seed)
        }
        None => ApiState::from_config(config)
            .context("No remote API configured; set murano.endpoint or use --offline")?,
    };

    println!("Starting REST API server...");
    println!(
        "  Listening: {}:{}",
        state.config.server.host, state.config.server.port
    );
    println!("  Docs:      /swagger-ui");
    println!();

    rest::serve(state).await
}

fn cmd_openapi(format: SpecFormat, output: Option<PathBuf>) -> Result<()> {
    let spec = match format {
        SpecFormat::Json => ApiDoc::json().context("Failed to render OpenAPI JSON")?,
        SpecFormat::Yaml => ApiDoc::yaml().context("Failed to render OpenAPI YAML")?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, spec)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", spec),
    }
    Ok(())
}

fn cmd_config(config: &Config, save: bool) -> Result<()> {
    if save {
        let path = Config::user_config_path().context("No user config directory")?;
        config.save(&path)?;
        println!("Saved {}", path.display());
    } else {
        print!(
            "{}",
            toml::to_string_pretty(config).context("Failed to serialize config")?
        );
    }
    Ok(())
}
