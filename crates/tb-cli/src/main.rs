// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tb_callable::SynthesisOptions;
use tb_config::{BridgeConfig, load_config, validate_config};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "toolbridge", version, about = "Schema-driven tool bridging across agent frameworks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a toolbridge.toml configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the normalized form of each tool name.
    Normalize {
        /// Tool names.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Convert tool definitions into framework declarations.
    Convert {
        /// JSON array of {name, description, parameters}, or an OpenAPI document.
        #[arg(long)]
        input: PathBuf,

        /// Target framework id.
        #[arg(long)]
        framework: Option<String>,

        /// Treat the input as an OpenAPI 3 document.
        #[arg(long)]
        openapi: bool,
    },

    /// Print the synthesized signature and docstring of each tool.
    Describe {
        /// JSON array of {name, description, parameters}.
        #[arg(long)]
        input: PathBuf,

        /// Framework whose docstring setting applies.
        #[arg(long)]
        framework: Option<String>,

        /// Treat the input as an OpenAPI 3 document.
        #[arg(long)]
        openapi: bool,
    },

    /// List registered frameworks.
    Frameworks,

    /// Print the JSON Schema of the configuration file.
    Schema,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(cli: &Cli, config: Option<&BridgeConfig>) {
    let level = if cli.debug {
        "debug"
    } else {
        config.and_then(|c| c.log_level.as_deref()).unwrap_or("info")
    };
    let filter = EnvFilter::new(format!("toolbridge={level},tb={level}"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            init_tracing(&cli, None);
            return Err(err).context("load configuration");
        }
    };
    init_tracing(&cli, Some(&config));
    for warning in validate_config(&config).context("validate configuration")? {
        warn!(target: "toolbridge", "{warning}");
    }

    let registry = tb_integrations::default_registry();
    match cli.command {
        Commands::Normalize { names } => {
            for name in commands::normalize_names(&names) {
                println!("{name}");
            }
        }
        Commands::Convert {
            input,
            framework,
            openapi,
        } => {
            let framework = commands::resolve_framework(registry, &config, framework.as_deref())?;
            let tools = commands::read_tools(&input, openapi)?;
            let out = commands::convert(registry, &framework, &tools);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Describe {
            input,
            framework,
            openapi,
        } => {
            let framework = commands::resolve_framework(registry, &config, framework.as_deref())?;
            let tools = commands::read_tools(&input, openapi)?;
            let options = SynthesisOptions {
                include_type_docstring: config.include_type_docstring_for(&framework),
            };
            print!("{}", commands::describe(&tools, options));
        }
        Commands::Frameworks => {
            for line in commands::frameworks(registry, &config) {
                println!("{line}");
            }
        }
        Commands::Schema => {
            println!("{}", commands::schema_json()?);
        }
    }
    Ok(())
}
