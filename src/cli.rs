//! CLI interface for textsmith

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{self, Config, ConfigOverrides, ProviderKind};
use crate::service::ImprovementService;
use crate::validation::TextRules;

#[derive(Parser)]
#[command(name = "textsmith")]
#[command(about = "Text improvement service with background jobs and a result cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "TEXTSMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Provider API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Improvement provider
    #[arg(long, global = true, env = "TEXTSMITH_PROVIDER", value_enum)]
    provider: Option<ProviderKind>,

    /// Provider base URL (OpenAI-compatible)
    #[arg(long, global = true, env = "TEXTSMITH_BASE_URL")]
    base_url: Option<String>,

    /// Model used for improvements
    #[arg(long, global = true, env = "TEXTSMITH_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "TEXTSMITH_PORT")]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long, env = "TEXTSMITH_HOST")]
        host: Option<String>,
    },
    /// Improve one text and print the result
    Improve {
        /// Text to improve
        text: String,
    },
    /// Inspect configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
        /// Print the default configuration file
        #[arg(long)]
        default: bool,
        /// Print the default config file location
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let (host, port) = match &self.command {
            Commands::Serve { host, port } => (host.clone(), *port),
            _ => (None, None),
        };

        ConfigOverrides {
            api_key: self.api_key.clone(),
            provider: self.provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            host,
            port,
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply(self.overrides());
        Ok(config)
    }
}

/// Parse arguments and run the selected command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { .. } => {
            let config = cli.load_config()?;
            config.validate()?;
            crate::server::start(config).await
        }
        Commands::Improve { text } => {
            let config = cli.load_config()?;
            config.validate()?;
            improve_once(&config, text).await
        }
        Commands::Config { show, default, path } => {
            if *path {
                println!("{}", config::config_path()?.display());
            }
            if *default {
                print!("{}", config::default_config_toml());
            }
            if *show || !(*path || *default) {
                config::show_config(&cli.load_config()?)?;
            }
            Ok(())
        }
    }
}

async fn improve_once(config: &Config, text: &str) -> Result<()> {
    let text = TextRules::from(&config.validation)
        .validate(text)
        .context("Invalid text")?;

    let service = ImprovementService::from_config(config)?;
    let improved = service
        .improve_now(&text)
        .await
        .context("Text improvement failed")?;
    service.shutdown(Duration::ZERO).await;

    println!("{}", improved);
    Ok(())
}
