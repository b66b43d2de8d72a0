use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use switchboard_config::{ConfigLoader, SwitchboardConfig, expand_home};
use switchboard_core::{Result, SwitchboardError};
use switchboard_router::Router;

mod definitions;
mod route;
mod serve;

/// Switchboard: route requests to agent, command and skill definitions
#[derive(Parser)]
#[command(name = "switchboard", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to switchboard.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Definition directory (repeatable; replaces the configured list)
    #[arg(short, long = "dir", global = true)]
    dirs: Vec<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded definitions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one definition, including its body
    Show {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse every definition file and report problems
    Validate,
    /// Pick the definition that best fits an intent
    Resolve {
        /// What the user asked for
        intent: String,
        /// Tool the definition must be allowed to use (repeatable)
        #[arg(short = 't', long = "tool")]
        tools: Vec<String>,
        /// Preferred model tier; breaks near-ties
        #[arg(long)]
        tier: Option<String>,
        /// Show every candidate with its score
        #[arg(long)]
        explain: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a definition may use the given tools
    Authorize {
        id: String,
        /// Tool to check (repeatable)
        #[arg(short = 't', long = "tool", required = true)]
        tools: Vec<String>,
    },
    /// Answer JSON-lines requests on stdin, replies on stdout
    Serve {
        /// Reload definitions when their files change
        #[arg(long)]
        watch: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = self.effective_config(config_loader.get());

        // RUST_LOG wins over everything else.
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(self.log_level(&config)));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match config.logging.format.as_str() {
            "json" => builder.json().with_target(true).init(),
            "compact" => builder.compact().with_target(false).init(),
            _ => builder.with_target(false).init(),
        }

        match self.command {
            Commands::List { json } => definitions::cmd_list(&config, json).await,
            Commands::Show { id, json } => definitions::cmd_show(&config, &id, json).await,
            Commands::Validate => definitions::cmd_validate(&config).await,
            Commands::Resolve {
                intent,
                tools,
                tier,
                explain,
                json,
            } => route::cmd_resolve(&config, intent, &tools, tier, explain, json).await,
            Commands::Authorize { id, tools } => route::cmd_authorize(&config, &id, &tools).await,
            Commands::Serve { watch } => serve::cmd_serve(&config, watch).await,
            Commands::Config { json } => Self::cmd_config(&config, json),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    /// Resolve log level: --verbose > --quiet > --log-level > config default
    fn log_level<'a>(&'a self, config: &'a SwitchboardConfig) -> &'a str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        }
    }

    /// Layer command-line overrides onto the loaded config.
    fn effective_config(&self, mut config: SwitchboardConfig) -> SwitchboardConfig {
        if !self.dirs.is_empty() {
            config.definitions.dirs = self.dirs.iter().map(|d| expand_home(d)).collect();
        }
        config
    }

    fn cmd_config(config: &SwitchboardConfig, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| SwitchboardError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "switchboard", &mut std::io::stdout());
        Ok(())
    }
}

/// Discover and load the configured definitions.
async fn load_router(config: &SwitchboardConfig) -> Result<Router> {
    Ok(Router::from_config(config).await?)
}
