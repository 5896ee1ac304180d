//! authors-api server
//!
//! ```sh
//! # Run with default config (~/.config/authors-api/config.toml)
//! authors-api
//!
//! # Custom config path and port
//! authors-api --config /etc/authors-api/config.toml --port 8081
//!
//! # Validate config without starting
//! authors-api --check
//!
//! # Sign a bearer token for an operator
//! authors-api issue-token --username ana --role admin
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use authors_api::config::{default_config_path, AppConfig, ConfigError};
use authors_api::infrastructure::crypto::create_token;
use authors_api::server::{init_tracing, ServerHandle, ServerOptions};

/// Header-versioned REST API for authors and their books.
#[derive(Parser, Debug)]
#[command(
    name = "authors-api",
    version,
    about = "Versioned, paginated REST API for authors",
    long_about = "authors-api serves the /api/authors collection behind an exact-match \
                  version header, with paginated listings and hypermedia links.\n\n\
                  Default config: ~/.config/authors-api/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "AUTHORS_API_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a signed bearer token using the configured JWT settings.
    IssueToken {
        #[arg(long)]
        username: String,

        #[arg(long, default_value = "admin")]
        role: String,

        /// Subject claim; defaults to the username.
        #[arg(long)]
        user_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let (mut config, found) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, true),
        Err(ConfigError::NotFound(_)) => (AppConfig::default(), false),
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    if let Some(Command::IssueToken {
        username,
        role,
        user_id,
    }) = cli.command
    {
        let subject = user_id.unwrap_or_else(|| username.clone());
        let token = create_token(&subject, &username, &role, &config.jwt_config())?;
        println!("{}", token);
        return Ok(());
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.address());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!(
            "   API version : {} ({})",
            config.api.version, config.api.version_header
        );
        println!(
            "   Page size   : {} (max {})",
            config.pagination.default_page_size, config.pagination.max_page_size
        );
        return Ok(());
    }

    init_tracing(&config);
    if found {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        info!(
            "No config file at {}, using defaults",
            config_path.display()
        );
    }
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
    }

    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e);
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
