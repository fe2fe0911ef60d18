//! Roster Web Server
//!
//! User directory service with bitmask authorization over HTTP.

use clap::Parser;
use roster_core::{init_logging, RosterConfig};
use roster_web::server::RosterServerBuilder;

/// Roster web server - user directory with capability masks
#[derive(Parser)]
#[command(name = "roster-web")]
#[command(about = "A user directory service")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Database URL for user storage
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Configuration file first, then environment, then CLI flags
    let mut config = match &args.config {
        Some(path) => match RosterConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config file {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => RosterConfig::default(),
    };
    config.apply_env();

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.dev {
        config.server.dev_mode = true;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    config.apply_dev_mode();

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    println!("🚀 Starting Roster Web Server");
    println!("📍 Server: http://{}", config.address());
    println!("🗄️  Database: {}", config.database.url);

    let server = match RosterServerBuilder::with_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
