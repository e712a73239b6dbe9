//! Demo server: POST /non-null and POST /nullable, plus GET /openapi.json.

use bodycheck_rs::demo;
use bodycheck_rs::logging::{init_logging, LogFormat, LogLevel};
use bodycheck_rs::ServerConfig;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bodycheck")]
#[command(about = "Serve the strict and nullable body demo endpoints", version)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = ServerConfig::DEFAULT_HOST)]
    host: String,
    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,
    #[arg(long, value_enum, default_value_t)]
    log_format: LogFormat,
    #[arg(long, value_enum, default_value_t)]
    log_level: LogLevel,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let config = ServerConfig::new(cli.host, cli.port);
    let app = demo::application()?;
    app.run(&config, "bodycheck demo", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
