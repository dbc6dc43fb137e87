use std::net::SocketAddr;

use clap::Parser;
use colored::*;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use clinic_server::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_FILE};
use clinic_server::{create_app, ClinicServer};
use error_common::{log_error, ClinicError, Result};

/// Clinic HTTP server
#[derive(Parser, Debug)]
#[command(name = "clinic-server")]
#[command(about = "Patients, prescriptions and medicine stock HTTP API server")]
struct Args {
    /// Server bind address (overrides config)
    #[arg(long, env = "CLINIC_HOST")]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long, env = "CLINIC_PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging, args.verbose)?;

    if let Err(e) = run(config).await {
        log_error("clinic-server", &e);
        return Err(e);
    }
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    let bind = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| ClinicError::ConfigError(format!("invalid bind address {}: {}", bind, e)))?;

    info!("🏥 {}", "Starting clinic server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("🗄️  Datastore backend: {:?}", config.datastore.backend);

    let server = ClinicServer::new(config)?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ClinicError::NetworkError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {}", format!("Clinic server running on http://{}", addr).bright_green());
    info!("📋 {}", format!("Health check available at: http://{}/health", addr).bright_blue());
    info!(
        "📖 {}",
        format!("OpenAPI document at: http://{}/api-docs/openapi.json", addr).bright_blue()
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| ClinicError::ServerError(format!("HTTP server error: {}", e)))
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG.to_string().to_lowercase()
    } else {
        logging.level.clone()
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "clinic_server={level},datastore_layer={level},tower_http=info",
            level = level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if logging.json {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
    } else {
        print_startup_banner();
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true),
            )
            .try_init()
    };

    result.map_err(|e| ClinicError::InternalError(format!("Failed to initialize tracing: {}", e)))
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                 🏥 CLINIC SERVER                 ║".bright_cyan());
    println!("{}", "║     Patients · Prescriptions · Medicine stock    ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════╝".bright_cyan());
    println!();
}
