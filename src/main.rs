//! flagstack demo application
//!
//! Registers a handful of defaults, reads `configmap.yaml` (or the file named
//! by `FLAGSTACK_CONFIG`), lets every key be overridden from the command line
//! and prints the resolved settings.

use anyhow::Result;
use flagstack::{global as config, Value};
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONFIG_ENV: &str = "FLAGSTACK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "configmap.yaml";

#[derive(Debug, Deserialize)]
struct AppSettings {
    debug: bool,
    app_port: u16,
    database: Database,
    /// Read separately: an override arrives as comma-separated text.
    #[serde(skip)]
    features: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Database {
    host: String,
    port: u16,
    user: String,
}

fn register_defaults() {
    config::set_default("debug", true);
    config::set_default("app_port", 8080u16);
    config::set_default(
        "database",
        Value::map([
            ("host", Value::from("localhost")),
            ("port", Value::from(5432u16)),
            ("user", Value::from("default_user")),
        ]),
    );
    config::set_default("features", vec!["dark_mode", "beta_testing"]);
}

fn load_settings() -> Result<AppSettings> {
    let mut settings: AppSettings = config::unmarshal()?;
    settings.features = config::get_string_slice("features");
    Ok(settings)
}

fn main() -> Result<()> {
    // RUST_LOG in the environment always takes precedence; WARN otherwise.
    let filter = EnvFilter::from_default_env().add_directive(Level::WARN.into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    register_defaults();

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    config::init(&path)?;

    let db_host = config::define("database.host", "localhost", "Database host address")?;
    let app_port = config::define("app_port", 3000u16, "Server port")?;
    let debug_mode = config::define("debug", true, "Enable debug mode")?;
    tracing::debug!("Option defaults: host={} port={} debug={}", db_host, app_port, debug_mode);

    config::parse();

    let settings = load_settings()?;

    println!("Configuration loaded successfully!");
    println!("=================================");
    println!("Server Port: {}", settings.app_port);
    println!("Debug Mode: {}", settings.debug);
    println!("Database Host: {}", settings.database.host);
    println!("Database Port: {}", settings.database.port);
    println!("Database User: {}", settings.database.user);
    println!("Enabled Features: {}", settings.features.join(", "));

    println!();
    config::debug();

    Ok(())
}
