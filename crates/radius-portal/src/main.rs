use clap::{Parser, Subcommand};
use radius_portal::{
    AuthOutcome, Config, CredentialStore, LoginError, MemoryCredentialStore,
    PostgresCredentialStore, RadiusClient, Registration, SessionGate,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Captive portal RADIUS authentication client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "radius_portal")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate a user against the RADIUS server
    Auth { username: String, password: String },
    /// Check that the RADIUS server answers
    Probe,
    /// Log in through the local credential store and RADIUS
    Login { username: String, password: String },
    /// Register a guest and print the generated credentials
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Validate configuration and exit
    Validate,
    /// Write an example configuration file
    Init {
        #[arg(value_name = "PATH", default_value = "config.json")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Command::Init { path } = &cli.command {
        process::exit(init(path));
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match cli.command {
        Command::Validate => {
            validate(&config);
            0
        }
        Command::Init { .. } => 0,
        Command::Auth { username, password } => {
            let client = RadiusClient::new(&config.radius);
            print_outcome(&client.authenticate(&username, &password).await)
        }
        Command::Probe => {
            let client = RadiusClient::new(&config.radius);
            print_outcome(&client.test_connection().await)
        }
        Command::Login { username, password } => {
            let store = open_store(&config).await;
            let gate = SessionGate::new(
                store,
                RadiusClient::new(&config.radius),
                config.session_ttl(),
            );
            match gate.login(&username, &password).await {
                Ok(session) => {
                    print_json(&json!({
                        "success": true,
                        "message": "Login successful",
                        "session": session,
                    }));
                    0
                }
                Err(e) => {
                    if let LoginError::Store(source) = &e {
                        error!(error = %source, "Login failed");
                    }
                    print_json(&json!({ "success": false, "error": e.to_string() }));
                    1
                }
            }
        }
        Command::Register {
            full_name,
            company,
            email,
            phone,
        } => {
            let store = open_store(&config).await;
            let registration = Registration::new(full_name, company, email, phone);
            match store.register(&registration).await {
                Ok(credentials) => {
                    print_json(&json!({
                        "success": true,
                        "message": "Registration successful",
                        "credentials": credentials,
                    }));
                    0
                }
                Err(e) => {
                    print_json(&json!({ "success": false, "error": e.to_string() }));
                    1
                }
            }
        }
    };

    process::exit(code);
}

async fn open_store(config: &Config) -> Arc<dyn CredentialStore> {
    match &config.database {
        Some(database) => match PostgresCredentialStore::connect(database).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(error = %e, "Failed to connect to PostgreSQL");
                process::exit(1);
            }
        },
        None => {
            info!(users = config.users.len(), "Using in-memory credential store");
            Arc::new(MemoryCredentialStore::with_users(&config.users))
        }
    }
}

fn init(path: &Path) -> i32 {
    if path.exists() {
        eprintln!("Refusing to overwrite {}", path.display());
        return 1;
    }
    match Config::example().to_file(path) {
        Ok(()) => {
            println!("Example configuration written to {}", path.display());
            println!("Edit it and pass it with --config");
            0
        }
        Err(e) => {
            eprintln!("Error creating example config: {}", e);
            1
        }
    }
}

fn validate(config: &Config) {
    println!("Configuration validated successfully");
    println!();
    println!("Configuration summary:");
    println!("  RADIUS server: {}:{}", config.radius.server, config.radius.port);
    println!("  Timeout: {} ms", config.radius.timeout_ms);
    println!("  NAS-IP-Address: {}", config.radius.nas_ip_address);
    println!("  NAS-Identifier: {}", config.radius.nas_identifier);
    println!(
        "  Credential store: {}",
        if config.database.is_some() {
            "postgresql"
        } else {
            "memory"
        }
    );
    println!("  Users: {}", config.users.len());
    println!("  Session TTL: {} s", config.session_ttl().as_secs());
    println!("  Log level: {}", config.log_level.as_deref().unwrap_or("info"));
}

fn print_outcome(outcome: &AuthOutcome) -> i32 {
    print_json(outcome);
    if outcome.success { 0 } else { 1 }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!(error = %e, "Failed to serialize output"),
    }
}
