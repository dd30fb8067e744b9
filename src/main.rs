use std::{path::Path, sync::Arc};

use axum::{Extension, Json, Router, body::Body, routing::get};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use hostwire::{
    AppNameLayer, HostConfig, HostExtension, Startup, TraceIdentifier, WebHost,
    config::{HostConfigValidator, loader::load_config_unchecked},
    core::extensions,
    tracing_setup,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing::Span;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Application name reported in logs
    #[clap(long, default_value = "hostwire")]
    app_name: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the host (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Send a GET request carrying the configured application name
    Call {
        /// Configuration file providing the [app_name] section
        #[clap(short, long, default_value = "config.toml")]
        config: String,
        /// Target URL (plain HTTP)
        url: String,
    },
}

/// Routes served by the demo binary.
struct DemoStartup;

impl Startup for DemoStartup {
    fn configure(config: &HostConfig, logger: &Span) -> Result<Router> {
        let application = config
            .app_name
            .as_ref()
            .map(|options| options.app_name.clone())
            .unwrap_or_else(|| "hostwire".to_string());
        tracing::info!(parent: logger, "Registering demo routes for {}", application);

        Ok(Router::new()
            .route("/health", get(|| async { "OK" }))
            .route(
                "/",
                get(move |Extension(trace_id): Extension<TraceIdentifier>| {
                    let application = application.clone();
                    async move {
                        Json::<Value>(json!({
                            "application": application,
                            "trace_id": trace_id.as_str(),
                        }))
                    }
                }),
            ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config),
        Some(Commands::Serve { config }) => serve(&config, args.app_name).await,
        Some(Commands::Call { config, url }) => call_command(&config, &url).await,
        None => serve(&args.config, args.app_name).await,
    }
}

async fn serve(config_path: &str, app_name: String) -> Result<()> {
    let config = Arc::new(
        hostwire::config::load_config(config_path)
            .await
            .with_context(|| format!("Failed to load config from {config_path}"))?,
    );

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    let logger = tracing_setup::create_host_span(&app_name);

    let mut host_extensions: Vec<HostExtension> = Vec::new();
    if config.correlation_id.is_some() {
        host_extensions.push(extensions::correlation_id());
    } else {
        tracing::warn!(parent: &logger, "No correlation_id section configured; correlation ids are not propagated");
    }

    WebHost::<DemoStartup>::new(
        app_name,
        std::env::args(),
        config,
        logger,
        host_extensions,
    )?
    .pre_run(|host, config, logger| {
        tracing::info!(
            parent: logger,
            "Serving from {} on {} (shutdown timeout {}s)",
            host.content_root().display(),
            host.listen_addr(),
            config.shutdown_timeout_secs
        );
        Ok(())
    })?
    .pre_run_async(|host, _config, logger| {
        Box::pin(async move {
            let mut entries = tokio::fs::read_dir(host.content_root())
                .await
                .wrap_err("Failed to read the content root")?;
            let mut count = 0usize;
            while entries.next_entry().await?.is_some() {
                count += 1;
            }
            tracing::info!(parent: logger, "Content root holds {} entries", count);
            Ok::<(), color_eyre::Report>(())
        })
    })
    .await?
    .run()
    .await
}

/// Send one request through the app-name client and print the reply
async fn call_command(config_path: &str, url: &str) -> Result<()> {
    let config = hostwire::config::load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    let client = AppNameLayer::from_config(&config)
        .wrap_err("The call command needs an [app_name] section")?
        .http_client();

    let request = http::Request::get(url)
        .body(Body::empty())
        .wrap_err_with(|| format!("Invalid URL: {url}"))?;
    let response = client
        .oneshot(request)
        .await
        .wrap_err_with(|| format!("Request to {url} failed"))?;

    println!("{}", response.status());
    let correlation = config.correlation_id.as_ref().and_then(|options| {
        response
            .headers()
            .get(options.header_name.as_str())
            .map(|value| (options.header_name.as_str(), value))
    });
    if let Some((name, value)) = correlation {
        println!("{name}: {}", value.to_str().unwrap_or("<non-ascii>"));
    }

    let body = response
        .into_body()
        .collect()
        .await
        .wrap_err("Failed to read the response body")?
        .to_bytes();
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

/// Validate configuration file and exit
fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config_unchecked(config_path) {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:?}");
            std::process::exit(1);
        }
    };

    match HostConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!(
                "   • Correlation Header: {}",
                config
                    .correlation_id
                    .as_ref()
                    .map_or("(not configured)", |options| options.header_name.as_str())
            );
            println!(
                "   • App Name: {}",
                config
                    .app_name
                    .as_ref()
                    .map_or("(not configured)", |options| options.app_name.as_str())
            );
            println!("   • Log Level: {}", config.logging.level);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
