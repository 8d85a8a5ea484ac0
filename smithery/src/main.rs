// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

mod cli;

use std::io::Write;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use anyhow::Context as _;
use axum_server::Handle;
use clap::CommandFactory;
use clap::Parser;
use rustls::crypto::aws_lc_rs;

use smithery_common::config::{AppConfig, AppConfigBuilder};
use smithery_common::state::State;
use smithery_common::telemetry::{error, info, setup_logging, warn};
use smithery_dynamic::context::Context;
use smithery_dynamic::utils::create_dynamic_client;
use smithery_server::forge::Forge;
use smithery_server::server::{create_router, create_tls_config, serve, shutdown_signal};

use crate::cli::{CliArgs, Commands};

fn load_config(args: &CliArgs, port: Option<u16>, group: Option<String>) -> anyhow::Result<AppConfig> {
    let mut builder = AppConfigBuilder::default();
    if let Some(path) = args.config.as_deref() {
        builder.with_file(path);
    }

    let config = builder
        .with_env()
        .with_override_option("server.port", port)
        .with_override_option("widgets.group", group)
        .build()?;
    Ok(config)
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(State::new(config.clone()));
    let mut ctx = Context::new(state);

    // Without credentials the server still generates manifests, every
    // request touching the cluster answers 401
    match create_dynamic_client(&config.kubernetes).await {
        Ok(client) => ctx = ctx.with_client(Arc::new(client)),
        Err(e) => warn!(event = "NoClusterClient", error = %e),
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    let tls_config = if config.server.tls.enabled() {
        Some(
            create_tls_config(&config.server.tls.cert_file, &config.server.tls.key_file)
                .await
                .context("unable to load TLS certificate")?,
        )
    } else {
        None
    };
    let router = create_router(Arc::new(ctx));

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!(event = "Listening", address = %addr);
    serve(addr, router, tls_config, handle).await?;
    info!(event = "Stopped");
    Ok(())
}

fn run_forge(config: AppConfig, schema_path: &str) -> anyhow::Result<()> {
    let raw = std::fs::read(schema_path).with_context(|| format!("unable to read {}", schema_path))?;
    let schema: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", schema_path))?;

    let forged = Forge::from_config(&config.widgets).generate(schema)?;
    std::io::stdout().write_all(&forged.manifest)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Install the default aws_lc_rs crypto provider
    let _ = aws_lc_rs::default_provider().install_default();

    let args = CliArgs::parse();

    setup_logging(args.debug);

    let result = match &args.cmd {
        Some(Commands::Serve { port }) => {
            info!(
                event = "Starting",
                version = env!("CARGO_PKG_VERSION"),
            );

            match load_config(&args, *port, None) {
                Ok(config) => run_server(config).await,
                Err(e) => Err(e),
            }
        },
        Some(Commands::Forge { schema, group }) => {
            load_config(&args, None, group.clone()).and_then(|config| run_forge(config, schema))
        },
        None => {
            let mut cmd = CliArgs::command();
            let _ = cmd.print_help();
            process::exit(1);
        },
    };

    if let Err(e) = result {
        let message = format!("{:#}", e);
        error!(
            event = "Error",
            error = message.as_str(),
        );
        process::exit(1);
    }
}
