// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Parley server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_common_core::LlmClient;
use parley_llm_anthropic::{AnthropicClient, AnthropicConfig};
use parley_llm_cli::{CliClient, CliConfig};
use parley_server::{create_app_state, create_router, ProjectStore};
use parley_server_config::{LlmConfig, LlmProvider, LogFormat, LoggingConfig, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parley server - persona chat over local project directories.
#[derive(Parser, Debug)]
#[command(name = "parley-server", about = "Persona chat server", version)]
struct Args {
	/// TOML config file (defaults to /etc/parley/server.toml when present)
	#[arg(long, env = "PARLEY_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// Load .env before clap so PARLEY_SERVER_CONFIG can come from it.
	dotenvy::dotenv().ok();

	let args = Args::parse();
	if let Some(Command::Version) = args.command {
		println!("parley-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	let config = match &args.config {
		Some(path) => parley_server_config::load_config_with_file(path),
		None => parley_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		provider = %config.llm.provider,
		model = %config.llm.model,
		personas_dir = %config.paths.personas_dir.display(),
		"starting parley-server"
	);

	let llm = build_llm_client(&config.llm)?;
	let projects = Arc::new(
		ProjectStore::open(config.paths.projects_file())
			.await
			.context("failed to open project store")?,
	);

	let app = create_router(create_app_state(&config, llm, projects));
	serve(&config, app).await
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
		LogFormat::Compact => registry
			.with(tracing_subscriber::fmt::layer().compact())
			.init(),
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
	}
}

fn build_llm_client(llm: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
	match llm.provider {
		LlmProvider::Anthropic => {
			let api_key = llm
				.api_key
				.clone()
				.context("anthropic provider selected but no API key configured")?;
			let client =
				AnthropicClient::new(AnthropicConfig::new(api_key).with_base_url(&llm.base_url))
					.context("failed to build Anthropic client")?;
			Ok(Arc::new(client))
		}
		LlmProvider::Cli => {
			let config = CliConfig::new(&llm.cli_command)
				.with_args(&llm.cli_args)
				.with_timeout(Duration::from_secs(llm.cli_timeout_secs));
			Ok(Arc::new(CliClient::new(config)))
		}
	}
}

async fn serve(config: &ServerConfig, app: axum::Router) -> anyhow::Result<()> {
	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;
	tracing::info!(addr = %addr, "listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("server error")?;

	tracing::info!("server stopped");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
	tracing::info!("shutdown signal received");
}
