//! Main entry point for the atelier order service.
//!
//! This binary wires together the pluggable implementations (storage backend,
//! identity provider, catalog source), builds the order submission and
//! workflow services on top of them, and serves the storefront HTTP API.

use atelier_auth::AuthService;
use atelier_catalog::CatalogService;
use atelier_config::Config;
use atelier_order::{SubmissionService, WorkflowTracker};
use atelier_storage::StorageService;
use atelier_types::EventBus;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

mod apis;
mod server;

/// Command-line arguments for the atelier service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// All wired services shared by the HTTP handlers.
pub struct Services {
	pub auth: Arc<AuthService>,
	pub catalog: Arc<CatalogService>,
	pub submission: Arc<SubmissionService>,
	pub tracker: Arc<WorkflowTracker>,
	pub event_bus: EventBus,
}

/// Main entry point for the atelier service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the services from the configured implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started atelier service");

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file_async(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let services = Arc::new(build_services(&config)?);
	spawn_event_logger(&services.event_bus);

	server::start_server(config.api.clone(), services).await?;

	tracing::info!("Stopped atelier service");
	Ok(())
}

/// Looks up the configured primary implementation for one section and runs
/// its factory.
fn instantiate<T: ?Sized, E: std::error::Error + 'static>(
	section: &str,
	primary: &str,
	implementations: &std::collections::HashMap<String, toml::Value>,
	factories: Vec<(&'static str, fn(&toml::Value) -> Result<Box<T>, E>)>,
) -> Result<Box<T>, Box<dyn std::error::Error>> {
	let factory = factories
		.into_iter()
		.find(|(name, _)| *name == primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown {} implementation '{}'", section, primary))?;
	let impl_config = implementations
		.get(primary)
		.ok_or_else(|| format!("missing [{}.implementations.{}]", section, primary))?;
	Ok(factory(impl_config)?)
}

/// Builds all services from configuration.
///
/// Each section names a primary implementation; its factory is looked up in
/// the registry the owning crate exposes, and the result is wrapped in the
/// crate's service type.
fn build_services(config: &Config) -> Result<Services, Box<dyn std::error::Error>> {
	let storage = Arc::new(StorageService::new(instantiate(
		"storage",
		&config.storage.primary,
		&config.storage.implementations,
		atelier_storage::get_all_implementations(),
	)?));

	let auth = Arc::new(AuthService::new(instantiate(
		"auth",
		&config.auth.primary,
		&config.auth.implementations,
		atelier_auth::get_all_implementations(),
	)?));

	let catalog = Arc::new(CatalogService::new(instantiate(
		"catalog",
		&config.catalog.primary,
		&config.catalog.implementations,
		atelier_catalog::get_all_implementations(),
	)?));

	let event_bus = EventBus::new(config.service.event_capacity);

	let submission = Arc::new(SubmissionService::new(
		storage.clone(),
		catalog.clone(),
		event_bus.clone(),
	));
	let tracker = Arc::new(WorkflowTracker::new(storage.clone(), event_bus.clone()));

	Ok(Services {
		auth,
		catalog,
		submission,
		tracker,
		event_bus,
	})
}

/// Subscribes to the order event bus and logs everything published on it.
fn spawn_event_logger(event_bus: &EventBus) {
	let mut rx = event_bus.subscribe();
	tokio::spawn(async move {
		loop {
			match rx.recv().await {
				Ok(event) => tracing::debug!(?event, "Order event"),
				Err(broadcast::error::RecvError::Lagged(missed)) => {
					tracing::warn!(missed, "Event logger lagged behind the bus");
				},
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_CONFIG: &str = r#"
[service]
id = "atelier-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[auth]
primary = "seeded"
[auth.implementations.seeded]

[catalog]
primary = "seed"
[catalog.implementations.seed]

[api]
host = "127.0.0.1"
port = 3000
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[tokio::test]
	async fn test_build_services_with_minimal_config() {
		let config: Config = TEST_CONFIG.parse().unwrap();

		let services = build_services(&config).expect("failed to build services");

		// The seeded demo data must be live end to end.
		let products = services.catalog.list_products().await.unwrap();
		assert!(!products.is_empty());
		let session = services
			.auth
			.login("james@atelier.test", "customer123")
			.await
			.unwrap();
		assert_eq!(session.user.id, "u2");
	}

	#[test]
	fn test_build_services_unknown_storage() {
		let bad = TEST_CONFIG.replace("primary = \"memory\"", "primary = \"redis\"");
		// Config validation itself already rejects an unconfigured primary.
		let result: Result<Config, _> = bad.parse();
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_build_services_with_file_config() {
		let dir = tempfile::tempdir().expect("failed to create temp dir");
		let path = dir.path().join("config.toml");
		std::fs::write(&path, TEST_CONFIG).expect("failed to write config");

		let config = Config::from_file(path.to_str().unwrap()).expect("failed to load config");
		assert_eq!(config.service.id, "atelier-test");
		assert!(build_services(&config).is_ok());
	}
}
