//! Configuration module for the atelier order system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files with
//! `${VAR}` / `${VAR:-default}` environment variable resolution, and
//! validates that all required configuration values are properly set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the atelier service.
///
/// Contains all configuration sections: service identity, storage backend,
/// identity provider, catalog source, and the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the identity provider.
	pub auth: AuthConfig,
	/// Configuration for the catalog source.
	pub catalog: CatalogConfig,
	/// Configuration for the HTTP API server.
	pub api: ApiConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
	/// Capacity of the order event bus channel.
	/// Defaults to 1000 events if not specified.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
	1000
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the identity provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of auth implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the catalog source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of catalog implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the process
/// environment. A reference without a default fails if the variable is unset.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS on pathological files
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).map(|m| m.as_str()).unwrap_or_default();
		let var_name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};
		result = result.replace(full_match, &value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	pub fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Loads configuration from a TOML file without blocking the runtime.
	pub async fn from_file_async(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Ensures the service id is not empty
	/// - Checks the primary storage/auth/catalog implementations are configured
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		for (section, primary, implementations) in [
			("storage", &self.storage.primary, &self.storage.implementations),
			("auth", &self.auth.primary, &self.auth.implementations),
			("catalog", &self.catalog.primary, &self.catalog.implementations),
		] {
			if !implementations.contains_key(primary) {
				return Err(ConfigError::Validation(format!(
					"Primary {} implementation '{}' is not configured under [{}.implementations]",
					section, primary, section
				)));
			}
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
