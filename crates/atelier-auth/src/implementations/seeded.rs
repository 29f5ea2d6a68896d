//! Seeded in-memory identity provider.
//!
//! Holds a fixed user table from configuration (or a built-in demo set) with
//! SHA3-256 password digests, and issues opaque UUID tokens kept in memory.
//! Tokens do not survive a restart; this provider exists for demo and test
//! deployments only.

use crate::{AuthError, AuthInterface, Session};
use async_trait::async_trait;
use atelier_types::{ConfigSchema, Role, User, ValidationError};
use dashmap::DashMap;
use serde::Deserialize;
use sha3::{Digest, Sha3_256};
use std::collections::HashMap;
use uuid::Uuid;

/// One seeded user entry.
///
/// Exactly one of `password` (digested at load time, demo convenience) or
/// `password_sha3` (hex digest) must be provided.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
	pub id: String,
	pub name: String,
	pub email: String,
	pub role: Role,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default)]
	pub password_sha3: Option<String>,
}

/// Configuration for the seeded identity provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeededAuthConfig {
	/// Users to seed. Empty means use the built-in demo set.
	#[serde(default)]
	pub users: Vec<SeedUser>,
}

/// Computes the hex SHA3-256 digest of a password.
fn digest(password: &str) -> String {
	let mut hasher = Sha3_256::new();
	hasher.update(password.as_bytes());
	hex::encode(hasher.finalize())
}

struct UserRecord {
	user: User,
	password_digest: String,
}

/// Identity provider backed by an in-memory seed table.
pub struct SeededAuth {
	/// Users keyed by email.
	users: HashMap<String, UserRecord>,
	/// Issued tokens mapped to the user they identify.
	tokens: DashMap<String, User>,
}

impl SeededAuth {
	/// Builds the provider from config, falling back to the demo user set.
	pub fn new(config: SeededAuthConfig) -> Result<Self, AuthError> {
		let seeds = if config.users.is_empty() {
			demo_users()
		} else {
			config.users
		};

		let mut users = HashMap::new();
		for seed in seeds {
			let password_digest = match (&seed.password, &seed.password_sha3) {
				(Some(plain), None) => digest(plain),
				(None, Some(hashed)) => hashed.to_lowercase(),
				_ => {
					return Err(AuthError::Configuration(format!(
						"user '{}' must set exactly one of password, password_sha3",
						seed.email
					)))
				},
			};
			users.insert(
				seed.email.clone(),
				UserRecord {
					user: User {
						id: seed.id,
						name: seed.name,
						email: seed.email,
						role: seed.role,
					},
					password_digest,
				},
			);
		}

		Ok(Self {
			users,
			tokens: DashMap::new(),
		})
	}
}

#[async_trait]
impl AuthInterface for SeededAuth {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SeededAuthSchema)
	}

	async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
		let record = self
			.users
			.get(email)
			.ok_or_else(|| AuthError::UserNotFound(email.to_string()))?;

		if digest(password) != record.password_digest {
			return Err(AuthError::InvalidPassword);
		}

		let token = Uuid::new_v4().to_string();
		self.tokens.insert(token.clone(), record.user.clone());

		Ok(Session {
			token,
			user: record.user.clone(),
		})
	}

	async fn verify(&self, token: &str) -> Result<User, AuthError> {
		self.tokens
			.get(token)
			.map(|entry| entry.value().clone())
			.ok_or(AuthError::InvalidToken)
	}
}

/// Configuration schema for SeededAuth.
pub struct SeededAuthSchema;

impl ConfigSchema for SeededAuthSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let parsed: SeededAuthConfig = config
			.clone()
			.try_into()
			.map_err(|e: toml::de::Error| ValidationError::InvalidValue {
				field: "auth".to_string(),
				message: e.message().to_string(),
			})?;

		for user in &parsed.users {
			if user.password.is_some() == user.password_sha3.is_some() {
				return Err(ValidationError::InvalidValue {
					field: format!("users.{}", user.email),
					message: "exactly one of password, password_sha3 required".to_string(),
				});
			}
		}

		Ok(())
	}
}

/// Factory function to create a seeded identity provider from configuration.
///
/// Configuration parameters:
/// - `users`: array of user tables (optional, demo set if absent)
pub fn create_auth(config: &toml::Value) -> Result<Box<dyn AuthInterface>, AuthError> {
	SeededAuthSchema
		.validate(config)
		.map_err(|e| AuthError::Configuration(e.to_string()))?;

	let parsed: SeededAuthConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| AuthError::Configuration(e.message().to_string()))?;

	Ok(Box::new(SeededAuth::new(parsed)?))
}

/// The built-in demo user set.
fn demo_users() -> Vec<SeedUser> {
	let seed = |id: &str, name: &str, email: &str, role: Role, password: &str| SeedUser {
		id: id.to_string(),
		name: name.to_string(),
		email: email.to_string(),
		role,
		password: Some(password.to_string()),
		password_sha3: None,
	};

	vec![
		seed("u1", "Eleanor Vance", "admin@atelier.test", Role::Admin, "admin123"),
		seed("u2", "James Bond", "james@atelier.test", Role::Customer, "customer123"),
		seed("u3", "Alice Freeman", "alice@atelier.test", Role::Customer, "customer123"),
		seed("w2", "Sarah Stitch", "sarah@atelier.test", Role::Worker, "worker123"),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn provider() -> SeededAuth {
		SeededAuth::new(SeededAuthConfig::default()).unwrap()
	}

	#[tokio::test]
	async fn test_login_issues_verifiable_token() {
		let auth = provider();

		let session = auth.login("james@atelier.test", "customer123").await.unwrap();
		assert_eq!(session.user.id, "u2");
		assert_eq!(session.user.role, Role::Customer);

		let user = auth.verify(&session.token).await.unwrap();
		assert_eq!(user.id, "u2");
	}

	#[tokio::test]
	async fn test_unknown_email() {
		let auth = provider();
		let result = auth.login("nobody@atelier.test", "pw").await;
		assert!(matches!(result, Err(AuthError::UserNotFound(_))));
	}

	#[tokio::test]
	async fn test_wrong_password() {
		let auth = provider();
		let result = auth.login("james@atelier.test", "wrong").await;
		assert!(matches!(result, Err(AuthError::InvalidPassword)));
	}

	#[tokio::test]
	async fn test_unknown_token_rejected() {
		let auth = provider();
		let result = auth.verify("not-a-token").await;
		assert!(matches!(result, Err(AuthError::InvalidToken)));
	}

	#[tokio::test]
	async fn test_configured_users() {
		let config: toml::Value = toml::from_str(
			r#"
[[users]]
id = "u9"
name = "Taylor"
email = "taylor@example.com"
role = "ADMIN"
password = "s3cret"
"#,
		)
		.unwrap();

		let auth = create_auth(&config).unwrap();
		let session = auth.login("taylor@example.com", "s3cret").await.unwrap();
		assert_eq!(session.user.role, Role::Admin);
	}

	#[test]
	fn test_user_without_credentials_rejected() {
		let config: toml::Value = toml::from_str(
			r#"
[[users]]
id = "u9"
name = "Taylor"
email = "taylor@example.com"
role = "ADMIN"
"#,
		)
		.unwrap();

		assert!(matches!(
			create_auth(&config),
			Err(AuthError::Configuration(_))
		));
	}
}
