//! Identity module for the atelier order system.
//!
//! This module defines the interface for identity providers: credential
//! checks and opaque bearer tokens bound to a user id and role. The bundled
//! implementation is a seeded, in-memory provider for demo deployments; a
//! real provider can be swapped in behind the same interface without
//! touching the order core.

use async_trait::async_trait;
use atelier_types::{ConfigSchema, User};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod seeded;
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
	/// Error that occurs when no user exists for the given email.
	#[error("User not found: {0}")]
	UserNotFound(String),
	/// Error that occurs when the password does not match.
	#[error("Invalid password")]
	InvalidPassword,
	/// Error that occurs when a bearer token is missing, malformed or expired.
	#[error("Invalid token")]
	InvalidToken,
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// An issued session: an opaque token bound to a user.
#[derive(Debug, Clone)]
pub struct Session {
	/// Opaque bearer token to present on subsequent requests.
	pub token: String,
	/// The authenticated user.
	pub user: User,
}

/// Trait defining the interface for identity providers.
#[async_trait]
pub trait AuthInterface: Send + Sync {
	/// Returns the configuration schema for this auth implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Checks credentials and issues a session token.
	async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError>;

	/// Resolves a bearer token back to its user.
	async fn verify(&self, token: &str) -> Result<User, AuthError>;
}

/// Type alias for auth factory functions.
pub type AuthFactory = fn(&toml::Value) -> Result<Box<dyn AuthInterface>, AuthError>;

/// Get all registered auth implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AuthFactory)> {
	use implementations::seeded;

	vec![("seeded", seeded::create_auth as AuthFactory)]
}

/// Service that manages authentication operations.
///
/// Wraps an underlying identity provider implementation.
pub struct AuthService {
	/// The underlying auth implementation.
	implementation: Box<dyn AuthInterface>,
}

impl AuthService {
	/// Creates a new AuthService with the specified implementation.
	pub fn new(implementation: Box<dyn AuthInterface>) -> Self {
		Self { implementation }
	}

	/// Checks credentials and issues a session token.
	pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
		self.implementation.login(email, password).await
	}

	/// Resolves a bearer token back to its user.
	pub async fn verify(&self, token: &str) -> Result<User, AuthError> {
		self.implementation.verify(token).await
	}
}
