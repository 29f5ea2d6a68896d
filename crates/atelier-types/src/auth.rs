//! Identity types.
//!
//! The user's role determines which API routes they may call; enforcement
//! happens in the service layer. Users are immutable within this system's
//! scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role assigned to a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	/// Places orders and views their own order state.
	Customer,
	/// Operates the dashboard: confirms orders, assigns workers.
	Admin,
	/// Advances production stages on assigned orders.
	Worker,
}

impl Role {
	/// Whether this role may drive workflow transitions.
	pub fn is_operator(&self) -> bool {
		matches!(self, Role::Admin | Role::Worker)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::Customer => write!(f, "CUSTOMER"),
			Role::Admin => write!(f, "ADMIN"),
			Role::Worker => write!(f, "WORKER"),
		}
	}
}

/// An authenticated user as exposed through the API.
///
/// Credentials never appear here; password digests stay inside the identity
/// provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	pub name: String,
	pub email: String,
	pub role: Role,
}
