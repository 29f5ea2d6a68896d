//! Login endpoint and bearer-token authentication.
//!
//! Credential failures are collapsed into a single "invalid email or
//! password" response so the endpoint does not reveal which emails exist.

use atelier_auth::{AuthError, AuthService};
use atelier_types::{ApiError, LoginRequest, LoginResponse, User};
use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Processes a login request and issues a session token.
pub async fn login(auth: &AuthService, request: LoginRequest) -> Result<LoginResponse, ApiError> {
	if request.email.is_empty() || request.password.is_empty() {
		return Err(ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message: "email and password are required".to_string(),
			details: None,
		});
	}

	let session = auth
		.login(&request.email, &request.password)
		.await
		.map_err(map_auth_error)?;

	tracing::info!(user_id = %session.user.id, role = ?session.user.role, "User logged in");

	Ok(LoginResponse {
		token: session.token,
		user: session.user,
	})
}

/// Resolves the caller from the Authorization header.
pub async fn authenticate(auth: &AuthService, headers: &HeaderMap) -> Result<User, ApiError> {
	let token = bearer_token(headers)?;
	auth.verify(token).await.map_err(map_auth_error)
}

/// Extracts the bearer token from an Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
	let value = headers
		.get(AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.ok_or_else(|| unauthorized("Missing Authorization header"))?;

	value
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.ok_or_else(|| unauthorized("Authorization header must be 'Bearer <token>'"))
}

fn unauthorized(message: &str) -> ApiError {
	ApiError::Unauthorized {
		message: message.to_string(),
	}
}

/// Maps identity-provider errors onto API errors.
fn map_auth_error(err: AuthError) -> ApiError {
	match err {
		AuthError::UserNotFound(_) | AuthError::InvalidPassword => {
			unauthorized("Invalid email or password")
		},
		AuthError::InvalidToken => unauthorized("Invalid or expired token"),
		AuthError::Configuration(message) => ApiError::InternalServerError {
			error_type: "CONFIGURATION_ERROR".to_string(),
			message,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use atelier_auth::implementations::seeded::create_auth;
	use axum::http::HeaderValue;

	fn service() -> AuthService {
		let empty = toml::Value::Table(toml::map::Map::new());
		AuthService::new(create_auth(&empty).unwrap())
	}

	fn login_request(email: &str, password: &str) -> LoginRequest {
		LoginRequest {
			email: email.to_string(),
			password: password.to_string(),
		}
	}

	#[tokio::test]
	async fn test_login_and_authenticate() {
		let auth = service();

		let response = login(&auth, login_request("sarah@atelier.test", "worker123"))
			.await
			.unwrap();
		assert_eq!(response.user.id, "w2");

		let mut headers = HeaderMap::new();
		headers.insert(
			AUTHORIZATION,
			HeaderValue::from_str(&format!("Bearer {}", response.token)).unwrap(),
		);
		let user = authenticate(&auth, &headers).await.unwrap();
		assert_eq!(user.id, "w2");
	}

	#[tokio::test]
	async fn test_wrong_password_does_not_reveal_account() {
		let auth = service();

		let unknown = login(&auth, login_request("nobody@atelier.test", "x"))
			.await
			.unwrap_err();
		let wrong = login(&auth, login_request("sarah@atelier.test", "x"))
			.await
			.unwrap_err();

		assert_eq!(unknown.to_string(), wrong.to_string());
		assert_eq!(unknown.status_code(), 401);
	}

	#[tokio::test]
	async fn test_missing_and_malformed_headers() {
		let auth = service();

		let err = authenticate(&auth, &HeaderMap::new()).await.unwrap_err();
		assert_eq!(err.status_code(), 401);

		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
		let err = authenticate(&auth, &headers).await.unwrap_err();
		assert_eq!(err.status_code(), 401);
	}

	#[tokio::test]
	async fn test_unknown_token_rejected() {
		let auth = service();

		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer bogus"));
		let err = authenticate(&auth, &headers).await.unwrap_err();
		assert_eq!(err.status_code(), 401);
	}

	#[tokio::test]
	async fn test_empty_credentials_rejected() {
		let auth = service();
		let err = login(&auth, login_request("", "")).await.unwrap_err();
		assert_eq!(err.status_code(), 400);
	}
}
