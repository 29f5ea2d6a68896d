//! API types for the atelier HTTP API.
//!
//! Request and response bodies for the storefront endpoints, plus the
//! structured error type that maps domain failures onto HTTP status codes.

use crate::auth::User;
use crate::order::{Measurements, OrderItem, OrderStatus, WorkflowStage};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Login response: an opaque bearer token bound to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
	pub token: String,
	pub user: User,
}

/// One proposed line item in an order submission.
///
/// Client-supplied prices are deliberately absent; the server resolves the
/// price from the catalog at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderItem {
	pub product_id: String,
	pub quantity: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selected_size: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selected_fabric_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub measurements: Option<Measurements>,
}

/// Order submission request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
	pub customer_id: String,
	pub items: Vec<SubmitOrderItem>,
	/// Deposit captured at booking. Defaults to zero.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub advance_amount: Option<Decimal>,
}

/// Order submission response, echoing the computed totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
	pub order_id: String,
	pub total_amount: Decimal,
	pub advance_amount: Decimal,
	pub due_amount: Decimal,
	pub status: OrderStatus,
}

/// Full order detail: header plus line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
	pub id: String,
	pub customer_id: String,
	pub items: Vec<OrderItem>,
	pub total_amount: Decimal,
	pub advance_amount: Decimal,
	pub due_amount: Decimal,
	pub status: OrderStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_stage: Option<WorkflowStage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_worker_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Workflow transition request body for `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
	/// Target status. May equal the current status when only the stage advances.
	pub status: OrderStatus,
	/// Target production stage, where applicable.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_stage: Option<WorkflowStage>,
}

/// Worker assignment request body for `PATCH /orders/{id}/assign-worker`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkerRequest {
	pub worker_id: String,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
	/// Additional error context, e.g. field-level validation detail.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error with HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// Malformed or inconsistent client input (400).
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Missing or invalid credential (401).
	Unauthorized { message: String },
	/// Authenticated but not allowed (403).
	Forbidden { message: String },
	/// Referenced entity does not exist (404).
	NotFound { error_type: String, message: String },
	/// Workflow rule violation (409).
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Storage or other internal failure (500). Safe to retry the whole
	/// operation since writes are atomic.
	InternalServerError { error_type: String, message: String },
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::BadRequest { .. } => 400,
			ApiError::Unauthorized { .. } => 401,
			ApiError::Forbidden { .. } => 403,
			ApiError::NotFound { .. } => 404,
			ApiError::Conflict { .. } => 409,
			ApiError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			ApiError::Unauthorized { message } => ErrorResponse {
				error: "UNAUTHORIZED".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::Forbidden { message } => ErrorResponse {
				error: "FORBIDDEN".to_string(),
				message: message.clone(),
				details: None,
			},
			ApiError::NotFound {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
			ApiError::Conflict {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			ApiError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			ApiError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
			ApiError::Forbidden { message } => write!(f, "Forbidden: {}", message),
			ApiError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			ApiError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_codes() {
		let bad = ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message: "empty order".to_string(),
			details: None,
		};
		assert_eq!(bad.status_code(), 400);

		let conflict = ApiError::Conflict {
			error_type: "INVALID_TRANSITION".to_string(),
			message: "no regression".to_string(),
			details: None,
		};
		assert_eq!(conflict.status_code(), 409);
	}

	#[test]
	fn test_error_response_shape() {
		let err = ApiError::NotFound {
			error_type: "PRODUCT_NOT_FOUND".to_string(),
			message: "unknown product: p9".to_string(),
		};
		let body = err.to_error_response();
		assert_eq!(body.error, "PRODUCT_NOT_FOUND");
		assert!(body.details.is_none());
	}

	#[test]
	fn test_submit_request_wire_format() {
		let json = r#"{
			"customerId": "u2",
			"items": [{"productId": "p2", "quantity": 2, "selectedSize": "M"}]
		}"#;
		let request: SubmitOrderRequest = serde_json::from_str(json).unwrap();
		assert_eq!(request.customer_id, "u2");
		assert_eq!(request.items.len(), 1);
		assert_eq!(request.items[0].selected_size.as_deref(), Some("M"));
		assert!(request.advance_amount.is_none());
	}
}
