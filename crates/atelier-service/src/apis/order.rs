//! Order endpoints: submission, retrieval, workflow transitions and worker
//! assignment.
//!
//! Access rules live here. Customers act only on their own orders; status
//! transitions require an operator (admin or worker); worker assignment is
//! admin-only. The handlers delegate the actual work to the order crate and
//! translate its errors onto HTTP status codes.

use atelier_order::{OrderError, SubmissionService, WorkflowTracker};
use atelier_types::{
	ApiError, AssignWorkerRequest, Order, OrderDetailResponse, OrderItem, Role,
	SubmitOrderRequest, SubmitOrderResponse, TransitionRequest, User,
};

/// Submits a new order on behalf of the caller.
///
/// Customers may only submit for themselves; operators may submit on behalf
/// of any customer (e.g. walk-in bookings taken at the counter).
pub async fn submit(
	submission: &SubmissionService,
	user: &User,
	request: SubmitOrderRequest,
) -> Result<SubmitOrderResponse, ApiError> {
	if user.role == Role::Customer && request.customer_id != user.id {
		return Err(forbidden("Customers may only submit their own orders"));
	}

	submission.submit(request).await.map_err(map_order_error)
}

/// Retrieves an order with its line items.
pub async fn get_order(
	submission: &SubmissionService,
	user: &User,
	order_id: &str,
) -> Result<OrderDetailResponse, ApiError> {
	let (order, items) = submission.load(order_id).await.map_err(map_order_error)?;

	if user.role == Role::Customer && order.customer_id != user.id {
		return Err(forbidden("Customers may only view their own orders"));
	}

	Ok(detail(order, items))
}

/// Applies a workflow transition. Operators only.
pub async fn transition(
	tracker: &WorkflowTracker,
	submission: &SubmissionService,
	user: &User,
	order_id: &str,
	request: TransitionRequest,
) -> Result<OrderDetailResponse, ApiError> {
	if !user.role.is_operator() {
		return Err(forbidden("Only staff may change order status"));
	}

	let order = tracker
		.transition(order_id, request, &user.id)
		.await
		.map_err(map_order_error)?;
	let (_, items) = submission.load(order_id).await.map_err(map_order_error)?;

	Ok(detail(order, items))
}

/// Assigns a worker to an order. Admin only.
pub async fn assign_worker(
	tracker: &WorkflowTracker,
	submission: &SubmissionService,
	user: &User,
	order_id: &str,
	request: AssignWorkerRequest,
) -> Result<OrderDetailResponse, ApiError> {
	if user.role != Role::Admin {
		return Err(forbidden("Only admins may assign workers"));
	}
	if request.worker_id.is_empty() {
		return Err(ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message: "workerId must not be empty".to_string(),
			details: None,
		});
	}

	let order = tracker
		.assign_worker(order_id, &request.worker_id, &user.id)
		.await
		.map_err(map_order_error)?;
	let (_, items) = submission.load(order_id).await.map_err(map_order_error)?;

	Ok(detail(order, items))
}

fn forbidden(message: &str) -> ApiError {
	ApiError::Forbidden {
		message: message.to_string(),
	}
}

/// Composes the full order detail body from a header and its items.
fn detail(order: Order, items: Vec<OrderItem>) -> OrderDetailResponse {
	OrderDetailResponse {
		due_amount: order.due_amount(),
		id: order.id,
		customer_id: order.customer_id,
		items,
		total_amount: order.total_amount,
		advance_amount: order.advance_amount,
		status: order.status,
		workflow_stage: order.workflow_stage,
		assigned_worker_id: order.assigned_worker_id,
		created_at: order.created_at,
		updated_at: order.updated_at,
	}
}

/// Maps order-processing errors onto API errors.
fn map_order_error(err: OrderError) -> ApiError {
	match err {
		OrderError::Validation { field, message } => ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message: format!("Validation failed for '{}': {}", field, message),
			details: Some(serde_json::json!({ "field": field })),
		},
		OrderError::NotFound { entity, id } => ApiError::NotFound {
			error_type: format!("{}_NOT_FOUND", entity.to_uppercase()),
			message: format!("{} not found: {}", entity, id),
		},
		OrderError::InvalidTransition {
			from_status,
			from_stage,
			to_status,
			to_stage,
		} => ApiError::Conflict {
			error_type: "INVALID_TRANSITION".to_string(),
			message: format!(
				"Invalid transition from ({}, {:?}) to ({}, {:?})",
				from_status, from_stage, to_status, to_stage
			),
			details: Some(serde_json::json!({
				"fromStatus": from_status,
				"fromStage": from_stage,
				"toStatus": to_status,
				"toStage": to_stage,
			})),
		},
		OrderError::AssignmentNotAllowed(status) => ApiError::Conflict {
			error_type: "ASSIGNMENT_NOT_ALLOWED".to_string(),
			message: format!("Worker assignment not allowed while order is {}", status),
			details: None,
		},
		OrderError::Storage(message) => ApiError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message,
		},
	}
}
