//! HTTP server for the atelier storefront API.
//!
//! This module provides the HTTP surface of the service: routing, CORS, and
//! the thin handlers that authenticate the caller and delegate to the apis
//! modules.

use crate::Services;
use atelier_config::ApiConfig;
use atelier_types::{
	ApiError, AssignWorkerRequest, Fabric, LoginRequest, LoginResponse, OrderDetailResponse,
	Product, SubmitOrderRequest, SubmitOrderResponse, TransitionRequest,
};
use axum::{
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	response::Json,
	routing::{get, patch, post},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The wired services the handlers delegate to.
	pub services: Arc<Services>,
}

/// Builds the API router.
///
/// Catalog listings and login are public; everything under /orders requires a
/// bearer token.
pub fn build_router(services: Arc<Services>) -> Router {
	let state = AppState { services };

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/auth/login", post(handle_login))
				.route("/products", get(handle_list_products))
				.route("/fabrics", get(handle_list_fabrics))
				.route("/orders", post(handle_submit_order))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/status", patch(handle_transition))
				.route("/orders/{id}/assign-worker", patch(handle_assign_worker)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	services: Arc<Services>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(services);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Atelier API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/auth/login requests.
async fn handle_login(
	State(state): State<AppState>,
	Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
	match crate::apis::auth::login(&state.services.auth, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Login failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/products requests.
async fn handle_list_products(
	State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
	let products = crate::apis::catalog::list_products(&state.services.catalog).await?;
	Ok(Json(products))
}

/// Handles GET /api/fabrics requests.
async fn handle_list_fabrics(State(state): State<AppState>) -> Result<Json<Vec<Fabric>>, ApiError> {
	let fabrics = crate::apis::catalog::list_fabrics(&state.services.catalog).await?;
	Ok(Json(fabrics))
}

/// Handles POST /api/orders requests. Replies 201 on success.
async fn handle_submit_order(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<SubmitOrderResponse>), ApiError> {
	let user = crate::apis::auth::authenticate(&state.services.auth, &headers).await?;
	match crate::apis::order::submit(&state.services.submission, &user, request).await {
		Ok(response) => Ok((StatusCode::CREATED, Json(response))),
		Err(e) => {
			tracing::warn!("Order submission failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<OrderDetailResponse>, ApiError> {
	let user = crate::apis::auth::authenticate(&state.services.auth, &headers).await?;
	match crate::apis::order::get_order(&state.services.submission, &user, &id).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order retrieval failed: {}", e);
			Err(e)
		},
	}
}

/// Handles PATCH /api/orders/{id}/status requests.
async fn handle_transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<TransitionRequest>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
	let user = crate::apis::auth::authenticate(&state.services.auth, &headers).await?;
	match crate::apis::order::transition(
		&state.services.tracker,
		&state.services.submission,
		&user,
		&id,
		request,
	)
	.await
	{
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order transition failed: {}", e);
			Err(e)
		},
	}
}

/// Handles PATCH /api/orders/{id}/assign-worker requests.
async fn handle_assign_worker(
	Path(id): Path<String>,
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<AssignWorkerRequest>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
	let user = crate::apis::auth::authenticate(&state.services.auth, &headers).await?;
	match crate::apis::order::assign_worker(
		&state.services.tracker,
		&state.services.submission,
		&user,
		&id,
		request,
	)
	.await
	{
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Worker assignment failed: {}", e);
			Err(e)
		},
	}
}
