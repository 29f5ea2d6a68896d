//! Shared types for the atelier order system.
//!
//! This crate defines the domain model (orders, catalog entries, users),
//! the API request/response types, the order lifecycle events and event bus,
//! storage key namespaces, and the configuration validation framework used
//! by all other crates in the workspace.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod events;
pub mod order;
pub mod storage;
pub mod validation;

pub use api::{
	ApiError, AssignWorkerRequest, ErrorResponse, LoginRequest, LoginResponse, OrderDetailResponse,
	SubmitOrderItem, SubmitOrderRequest, SubmitOrderResponse, TransitionRequest,
};
pub use auth::{Role, User};
pub use catalog::{Fabric, Product};
pub use events::{EventBus, OrderEvent};
pub use order::{Measurements, Order, OrderItem, OrderStatus, WorkflowStage};
pub use storage::StorageKey;
pub use validation::{ConfigSchema, Field, FieldType, Schema, ValidationError};
