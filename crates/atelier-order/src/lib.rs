//! Order processing module for the atelier system.
//!
//! This module contains the two core pieces of the backend: the submission
//! service, which validates a proposed item list and persists a new order
//! atomically, and the workflow tracker (see [`state`]), which advances
//! orders through their production lifecycle.
//!
//! Prices are always resolved from the catalog at submission time; nothing
//! the client sends about money is trusted. The order header and its line
//! items are written in one storage batch, so a failure anywhere in the
//! persistence step leaves no trace of the order.

use atelier_catalog::{CatalogError, CatalogService};
use atelier_storage::{StorageError, StorageService, StoreBatch};
use atelier_types::{
	EventBus, Measurements, Order, OrderEvent, OrderItem, OrderStatus, StorageKey,
	SubmitOrderItem, SubmitOrderRequest, SubmitOrderResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod state;

pub use state::WorkflowTracker;

/// Errors that can occur during order processing.
#[derive(Debug, Error)]
pub enum OrderError {
	/// Malformed or inconsistent client input. Client-correctable; the
	/// operation had no side effects.
	#[error("Validation failed for '{field}': {message}")]
	Validation { field: String, message: String },
	/// A referenced entity does not exist.
	#[error("{entity} not found: {id}")]
	NotFound { entity: &'static str, id: String },
	/// A workflow rule was violated. State is unchanged.
	#[error("Invalid transition from ({from_status}, {from_stage:?}) to ({to_status}, {to_stage:?})")]
	InvalidTransition {
		from_status: OrderStatus,
		from_stage: Option<atelier_types::WorkflowStage>,
		to_status: OrderStatus,
		to_stage: Option<atelier_types::WorkflowStage>,
	},
	/// Worker assignment attempted outside CONFIRMED/PROCESSING.
	#[error("Worker assignment not allowed while order is {0}")]
	AssignmentNotAllowed(OrderStatus),
	/// Storage-layer failure. Safe to retry the whole operation: writes are
	/// atomic, so nothing partial was committed.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for OrderError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => OrderError::NotFound {
				entity: "order",
				id: String::new(),
			},
			other => OrderError::Storage(other.to_string()),
		}
	}
}

impl From<CatalogError> for OrderError {
	fn from(err: CatalogError) -> Self {
		match err {
			CatalogError::ProductNotFound(id) => OrderError::NotFound {
				entity: "product",
				id,
			},
			CatalogError::FabricNotFound(id) => OrderError::NotFound {
				entity: "fabric",
				id,
			},
			CatalogError::Configuration(msg) => OrderError::Storage(msg),
		}
	}
}

fn validation(field: impl Into<String>, message: impl Into<String>) -> OrderError {
	OrderError::Validation {
		field: field.into(),
		message: message.into(),
	}
}

/// Validates and persists new orders.
///
/// Submission is not idempotent: retrying after a dropped success response
/// creates a second order. No idempotency key is defined in this design.
pub struct SubmissionService {
	storage: Arc<StorageService>,
	catalog: Arc<CatalogService>,
	event_bus: EventBus,
}

impl SubmissionService {
	pub fn new(
		storage: Arc<StorageService>,
		catalog: Arc<CatalogService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			storage,
			catalog,
			event_bus,
		}
	}

	/// Submits a new order.
	///
	/// Validates every proposed line item, resolves prices from the catalog,
	/// computes the total, and persists the header and items as one atomic
	/// batch. The order starts in PENDING with no workflow stage.
	pub async fn submit(
		&self,
		request: SubmitOrderRequest,
	) -> Result<SubmitOrderResponse, OrderError> {
		if request.customer_id.is_empty() {
			return Err(validation("customerId", "must not be empty"));
		}
		if request.items.is_empty() {
			return Err(validation("items", "order must contain at least one item"));
		}

		let mut items = Vec::with_capacity(request.items.len());
		for (index, proposed) in request.items.iter().enumerate() {
			items.push(self.resolve_item(index, proposed).await?);
		}

		let total_amount: Decimal = items.iter().map(OrderItem::line_total).sum();
		let advance_amount = request.advance_amount.unwrap_or(Decimal::ZERO);
		if advance_amount.is_sign_negative() {
			return Err(validation("advanceAmount", "must not be negative"));
		}
		if advance_amount > total_amount {
			return Err(validation(
				"advanceAmount",
				format!("must not exceed total amount {}", total_amount),
			));
		}

		let now = Utc::now();
		let order = Order {
			id: Uuid::new_v4().to_string(),
			customer_id: request.customer_id.clone(),
			total_amount,
			advance_amount,
			status: OrderStatus::Pending,
			workflow_stage: None,
			assigned_worker_id: None,
			created_at: now,
			updated_at: now,
		};

		// Header and item rows go through one atomic batch: either both keys
		// exist after this call, or neither does.
		let batch = StoreBatch::new()
			.put(StorageKey::Orders.as_str(), &order.id, &order)?
			.put(StorageKey::OrderItems.as_str(), &order.id, &items)?;
		self.storage
			.store_batch(batch)
			.await
			.map_err(|e| OrderError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %order.id,
			customer_id = %order.customer_id,
			total = %order.total_amount,
			items = items.len(),
			"Order submitted"
		);

		self.event_bus.publish(OrderEvent::Submitted {
			order_id: order.id.clone(),
			customer_id: order.customer_id.clone(),
			total_amount: order.total_amount,
			timestamp: now,
		});

		Ok(SubmitOrderResponse {
			due_amount: order.due_amount(),
			order_id: order.id,
			total_amount: order.total_amount,
			advance_amount: order.advance_amount,
			status: order.status,
		})
	}

	/// Loads an order header together with its line items.
	pub async fn load(&self, order_id: &str) -> Result<(Order, Vec<OrderItem>), OrderError> {
		let order: Order = self
			.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderError::NotFound {
					entity: "order",
					id: order_id.to_string(),
				},
				other => OrderError::Storage(other.to_string()),
			})?;
		let items: Vec<OrderItem> = self
			.storage
			.retrieve(StorageKey::OrderItems.as_str(), order_id)
			.await
			.map_err(|e| OrderError::Storage(e.to_string()))?;
		Ok((order, items))
	}

	/// Validates one proposed line item and captures its price.
	async fn resolve_item(
		&self,
		index: usize,
		proposed: &SubmitOrderItem,
	) -> Result<OrderItem, OrderError> {
		let field = |name: &str| format!("items[{}].{}", index, name);

		if proposed.quantity == 0 {
			return Err(validation(field("quantity"), "must be a positive integer"));
		}

		let product = self.catalog.get_product(&proposed.product_id).await?;

		let is_custom = proposed.selected_fabric_id.is_some() || proposed.measurements.is_some();
		if is_custom {
			if proposed.selected_size.is_some() {
				return Err(validation(
					field("selectedSize"),
					"custom items must not carry a size",
				));
			}
			if !product.is_customizable {
				return Err(validation(
					field("productId"),
					format!("product '{}' is not customizable", product.id),
				));
			}
			let fabric_id = proposed.selected_fabric_id.as_deref().ok_or_else(|| {
				validation(field("selectedFabricId"), "custom items require a fabric")
			})?;
			let measurements = proposed.measurements.as_ref().ok_or_else(|| {
				validation(field("measurements"), "custom items require measurements")
			})?;
			validate_measurements(&field("measurements"), measurements)?;

			let fabric = self.catalog.get_fabric(fabric_id).await?;
			if !product.permits_fabric(&fabric.id) {
				return Err(validation(
					field("selectedFabricId"),
					format!("fabric '{}' is not offered for product '{}'", fabric.id, product.id),
				));
			}
		} else if proposed.selected_size.is_none() {
			return Err(validation(
				field("selectedSize"),
				"standard items require a size",
			));
		}

		Ok(OrderItem {
			id: Uuid::new_v4().to_string(),
			product_id: product.id.clone(),
			product_name: product.name.clone(),
			quantity: proposed.quantity,
			// Price captured from the catalog now; immutable from here on.
			price: product.price,
			is_custom,
			selected_size: proposed.selected_size.clone(),
			selected_fabric: proposed.selected_fabric_id.clone(),
			measurements: proposed.measurements.clone(),
		})
	}
}

/// Checks that every present measurement value is positive.
fn validate_measurements(field: &str, measurements: &Measurements) -> Result<(), OrderError> {
	let values = measurements.named_values();
	if values.is_empty() {
		return Err(validation(field, "at least one body dimension is required"));
	}
	for (name, value) in values {
		if value <= Decimal::ZERO {
			return Err(validation(
				format!("{}.{}", field, name),
				"must be a positive number",
			));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use atelier_catalog::implementations::seed::{SeedCatalog, SeedCatalogConfig};
	use atelier_storage::implementations::memory::MemoryStorage;
	use atelier_storage::StorageInterface;
	use atelier_types::ConfigSchema;
	use rust_decimal_macros::dec;

	fn submission() -> SubmissionService {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let catalog = Arc::new(CatalogService::new(Box::new(SeedCatalog::new(
			SeedCatalogConfig::default(),
		))));
		SubmissionService::new(storage, catalog, EventBus::new(16))
	}

	fn standard_item(product_id: &str, quantity: u32, size: &str) -> SubmitOrderItem {
		SubmitOrderItem {
			product_id: product_id.to_string(),
			quantity,
			selected_size: Some(size.to_string()),
			selected_fabric_id: None,
			measurements: None,
		}
	}

	fn custom_item(product_id: &str, fabric_id: &str) -> SubmitOrderItem {
		SubmitOrderItem {
			product_id: product_id.to_string(),
			quantity: 1,
			selected_size: None,
			selected_fabric_id: Some(fabric_id.to_string()),
			measurements: Some(Measurements {
				chest: Some(dec!(42)),
				waist: Some(dec!(34)),
				..Default::default()
			}),
		}
	}

	fn request(items: Vec<SubmitOrderItem>) -> SubmitOrderRequest {
		SubmitOrderRequest {
			customer_id: "u2".to_string(),
			items,
			advance_amount: None,
		}
	}

	#[tokio::test]
	async fn test_total_resolved_from_catalog() {
		let service = submission();

		// p2 costs 85 in the catalog; two shirts in size M.
		let response = service
			.submit(request(vec![standard_item("p2", 2, "M")]))
			.await
			.unwrap();

		assert_eq!(response.total_amount, dec!(170));
		assert_eq!(response.advance_amount, Decimal::ZERO);
		assert_eq!(response.due_amount, dec!(170));
		assert_eq!(response.status, OrderStatus::Pending);
	}

	#[tokio::test]
	async fn test_mixed_cart_total() {
		let service = submission();

		let response = service
			.submit(request(vec![
				custom_item("p1", "f1"),
				standard_item("p4", 2, "One Size"),
			]))
			.await
			.unwrap();

		// 450 + 2 * 45
		assert_eq!(response.total_amount, dec!(540));
	}

	#[tokio::test]
	async fn test_empty_items_rejected() {
		let service = submission();
		let result = service.submit(request(vec![])).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "items")
		);
	}

	#[tokio::test]
	async fn test_zero_quantity_rejected() {
		let service = submission();
		let result = service.submit(request(vec![standard_item("p2", 0, "M")])).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "items[0].quantity")
		);
	}

	#[tokio::test]
	async fn test_unknown_product_rejected() {
		let service = submission();
		let result = service.submit(request(vec![standard_item("p9", 1, "M")])).await;
		assert!(matches!(
			result,
			Err(OrderError::NotFound { entity: "product", id }) if id == "p9"
		));
	}

	#[tokio::test]
	async fn test_standard_item_requires_size() {
		let service = submission();
		let mut item = standard_item("p2", 1, "M");
		item.selected_size = None;
		let result = service.submit(request(vec![item])).await;
		assert!(matches!(result, Err(OrderError::Validation { .. })));
	}

	#[tokio::test]
	async fn test_custom_item_must_not_carry_size() {
		let service = submission();
		let mut item = custom_item("p1", "f1");
		item.selected_size = Some("M".to_string());
		let result = service.submit(request(vec![item])).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "items[0].selectedSize")
		);
	}

	#[tokio::test]
	async fn test_custom_item_requires_measurements() {
		let service = submission();
		let mut item = custom_item("p1", "f1");
		item.measurements = None;
		let result = service.submit(request(vec![item])).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "items[0].measurements")
		);
	}

	#[tokio::test]
	async fn test_non_positive_measurement_rejected() {
		let service = submission();
		let mut item = custom_item("p1", "f1");
		item.measurements = Some(Measurements {
			chest: Some(dec!(0)),
			..Default::default()
		});
		let result = service.submit(request(vec![item])).await;
		assert!(matches!(result, Err(OrderError::Validation { .. })));
	}

	#[tokio::test]
	async fn test_non_customizable_product_rejected_for_custom_order() {
		let service = submission();
		// p4 is a tie; not customizable.
		let result = service.submit(request(vec![custom_item("p4", "f1")])).await;
		assert!(matches!(result, Err(OrderError::Validation { .. })));
	}

	#[tokio::test]
	async fn test_fabric_not_offered_for_product() {
		let service = submission();
		// p1 permits f1/f3 but not f2.
		let result = service.submit(request(vec![custom_item("p1", "f2")])).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "items[0].selectedFabricId")
		);
	}

	#[tokio::test]
	async fn test_unknown_fabric_rejected() {
		let service = submission();
		let result = service.submit(request(vec![custom_item("p1", "f9")])).await;
		assert!(matches!(
			result,
			Err(OrderError::NotFound { entity: "fabric", .. })
		));
	}

	#[tokio::test]
	async fn test_advance_must_not_exceed_total() {
		let service = submission();
		let mut req = request(vec![standard_item("p2", 1, "M")]);
		req.advance_amount = Some(dec!(100));
		let result = service.submit(req).await;
		assert!(
			matches!(result, Err(OrderError::Validation { field, .. }) if field == "advanceAmount")
		);
	}

	#[tokio::test]
	async fn test_advance_and_due_sum_to_total() {
		let service = submission();
		let mut req = request(vec![custom_item("p1", "f1")]);
		req.advance_amount = Some(dec!(200));
		let response = service.submit(req).await.unwrap();

		assert_eq!(response.total_amount, dec!(450));
		assert_eq!(response.advance_amount, dec!(200));
		assert_eq!(response.due_amount, dec!(250));
		assert_eq!(
			response.advance_amount + response.due_amount,
			response.total_amount
		);
	}

	#[tokio::test]
	async fn test_persisted_order_loads_back() {
		let service = submission();
		let response = service
			.submit(request(vec![standard_item("p2", 2, "M")]))
			.await
			.unwrap();

		let (order, items) = service.load(&response.order_id).await.unwrap();
		assert_eq!(order.total_amount, dec!(170));
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].price, dec!(85));
		assert_eq!(items[0].quantity, 2);
	}

	#[tokio::test]
	async fn test_load_unknown_order() {
		let service = submission();
		let result = service.load("missing").await;
		assert!(matches!(
			result,
			Err(OrderError::NotFound { entity: "order", .. })
		));
	}

	#[tokio::test]
	async fn test_submitted_event_emitted() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let catalog = Arc::new(CatalogService::new(Box::new(SeedCatalog::new(
			SeedCatalogConfig::default(),
		))));
		let bus = EventBus::new(16);
		let mut rx = bus.subscribe();
		let service = SubmissionService::new(storage, catalog, bus);

		let response = service
			.submit(request(vec![standard_item("p2", 2, "M")]))
			.await
			.unwrap();

		match rx.recv().await.unwrap() {
			OrderEvent::Submitted {
				order_id,
				total_amount,
				..
			} => {
				assert_eq!(order_id, response.order_id);
				assert_eq!(total_amount, dec!(170));
			},
			other => panic!("unexpected event: {:?}", other),
		}
	}

	/// Backend whose batch write always fails. Single-key writes panic, which
	/// proves submission persists exclusively through the atomic batch.
	struct FailingStorage;

	#[async_trait]
	impl StorageInterface for FailingStorage {
		async fn get_bytes(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
			Err(StorageError::NotFound)
		}

		async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
			panic!("submission must write through set_batch");
		}

		async fn set_batch(&self, _entries: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
			Err(StorageError::Backend("disk full".to_string()))
		}

		async fn delete(&self, _key: &str) -> Result<(), StorageError> {
			Ok(())
		}

		async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
			Ok(false)
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			unimplemented!("not used in tests")
		}
	}

	#[tokio::test]
	async fn test_persistence_failure_surfaces_as_storage_error() {
		let storage = Arc::new(StorageService::new(Box::new(FailingStorage)));
		let catalog = Arc::new(CatalogService::new(Box::new(SeedCatalog::new(
			SeedCatalogConfig::default(),
		))));
		let service = SubmissionService::new(storage, catalog, EventBus::new(16));

		let result = service.submit(request(vec![standard_item("p2", 1, "M")])).await;
		assert!(matches!(result, Err(OrderError::Storage(_))));
	}
}
