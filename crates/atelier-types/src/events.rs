//! Order lifecycle events and the event bus.
//!
//! Every accepted workflow transition and worker assignment emits an event
//! for consumption by external collaborators (dashboard aggregation and
//! customer notification). Events flow through a broadcast bus; slow or
//! absent subscribers never block the writer.

use crate::order::{OrderStatus, WorkflowStage};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the order core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been persisted.
	Submitted {
		order_id: String,
		customer_id: String,
		total_amount: Decimal,
		timestamp: DateTime<Utc>,
	},
	/// An order moved forward in its lifecycle.
	StatusChanged {
		order_id: String,
		from_status: OrderStatus,
		to_status: OrderStatus,
		from_stage: Option<WorkflowStage>,
		to_stage: Option<WorkflowStage>,
		/// User id of the operator that requested the transition.
		actor: String,
		timestamp: DateTime<Utc>,
	},
	/// A worker was assigned to an order, replacing any previous assignee.
	WorkerAssigned {
		order_id: String,
		previous_worker_id: Option<String>,
		worker_id: String,
		actor: String,
		timestamp: DateTime<Utc>,
	},
}

/// Broadcast bus for order events.
///
/// Cloning the bus shares the underlying channel; each subscriber gets an
/// independent receiver.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	/// Creates a bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers that received it. Zero subscribers
	/// is not an error; events are advisory.
	pub fn publish(&self, event: OrderEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}
