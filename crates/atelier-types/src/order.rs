//! Order domain types.
//!
//! This module defines the order aggregate as it is persisted: a header row
//! holding identity, totals and workflow state, plus the line items captured
//! at booking time. Line item prices are resolved from the catalog when the
//! order is submitted and are never recomputed afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an order through its lifecycle.
///
/// Statuses advance monotonically; no backward transition is defined.
/// `Delivered` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been submitted but not yet confirmed by an operator.
	Pending,
	/// Order has been confirmed and may be assigned to a worker.
	Confirmed,
	/// Order is in production; `workflow_stage` tracks the sub-state.
	Processing,
	/// Production is complete and the order awaits pickup/delivery.
	Ready,
	/// Order has been handed over. Terminal.
	Delivered,
}

impl OrderStatus {
	/// Returns the status that directly follows this one, or `None` for the
	/// terminal status.
	pub fn next(&self) -> Option<OrderStatus> {
		match self {
			OrderStatus::Pending => Some(OrderStatus::Confirmed),
			OrderStatus::Confirmed => Some(OrderStatus::Processing),
			OrderStatus::Processing => Some(OrderStatus::Ready),
			OrderStatus::Ready => Some(OrderStatus::Delivered),
			OrderStatus::Delivered => None,
		}
	}

	/// Whether this status ends the order lifecycle.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "PENDING"),
			OrderStatus::Confirmed => write!(f, "CONFIRMED"),
			OrderStatus::Processing => write!(f, "PROCESSING"),
			OrderStatus::Ready => write!(f, "READY"),
			OrderStatus::Delivered => write!(f, "DELIVERED"),
		}
	}
}

/// Production sub-state of an order while its status is `Processing`.
///
/// Stages advance monotonically, one step at a time. `Done` means production
/// is finished and the status may advance to `Ready`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
	Cutting,
	Sewing,
	Finishing,
	Pressing,
	Done,
}

impl WorkflowStage {
	/// Returns the stage that directly follows this one, or `None` for `Done`.
	pub fn next(&self) -> Option<WorkflowStage> {
		match self {
			WorkflowStage::Cutting => Some(WorkflowStage::Sewing),
			WorkflowStage::Sewing => Some(WorkflowStage::Finishing),
			WorkflowStage::Finishing => Some(WorkflowStage::Pressing),
			WorkflowStage::Pressing => Some(WorkflowStage::Done),
			WorkflowStage::Done => None,
		}
	}
}

impl fmt::Display for WorkflowStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorkflowStage::Cutting => write!(f, "CUTTING"),
			WorkflowStage::Sewing => write!(f, "SEWING"),
			WorkflowStage::Finishing => write!(f, "FINISHING"),
			WorkflowStage::Pressing => write!(f, "PRESSING"),
			WorkflowStage::Done => write!(f, "DONE"),
		}
	}
}

/// Body measurements for a custom line item.
///
/// All fields are optional; a present field must be a positive number.
/// Present only on custom items, absent (not zeroed) on standard ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub neck: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chest: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub waist: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub shoulder: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sleeve_length: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub length: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inseam: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hip: Option<Decimal>,
	/// Free-text tailoring instructions from the customer.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub special_instructions: Option<String>,
}

impl Measurements {
	/// Returns every dimension that is present, paired with its field name.
	///
	/// Used by validation to check that present values are positive without
	/// repeating the field list at every call site.
	pub fn named_values(&self) -> Vec<(&'static str, Decimal)> {
		[
			("neck", self.neck),
			("chest", self.chest),
			("waist", self.waist),
			("shoulder", self.shoulder),
			("sleeveLength", self.sleeve_length),
			("length", self.length),
			("inseam", self.inseam),
			("hip", self.hip),
		]
		.into_iter()
		.filter_map(|(name, value)| value.map(|v| (name, v)))
		.collect()
	}
}

/// One line of an order, captured immutably at booking time.
///
/// Exactly one of `selected_size` (standard) or `selected_fabric` plus
/// `measurements` (custom) is present, according to `is_custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
	/// Unique identifier for this line item.
	pub id: String,
	/// Catalog product this line references.
	pub product_id: String,
	/// Product name snapshot at booking time.
	pub product_name: String,
	/// Ordered quantity. Always positive.
	pub quantity: u32,
	/// Unit price resolved from the catalog at booking time.
	/// Never recomputed from the live catalog afterwards.
	pub price: Decimal,
	/// Whether this line is made to measure.
	pub is_custom: bool,
	/// Garment size for standard items.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selected_size: Option<String>,
	/// Fabric id for custom items.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selected_fabric: Option<String>,
	/// Measurements for custom items.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub measurements: Option<Measurements>,
}

impl OrderItem {
	/// The line total: unit price times quantity.
	pub fn line_total(&self) -> Decimal {
		self.price * Decimal::from(self.quantity)
	}
}

/// Order header as persisted in the orders namespace.
///
/// Line items live under their own storage key and are written together
/// with the header in one atomic batch. `due_amount` is always derived,
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Customer that placed the order.
	pub customer_id: String,
	/// Sum of line totals, fixed at creation.
	pub total_amount: Decimal,
	/// Deposit captured at booking. Never exceeds `total_amount`.
	pub advance_amount: Decimal,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Production sub-state. Only meaningful while status is `Processing`;
	/// retained at its final value from `Ready` onward.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_stage: Option<WorkflowStage>,
	/// Worker currently assigned, if any. At most one at a time.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assigned_worker_id: Option<String>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// The remaining balance: total minus advance.
	pub fn due_amount(&self) -> Decimal {
		self.total_amount - self.advance_amount
	}
}
