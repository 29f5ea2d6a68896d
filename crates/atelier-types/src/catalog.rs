//! Catalog reference types.
//!
//! Products and fabrics are read-only to the order core; they are owned by
//! the catalog service and only consulted to resolve prices and to check
//! which fabrics a customizable product permits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	/// Unique identifier for this product.
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	/// Unit price. Authoritative for line item pricing.
	pub price: Decimal,
	pub category: String,
	/// Whether this product can be made to measure.
	pub is_customizable: bool,
	/// Ids of fabrics permitted for custom orders of this product.
	/// Absent for non-customizable products.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fabrics: Option<Vec<String>>,
}

impl Product {
	/// Whether the given fabric may be used for a custom order of this product.
	pub fn permits_fabric(&self, fabric_id: &str) -> bool {
		self.fabrics
			.as_ref()
			.is_some_and(|ids| ids.iter().any(|id| id == fabric_id))
	}
}

/// A fabric offered for custom tailoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fabric {
	/// Unique identifier for this fabric.
	pub id: String,
	pub name: String,
	/// Reference price per meter of cloth.
	pub price_per_meter: Decimal,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn test_permits_fabric() {
		let product = Product {
			id: "p1".to_string(),
			name: "Bespoke Italian Suit".to_string(),
			description: String::new(),
			price: dec!(450),
			category: "Suits".to_string(),
			is_customizable: true,
			fabrics: Some(vec!["f1".to_string(), "f3".to_string()]),
		};
		assert!(product.permits_fabric("f1"));
		assert!(!product.permits_fabric("f2"));

		let plain = Product {
			fabrics: None,
			is_customizable: false,
			..product
		};
		assert!(!plain.permits_fabric("f1"));
	}
}
