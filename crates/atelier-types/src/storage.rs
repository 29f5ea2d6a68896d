//! Storage key namespaces.
//!
//! Keys in the storage layer are formed as `namespace:id`. The order header
//! and its line items live in separate namespaces, mirroring the
//! header-row/item-rows split of a relational layout, and are always written
//! together in one atomic batch.

use std::str::FromStr;

/// Namespaces used by the atelier storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Order headers.
	Orders,
	/// Line item lists, keyed by order id.
	OrderItems,
}

impl StorageKey {
	/// The namespace string as used in storage keys.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::OrderItems => "order_items",
		}
	}

	/// All known namespaces.
	pub fn all() -> Vec<StorageKey> {
		vec![StorageKey::Orders, StorageKey::OrderItems]
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(StorageKey::Orders),
			"order_items" => Ok(StorageKey::OrderItems),
			_ => Err(()),
		}
	}
}
