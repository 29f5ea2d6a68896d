//! Seeded catalog implementation.
//!
//! Loads products and fabrics from the configuration file, falling back to a
//! built-in demo set when none are configured. Designed for demo and test
//! deployments where a live catalog service isn't available.

use crate::{CatalogError, CatalogInterface};
use async_trait::async_trait;
use atelier_types::{ConfigSchema, Fabric, Product, ValidationError};
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;

/// Configuration for the seeded catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalogConfig {
	/// Products to serve. Empty means use the built-in demo set.
	#[serde(default)]
	pub products: Vec<Product>,
	/// Fabrics to serve. Empty means use the built-in demo set.
	#[serde(default)]
	pub fabrics: Vec<Fabric>,
}

/// Catalog backed by an in-memory seed set.
pub struct SeedCatalog {
	products: HashMap<String, Product>,
	fabrics: HashMap<String, Fabric>,
}

impl SeedCatalog {
	/// Creates a catalog from the given config, falling back to demo data
	/// for any section left empty.
	pub fn new(config: SeedCatalogConfig) -> Self {
		let products = if config.products.is_empty() {
			demo_products()
		} else {
			config.products
		};
		let fabrics = if config.fabrics.is_empty() {
			demo_fabrics()
		} else {
			config.fabrics
		};

		Self {
			products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
			fabrics: fabrics.into_iter().map(|f| (f.id.clone(), f)).collect(),
		}
	}
}

#[async_trait]
impl CatalogInterface for SeedCatalog {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SeedCatalogSchema)
	}

	async fn get_product(&self, product_id: &str) -> Result<Product, CatalogError> {
		self.products
			.get(product_id)
			.cloned()
			.ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))
	}

	async fn get_fabric(&self, fabric_id: &str) -> Result<Fabric, CatalogError> {
		self.fabrics
			.get(fabric_id)
			.cloned()
			.ok_or_else(|| CatalogError::FabricNotFound(fabric_id.to_string()))
	}

	async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
		let mut products: Vec<Product> = self.products.values().cloned().collect();
		products.sort_by(|a, b| a.id.cmp(&b.id));
		Ok(products)
	}

	async fn list_fabrics(&self) -> Result<Vec<Fabric>, CatalogError> {
		let mut fabrics: Vec<Fabric> = self.fabrics.values().cloned().collect();
		fabrics.sort_by(|a, b| a.id.cmp(&b.id));
		Ok(fabrics)
	}
}

/// Configuration schema for SeedCatalog.
pub struct SeedCatalogSchema;

impl ConfigSchema for SeedCatalogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Structure is checked by serde; here we only enforce value rules.
		let parsed: SeedCatalogConfig = config
			.clone()
			.try_into()
			.map_err(|e: toml::de::Error| ValidationError::InvalidValue {
				field: "catalog".to_string(),
				message: e.message().to_string(),
			})?;

		for product in &parsed.products {
			if product.price.is_sign_negative() || product.price.is_zero() {
				return Err(ValidationError::InvalidValue {
					field: format!("products.{}.price", product.id),
					message: "price must be positive".to_string(),
				});
			}
		}
		for fabric in &parsed.fabrics {
			if fabric.price_per_meter.is_sign_negative() {
				return Err(ValidationError::InvalidValue {
					field: format!("fabrics.{}.pricePerMeter", fabric.id),
					message: "price per meter must not be negative".to_string(),
				});
			}
		}

		Ok(())
	}
}

/// Factory function to create a seeded catalog from configuration.
///
/// Configuration parameters:
/// - `products`: array of product tables (optional, demo set if absent)
/// - `fabrics`: array of fabric tables (optional, demo set if absent)
pub fn create_catalog(config: &toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError> {
	SeedCatalogSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let parsed: SeedCatalogConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| CatalogError::Configuration(e.message().to_string()))?;

	Ok(Box::new(SeedCatalog::new(parsed)))
}

/// The built-in demo product set.
fn demo_products() -> Vec<Product> {
	vec![
		Product {
			id: "p1".to_string(),
			name: "Bespoke Italian Suit".to_string(),
			description: "Fully canvassed, hand-finished buttonholes, premium lining.".to_string(),
			price: dec!(450),
			category: "Suits".to_string(),
			is_customizable: true,
			fabrics: Some(vec!["f1".to_string(), "f3".to_string()]),
		},
		Product {
			id: "p2".to_string(),
			name: "Signature White Shirt".to_string(),
			description: "Crisp, breathable, and perfectly fitted.".to_string(),
			price: dec!(85),
			category: "Shirts".to_string(),
			is_customizable: true,
			fabrics: Some(vec!["f2".to_string()]),
		},
		Product {
			id: "p3".to_string(),
			name: "Tailored Chinos".to_string(),
			description: "Versatile trousers between formal and casual.".to_string(),
			price: dec!(65),
			category: "Pants".to_string(),
			is_customizable: true,
			fabrics: Some(vec!["f2".to_string(), "f3".to_string()]),
		},
		Product {
			id: "p4".to_string(),
			name: "Silk Jacquard Tie".to_string(),
			description: "Woven silk tie with a subtle geometric pattern.".to_string(),
			price: dec!(45),
			category: "Accessories".to_string(),
			is_customizable: false,
			fabrics: None,
		},
		Product {
			id: "p5".to_string(),
			name: "Summer Linen Blazer".to_string(),
			description: "Unstructured and lightweight.".to_string(),
			price: dec!(220),
			category: "Blazers".to_string(),
			is_customizable: true,
			fabrics: Some(vec!["f3".to_string()]),
		},
	]
}

/// The built-in demo fabric set.
fn demo_fabrics() -> Vec<Fabric> {
	vec![
		Fabric {
			id: "f1".to_string(),
			name: "Italian Merino Wool".to_string(),
			price_per_meter: dec!(50),
		},
		Fabric {
			id: "f2".to_string(),
			name: "Egyptian Cotton".to_string(),
			price_per_meter: dec!(30),
		},
		Fabric {
			id: "f3".to_string(),
			name: "Linen Blend".to_string(),
			price_per_meter: dec!(35),
		},
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_demo_set_lookup() {
		let catalog = SeedCatalog::new(SeedCatalogConfig::default());

		let product = catalog.get_product("p2").await.unwrap();
		assert_eq!(product.price, dec!(85));
		assert!(product.permits_fabric("f2"));

		let fabric = catalog.get_fabric("f1").await.unwrap();
		assert_eq!(fabric.price_per_meter, dec!(50));
	}

	#[tokio::test]
	async fn test_unknown_ids() {
		let catalog = SeedCatalog::new(SeedCatalogConfig::default());

		assert!(matches!(
			catalog.get_product("p9").await,
			Err(CatalogError::ProductNotFound(id)) if id == "p9"
		));
		assert!(matches!(
			catalog.get_fabric("f9").await,
			Err(CatalogError::FabricNotFound(_))
		));
	}

	#[tokio::test]
	async fn test_listing_is_sorted() {
		let catalog = SeedCatalog::new(SeedCatalogConfig::default());
		let products = catalog.list_products().await.unwrap();
		assert_eq!(products.len(), 5);
		assert_eq!(products[0].id, "p1");
		assert_eq!(products[4].id, "p5");
	}

	#[tokio::test]
	async fn test_configured_products_override_demo_set() {
		let config: toml::Value = toml::from_str(
			r#"
[[products]]
id = "p100"
name = "Overcoat"
price = 300.0
category = "Coats"
isCustomizable = false
"#,
		)
		.unwrap();

		let catalog = create_catalog(&config).unwrap();
		assert!(catalog.get_product("p100").await.is_ok());
		assert!(catalog.get_product("p1").await.is_err());
		// Fabrics were not configured, so the demo set remains.
		assert!(catalog.get_fabric("f1").await.is_ok());
	}

	#[test]
	fn test_negative_price_rejected() {
		let config: toml::Value = toml::from_str(
			r#"
[[products]]
id = "p100"
name = "Overcoat"
price = -5.0
category = "Coats"
isCustomizable = false
"#,
		)
		.unwrap();

		assert!(matches!(
			create_catalog(&config),
			Err(CatalogError::Configuration(_))
		));
	}
}
