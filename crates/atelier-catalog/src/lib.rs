//! Catalog module for the atelier order system.
//!
//! Products and fabrics are read-only reference data owned by this module.
//! The order submission path consults the catalog to resolve authoritative
//! prices (client-supplied prices are never trusted) and to check fabric
//! permissions for custom items.

use async_trait::async_trait;
use atelier_types::{ConfigSchema, Fabric, Product};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod seed;
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Error that occurs when a referenced product does not exist.
	#[error("Product not found: {0}")]
	ProductNotFound(String),
	/// Error that occurs when a referenced fabric does not exist.
	#[error("Fabric not found: {0}")]
	FabricNotFound(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for catalog sources.
///
/// Implementations own the product and fabric data; the rest of the system
/// treats it as read-only.
#[async_trait]
pub trait CatalogInterface: Send + Sync {
	/// Returns the configuration schema for this catalog implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Looks up a product by id.
	async fn get_product(&self, product_id: &str) -> Result<Product, CatalogError>;

	/// Looks up a fabric by id.
	async fn get_fabric(&self, fabric_id: &str) -> Result<Fabric, CatalogError>;

	/// Returns the full product snapshot.
	async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;

	/// Returns the full fabric snapshot.
	async fn list_fabrics(&self) -> Result<Vec<Fabric>, CatalogError>;
}

/// Type alias for catalog factory functions.
pub type CatalogFactory = fn(&toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError>;

/// Get all registered catalog implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CatalogFactory)> {
	use implementations::seed;

	vec![("seed", seed::create_catalog as CatalogFactory)]
}

/// Service that manages catalog lookups.
///
/// Wraps an underlying catalog implementation behind a stable API.
pub struct CatalogService {
	/// The underlying catalog implementation.
	implementation: Box<dyn CatalogInterface>,
}

impl CatalogService {
	/// Creates a new CatalogService with the specified implementation.
	pub fn new(implementation: Box<dyn CatalogInterface>) -> Self {
		Self { implementation }
	}

	/// Looks up a product by id.
	pub async fn get_product(&self, product_id: &str) -> Result<Product, CatalogError> {
		self.implementation.get_product(product_id).await
	}

	/// Looks up a fabric by id.
	pub async fn get_fabric(&self, fabric_id: &str) -> Result<Fabric, CatalogError> {
		self.implementation.get_fabric(fabric_id).await
	}

	/// Returns the full product snapshot.
	pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
		self.implementation.list_products().await
	}

	/// Returns the full fabric snapshot.
	pub async fn list_fabrics(&self) -> Result<Vec<Fabric>, CatalogError> {
		self.implementation.list_fabrics().await
	}
}
