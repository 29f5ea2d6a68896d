//! Catalog listing endpoints.

use atelier_catalog::{CatalogError, CatalogService};
use atelier_types::{ApiError, Fabric, Product};

/// Returns the full product snapshot.
pub async fn list_products(catalog: &CatalogService) -> Result<Vec<Product>, ApiError> {
	catalog.list_products().await.map_err(map_catalog_error)
}

/// Returns the full fabric snapshot.
pub async fn list_fabrics(catalog: &CatalogService) -> Result<Vec<Fabric>, ApiError> {
	catalog.list_fabrics().await.map_err(map_catalog_error)
}

fn map_catalog_error(err: CatalogError) -> ApiError {
	match err {
		CatalogError::ProductNotFound(id) => ApiError::NotFound {
			error_type: "PRODUCT_NOT_FOUND".to_string(),
			message: format!("Product not found: {}", id),
		},
		CatalogError::FabricNotFound(id) => ApiError::NotFound {
			error_type: "FABRIC_NOT_FOUND".to_string(),
			message: format!("Fabric not found: {}", id),
		},
		CatalogError::Configuration(message) => ApiError::InternalServerError {
			error_type: "CONFIGURATION_ERROR".to_string(),
			message,
		},
	}
}
