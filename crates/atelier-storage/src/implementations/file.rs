//! File-based storage backend implementation.
//!
//! Stores each key as a file on disk, written via a temp file and an atomic
//! rename. Batch writes are staged completely before any entry is published;
//! a failure during publishing unwinds the entries already made visible.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use atelier_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

/// File-based storage implementation.
///
/// Provides simple persistence without external dependencies. Batches are
/// intended for creating new entries (the order submission path); the unwind
/// on a failed publish deletes keys the batch already published.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and
	/// appending a .bin extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	async fn ensure_base_dir(&self) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	/// Writes to a temp file and renames it into place.
	async fn write_atomic(&self, path: &PathBuf, data: &[u8]) -> Result<(), StorageError> {
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.ensure_base_dir().await?;
		let path = self.get_file_path(key);
		self.write_atomic(&path, &value).await
	}

	async fn set_batch(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
		self.ensure_base_dir().await?;

		// Stage everything first so publishing cannot run out of disk or
		// permissions halfway through.
		let mut staged = Vec::with_capacity(entries.len());
		for (key, value) in &entries {
			let path = self.get_file_path(key);
			let temp_path = path.with_extension("tmp");
			if let Err(e) = fs::write(&temp_path, value).await {
				for (_, temp) in &staged {
					let _ = fs::remove_file(temp).await;
				}
				return Err(StorageError::Backend(e.to_string()));
			}
			staged.push((path, temp_path));
		}

		// Publish: rename each staged file into place. On failure, unwind the
		// entries already published and discard the remaining staged files.
		let mut published = Vec::with_capacity(staged.len());
		for (path, temp_path) in &staged {
			if let Err(e) = fs::rename(temp_path, path).await {
				for done in &published {
					if let Err(cleanup_err) = fs::remove_file(done).await {
						tracing::warn!(
							"Failed to unwind batch entry {:?}: {}",
							done,
							cleanup_err
						);
					}
				}
				for (_, temp) in &staged {
					let _ = fs::remove_file(temp).await;
				}
				return Err(StorageError::Backend(e.to_string()));
			}
			published.push(path.clone());
		}

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		Ok(path.exists())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn test_basic_operations() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		let key = "orders:o1";
		storage.set_bytes(key, b"header".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"header");
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_delete_missing_key_is_ok() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		assert!(storage.delete("orders:missing").await.is_ok());
	}

	#[tokio::test]
	async fn test_batch_publishes_all_entries() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_batch(vec![
				("orders:o1".to_string(), b"header".to_vec()),
				("order_items:o1".to_string(), b"items".to_vec()),
			])
			.await
			.unwrap();

		assert_eq!(storage.get_bytes("orders:o1").await.unwrap(), b"header");
		assert_eq!(
			storage.get_bytes("order_items:o1").await.unwrap(),
			b"items"
		);

		// No stray temp files left behind.
		let mut entries = std::fs::read_dir(dir.path()).unwrap();
		assert!(entries.all(|e| {
			e.unwrap().path().extension() == Some(std::ffi::OsStr::new("bin"))
		}));
	}

	#[tokio::test]
	async fn test_creates_base_directory() {
		let dir = tempdir().unwrap();
		let nested = dir.path().join("nested").join("storage");
		let storage = FileStorage::new(nested);

		storage.set_bytes("orders:o1", b"x".to_vec()).await.unwrap();
		assert!(storage.exists("orders:o1").await.unwrap());
	}
}
