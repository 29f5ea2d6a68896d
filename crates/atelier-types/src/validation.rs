//! Configuration validation utilities.
//!
//! A small framework for validating TOML configuration tables: each backend
//! implementation exposes a schema describing its required and optional
//! fields, and the service validates raw config against it before wiring
//! anything up.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// The expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// An array whose elements all share one type.
	Array(Box<FieldType>),
	/// A nested table with its own schema.
	Table(Schema),
}

/// A named field within a schema, with an optional custom validator.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	validator: Option<Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator run after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// A validation schema for a TOML table: required fields plus optional ones.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Checks presence of required fields, field types (recursing into
	/// arrays and nested tables), and any custom validators.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for (field, required) in self
			.required
			.iter()
			.map(|f| (f, true))
			.chain(self.optional.iter().map(|f| (f, false)))
		{
			let value = match table.get(&field.name) {
				Some(value) => value,
				None if required => {
					return Err(ValidationError::MissingField(field.name.clone()))
				},
				None => continue,
			};

			check_field_type(&field.name, value, &field.field_type)?;

			if let Some(validator) = &field.validator {
				validator(value).map_err(|msg| ValidationError::InvalidValue {
					field: field.name.clone(),
					message: msg,
				})?;
			}
		}

		Ok(())
	}
}

/// Checks that a value matches the expected field type, recursing into
/// arrays and nested tables.
fn check_field_type(
	field_name: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			if min.is_some_and(|m| int_val < m) || max.is_some_and(|m| int_val > m) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} out of range", int_val),
				});
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		},
		FieldType::Array(inner) => {
			let array = value.as_array().ok_or_else(|| mismatch("array"))?;
			for (i, item) in array.iter().enumerate() {
				check_field_type(&format!("{}[{}]", field_name, i), item, inner)?;
			}
		},
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| prefix_field(field_name, e))?;
		},
	}

	Ok(())
}

/// Prefixes nested field names with the parent table name for error reporting.
fn prefix_field(parent: &str, err: ValidationError) -> ValidationError {
	match err {
		ValidationError::MissingField(f) => {
			ValidationError::MissingField(format!("{}.{}", parent, f))
		},
		ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
			field: format!("{}.{}", parent, field),
			message,
		},
		ValidationError::TypeMismatch {
			field,
			expected,
			actual,
		} => ValidationError::TypeMismatch {
			field: format!("{}.{}", parent, field),
			expected,
			actual,
		},
	}
}

/// A configuration schema that can validate TOML values.
///
/// Implemented by each pluggable backend so the service can validate raw
/// configuration before instantiating it.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
