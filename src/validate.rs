//! Response payload validation.
//!
//! A [`ResponseDecoder`] turns a parsed JSON value into the typed payload a fetch lifecycle
//! settles with. [`JsonDecoder`] only deserializes; [`SchemaDecoder`] first checks a
//! [`Schema`] of required primitive fields and reports the first violation in plain words.
//! Either way a failure is a [`ValidationError`], which the state machine places in the
//! same error slot as HTTP and transport failures.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Primitive JSON types a [`Schema`] field can require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
	/// JSON string.
	String,
	/// JSON number.
	Number,
	/// JSON boolean.
	Boolean,
}
impl Primitive {
	/// Returns `true` when `value` has this primitive type.
	pub fn matches(self, value: &Value) -> bool {
		match self {
			Self::String => value.is_string(),
			Self::Number => value.is_number(),
			Self::Boolean => value.is_boolean(),
		}
	}

	/// Returns a stable label suitable for diagnostics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Number => "number",
			Self::Boolean => "boolean",
		}
	}
}
impl Display for Primitive {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Payload validation failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Body was not valid JSON.
	#[error("Response body is not valid JSON: {message}")]
	MalformedJson {
		/// Parser diagnostic.
		message: String,
	},
	/// Payload root was not a JSON object.
	#[error("Expected an object, received {found}")]
	NotAnObject {
		/// JSON type actually received.
		found: &'static str,
	},
	/// A required field was absent.
	#[error("Required field `{field}` is missing")]
	MissingField {
		/// Field name.
		field: String,
	},
	/// A field had the wrong primitive type.
	#[error("Field `{field}` must be a {expected}, received {found}")]
	WrongType {
		/// Field name.
		field: String,
		/// Expected primitive type.
		expected: Primitive,
		/// JSON type actually received.
		found: &'static str,
	},
	/// Payload passed the schema but could not be deserialized into the target type.
	#[error("Payload does not match the expected shape at `{path}`: {message}")]
	Shape {
		/// Path to the offending value.
		path: String,
		/// Deserializer diagnostic.
		message: String,
	},
}
impl ValidationError {
	pub(crate) fn malformed_json(err: serde_json::Error) -> Self {
		Self::MalformedJson { message: err.to_string() }
	}

	fn shape(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Shape { path: err.path().to_string(), message: err.inner().to_string() }
	}
}

/// Set of required fields and their primitive types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
	fields: Vec<(String, Primitive)>,
}
impl Schema {
	/// Creates an empty object schema.
	pub fn object() -> Self {
		Self::default()
	}

	/// Requires `name` to be present with the `kind` primitive type.
	pub fn field(mut self, name: impl Into<String>, kind: Primitive) -> Self {
		self.fields.push((name.into(), kind));

		self
	}

	/// Required fields in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, Primitive)> {
		self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
	}

	/// Checks `value` against the schema, reporting the first violation.
	pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
		let object =
			value.as_object().ok_or(ValidationError::NotAnObject { found: json_type(value) })?;

		for (name, kind) in &self.fields {
			match object.get(name) {
				None => return Err(ValidationError::MissingField { field: name.clone() }),
				Some(field) if !kind.matches(field) =>
					return Err(ValidationError::WrongType {
						field: name.clone(),
						expected: *kind,
						found: json_type(field),
					}),
				Some(_) => {},
			}
		}

		Ok(())
	}
}

/// Types that describe their own validation schema.
pub trait Validated
where
	Self: DeserializeOwned,
{
	/// Schema every payload must satisfy before deserialization.
	fn schema() -> Schema;
}

/// Converts a parsed JSON value into a typed payload.
pub trait ResponseDecoder<T>
where
	Self: Send + Sync,
{
	/// Decodes `value` or explains why it is unacceptable.
	fn decode(&self, value: Value) -> Result<T, ValidationError>;
}

/// Decoder that deserializes without a schema pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;
impl<T> ResponseDecoder<T> for JsonDecoder
where
	T: DeserializeOwned,
{
	fn decode(&self, value: Value) -> Result<T, ValidationError> {
		deserialize(value)
	}
}

/// Decoder that validates a [`Schema`] before deserializing.
#[derive(Clone, Debug)]
pub struct SchemaDecoder {
	schema: Schema,
}
impl SchemaDecoder {
	/// Creates a decoder for an explicit schema.
	pub fn new(schema: Schema) -> Self {
		Self { schema }
	}

	/// Creates a decoder for a type's own schema.
	pub fn of<T>() -> Self
	where
		T: Validated,
	{
		Self::new(T::schema())
	}

	/// Returns the schema enforced by this decoder.
	pub fn schema(&self) -> &Schema {
		&self.schema
	}
}
impl<T> ResponseDecoder<T> for SchemaDecoder
where
	T: DeserializeOwned,
{
	fn decode(&self, value: Value) -> Result<T, ValidationError> {
		self.schema.validate(&value)?;

		deserialize(value)
	}
}

fn deserialize<T>(value: Value) -> Result<T, ValidationError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(ValidationError::shape)
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
