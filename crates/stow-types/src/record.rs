//! The serialized wire record.
//!
//! Every persisted object travels as a flat JSON object:
//!
//! ```json
//! { "type": "person", "id": "person_1700000000000_…", "schema": "v1", "firstName": "John" }
//! ```
//!
//! `type`, `id` and `schema` form the envelope; every other key belongs to the
//! object's own type. Fields are kept in a sorted map so that encoding the
//! same record twice yields identical bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::object::ObjectId;

const RESERVED_FIELDS: [&str; 3] = ["type", "id", "schema"];

/// Plain-data representation of one object, tagged with type, id and schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedRecord {
    /// Registry tag of the type that can deserialize this record.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Identity of the object this record describes.
    pub id: ObjectId,
    /// Free-form version tag interpreted only by the owning type.
    pub schema: String,
    /// Type-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SerializedRecord {
    /// Create a record with an empty field set.
    pub fn new(type_tag: impl Into<String>, id: ObjectId, schema: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id,
            schema: schema.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with_field<T: Serialize + ?Sized>(
        mut self,
        name: &str,
        value: &T,
    ) -> Result<Self, TypeError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Set a type-specific field. Envelope names are rejected.
    pub fn set<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), TypeError> {
        if RESERVED_FIELDS.contains(&name) {
            return Err(TypeError::ReservedField(name.to_string()));
        }
        let value =
            serde_json::to_value(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Decode a required field.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, TypeError> {
        let value = self.fields.get(name).ok_or_else(|| TypeError::MissingField {
            id: self.id.to_string(),
            field: name.to_string(),
        })?;
        self.decode(name, value.clone())
    }

    /// Decode a field that may be absent or `null`.
    pub fn optional_field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, TypeError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.decode(name, value.clone()).map(Some),
        }
    }

    /// Decode an optional reference to another object.
    pub fn reference(&self, name: &str) -> Result<Option<ObjectId>, TypeError> {
        self.optional_field(name)
    }

    /// Encode as compact JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, name: &str, value: Value) -> Result<T, TypeError> {
        serde_json::from_value(value).map_err(|e| TypeError::InvalidField {
            id: self.id.to_string(),
            field: name.to_string(),
            reason: e.to_string(),
        })
    }
}
