use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable, globally-unique identifier of a persisted object.
///
/// Ids are opaque non-empty strings as far as the engine is concerned. Ids
/// minted by [`ObjectId::generate`] follow the `<prefix>_<epoch-millis>_<uuid>`
/// convention, which lets backends discover graph roots by prefix.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Wrap an existing id string. Fails if the string is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Mint a fresh id of the form `<prefix>_<epoch-millis>_<uuid>`.
    ///
    /// The prefix must be non-empty and must not contain `_`, otherwise
    /// [`prefix`](Self::prefix) could not recover it.
    pub fn generate(prefix: &str) -> Result<Self, TypeError> {
        if prefix.is_empty() || prefix.contains('_') {
            return Err(TypeError::InvalidPrefix(prefix.to_string()));
        }
        let millis = chrono::Utc::now().timestamp_millis();
        let uuid = uuid::Uuid::now_v7();
        Ok(Self(format!("{prefix}_{millis}_{uuid}")))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<prefix>` part of a conventional id, if the id has one.
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once('_').map(|(prefix, _)| prefix)
    }

    /// The `<epoch-millis>` part of a conventional id, if it parses.
    pub fn timestamp_millis(&self) -> Option<i64> {
        let mut parts = self.0.splitn(3, '_');
        parts.next()?;
        let millis = parts.next()?;
        parts.next()?;
        millis.parse().ok()
    }

    /// Consume the id, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(ObjectId::new(""), Err(TypeError::EmptyId));
    }

    #[test]
    fn generated_ids_follow_convention() {
        let id = ObjectId::generate("model").unwrap();
        assert_eq!(id.prefix(), Some("model"));
        assert!(id.timestamp_millis().unwrap() > 0);
        assert!(id.as_str().starts_with("model_"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ObjectId::generate("person").unwrap();
        let b = ObjectId::generate("person").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generate_rejects_bad_prefix() {
        assert!(ObjectId::generate("").is_err());
        assert!(ObjectId::generate("my_model").is_err());
    }

    #[test]
    fn free_form_ids_have_no_timestamp() {
        let id = ObjectId::new("john").unwrap();
        assert_eq!(id.prefix(), None);
        assert_eq!(id.timestamp_millis(), None);
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = ObjectId::new("node-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"node-1\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn serde_rejects_empty_string() {
        assert!(serde_json::from_str::<ObjectId>("\"\"").is_err());
    }

    proptest! {
        #[test]
        fn prefix_survives_generation(prefix in "[a-z][a-z0-9-]{0,15}") {
            let id = ObjectId::generate(&prefix).unwrap();
            prop_assert_eq!(id.prefix(), Some(prefix.as_str()));
            prop_assert!(id.timestamp_millis().is_some());
        }
    }
}
