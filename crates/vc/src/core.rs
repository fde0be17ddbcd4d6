//! # Polymorphic Value Carriers
//!
//! Several members of a Verifiable Credential may legally appear in more than
//! one JSON shape: a lone string or a full object, a single entry or an
//! array. The carriers here let `serde` absorb either shape while the rest of
//! the crate works against one canonical form.

use serde::{Deserialize, Serialize};

/// `Kind` allows serde to serialize/deserialize a string or an object.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Kind<T> {
    /// Simple string value
    String(String),

    /// Complex object value
    Object(T),
}

impl<T: Default> Default for Kind<T> {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl<T> Kind<T> {
    /// Returns `true` if the value is a simple string.
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if the value is an object.
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns the string value, if the carrier holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Object(_) => None,
        }
    }
}

/// `Quota` allows serde to serialize/deserialize a single object or a set of
/// objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Quota<T> {
    /// Single object
    One(T),

    /// Set of objects
    Many(Vec<T>),
}

impl<T: Default> Default for Quota<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

impl<T> Quota<T> {
    /// Returns `true` if the quota is a single object.
    pub const fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// Returns `true` if the quota contains an array of objects.
    pub const fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// The number of objects held.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(set) => set.len(),
        }
    }

    /// Returns `true` when the quota holds an empty set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: PartialEq> Quota<T> {
    /// Returns `true` when `item` is the single object or a member of the
    /// set.
    pub fn contains(&self, item: &T) -> bool {
        match self {
            Self::One(one) => one == item,
            Self::Many(set) => set.contains(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn quota_shapes() {
        let one: Quota<String> = serde_json::from_value(json!("a")).expect("should deserialize");
        assert_eq!(one, Quota::One("a".into()));
        assert_eq!(one.len(), 1);
        assert!(one.contains(&"a".into()));

        let many: Quota<String> =
            serde_json::from_value(json!(["a", "b"])).expect("should deserialize");
        assert_eq!(many, Quota::Many(vec!["a".into(), "b".into()]));
        assert!(many.contains(&"b".into()));
        assert!(!many.contains(&"c".into()));
    }

    #[test]
    fn kind_shapes() {
        let string: Kind<serde_json::Value> =
            serde_json::from_value(json!("uri")).expect("should deserialize");
        assert!(string.is_string());

        let object: Kind<serde_json::Value> =
            serde_json::from_value(json!({"k": "v"})).expect("should deserialize");
        assert!(object.is_object());
        assert!(object.as_str().is_none());
    }
}
