use indexmap::{IndexMap, map::IntoIter};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::Value;

/// An object value.
///
/// Fields keep their insertion order, which is what determines response key
/// order: selections are already merged by response name during field
/// collection, so adding a field twice replaces the earlier value.
#[derive(Clone, Debug, PartialEq)]
pub struct Object<S> {
    key_value_list: IndexMap<String, Value<S>>,
}

impl<S> Object<S> {
    /// Creates a new [`Object`] value with a fixed number of preallocated
    /// slots for field-value pairs.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            key_value_list: IndexMap::with_capacity(size),
        }
    }

    /// Adds a new field with a value.
    ///
    /// If there is already a field with the same name the old value is
    /// replaced and returned.
    pub fn add_field<K: Into<String>>(&mut self, k: K, value: Value<S>) -> Option<Value<S>> {
        self.key_value_list.insert(k.into(), value)
    }

    /// Checks if this [`Object`] already contains a field with the given
    /// name.
    pub fn contains_field(&self, k: &str) -> bool {
        self.key_value_list.contains_key(k)
    }

    /// Returns an iterator over all field-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value<S>)> {
        self.key_value_list.iter()
    }

    /// Returns an iterator over all mutable field-value pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value<S>)> {
        self.key_value_list.iter_mut()
    }

    /// Returns the current number of fields.
    pub fn field_count(&self) -> usize {
        self.key_value_list.len()
    }

    /// Returns the value of the given field, if present.
    pub fn get_field_value(&self, key: &str) -> Option<&Value<S>> {
        self.key_value_list.get(key)
    }
}

impl<S> IntoIterator for Object<S> {
    type Item = (String, Value<S>);
    type IntoIter = IntoIter<String, Value<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.key_value_list.into_iter()
    }
}

impl<K: Into<String>, S> FromIterator<(K, Value<S>)> for Object<S> {
    fn from_iter<I: IntoIterator<Item = (K, Value<S>)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut obj = Self::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            obj.add_field(k, v);
        }
        obj
    }
}

impl<S: Serialize> Serialize for Object<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(self.field_count()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
