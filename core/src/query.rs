//! Query parameter container with canonical encoding.
//!
//! Keys are kept in a `BTreeMap` so `encode` always emits them sorted; values
//! within a key keep insertion order. Encoding uses the
//! `application/x-www-form-urlencoded` byte rules from the `url` crate, which
//! also makes this container the field set for URL-encoded form bodies.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// Parameter name to ordered values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    map: BTreeMap<String, Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.map.insert(key.into(), vec![value.into()]);
        self
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.map.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn delete(&mut self, key: &str) -> &mut Self {
        self.map.remove(key);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// `k=v` pairs, keys sorted, joined with `&`, percent-encoded.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.map {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.add(k, v);
        }
        query
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
