//! Case-insensitive multi-value header container.
//!
//! # Design
//! Names are lower-cased on the way in, so every lookup and merge is
//! case-insensitive without a custom comparator. A `BTreeMap` keeps names
//! sorted, which makes iteration (and therefore wire emission) deterministic.
//! Values keep insertion order per name.

use std::collections::BTreeMap;

/// Header name to ordered values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: BTreeMap<String, Vec<String>>,
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the values of `name`.
    pub fn add(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.map.entry(normalize(name)).or_default().push(value.into());
        self
    }

    /// Replace all values of `name` with exactly `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.map.insert(normalize(name), vec![value.into()]);
        self
    }

    /// Replace all values of `name` with `values`.
    pub fn set_all<I, V>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.map.insert(normalize(name), values);
        self
    }

    pub fn delete(&mut self, name: &str) -> &mut Self {
        self.map.remove(&normalize(name));
        self
    }

    /// For every name present in any of `others`, replace this container's
    /// values wholesale. Later containers win; names no container mentions
    /// are left alone.
    pub fn override_with<'a, I>(&mut self, others: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Headers>,
    {
        for other in others {
            for (name, values) in &other.map {
                self.map.insert(name.clone(), values.clone());
            }
        }
        self
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&normalize(name))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.map
            .get(&normalize(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&normalize(name))
    }

    /// Names in sorted order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flattened `(name, value)` pairs, one per emitted header line.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.add(k.as_ref(), v);
        }
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_insertion_order() {
        let mut h = Headers::new();
        h.add("key", "value").add("Key", "value2");
        assert_eq!(h.get_all("KEY"), ["value", "value2"]);
        assert_eq!(h.get("key"), Some("value"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn set_collapses_to_one_value() {
        let mut h = Headers::from([("accept", "a"), ("Accept", "b")]);
        h.set("ACCEPT", "c");
        assert_eq!(h.get_all("accept"), ["c"]);
    }

    #[test]
    fn delete_removes_name_and_tolerates_absent() {
        let mut h = Headers::from([("x-a", "1"), ("x-b", "2")]);
        h.delete("X-A").delete("missing");
        assert!(!h.contains("x-a"));
        assert!(h.get_all("x-a").is_empty());
        assert_eq!(h.get("x-b"), Some("2"));
    }

    #[test]
    fn override_replaces_whole_sequence() {
        let mut target = Headers::from([("Key", "old1"), ("key", "old2"), ("other", "kept")]);
        let patch = Headers::from([("key", "v")]);
        target.override_with([&patch]);
        assert_eq!(target.get_all("key"), ["v"]);
        assert_eq!(target.get_all("other"), ["kept"]);
    }

    #[test]
    fn override_last_container_wins() {
        let mut target = Headers::new();
        let first = Headers::from([("a", "1"), ("b", "1")]);
        let second = Headers::from([("a", "2")]);
        target.override_with([&first, &second]);
        assert_eq!(target.get("a"), Some("2"));
        assert_eq!(target.get("b"), Some("1"));
    }

    #[test]
    fn pairs_are_sorted_and_repeated() {
        let h = Headers::from([("b", "2"), ("a", "1"), ("b", "3")]);
        let pairs: Vec<_> = h.pairs().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("b", "3")]);
    }
}
