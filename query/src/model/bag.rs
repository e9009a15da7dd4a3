// Tours
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! The `ParameterBag` data type and its query string parser.

use crate::model::Scalar;
use std::collections::BTreeMap;
use tours_core::model::{ModelError, ModelResult};

/// The value of a single parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A plain value, as in `difficulty=easy`.
    Scalar(Scalar),

    /// A one-level nested mapping of operator names to values, as in `price[gte]=100`.
    Map(BTreeMap<String, Scalar>),
}

impl ParamValue {
    /// Creates a nested value out of `(operator, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Scalar>,
    {
        ParamValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Scalar> for ParamValue {
    fn from(scalar: Scalar) -> Self {
        ParamValue::Scalar(scalar)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(Scalar::from(s))
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(Scalar::from(s))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Scalar(Scalar::from(b))
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Scalar(Scalar::from(i))
    }
}

impl From<u64> for ParamValue {
    fn from(u: u64) -> Self {
        ParamValue::Scalar(Scalar::from(u))
    }
}

/// Raw parameters of a single request, in the order in which they were given.
///
/// Keys are unique: inserting a key that already exists replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBag {
    /// The parameters as `(name, value)` pairs.
    entries: Vec<(String, ParamValue)>,
}

impl ParameterBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw, URL-encoded query string such as `price[gte]=50&sort=-price`.
    ///
    /// Keys of the form `name[op]` are grouped into nested values under `name`.  Values are kept
    /// as strings: coercing them into other types is up to the translator.  Parameters with an
    /// empty name are ignored.
    pub fn from_query(raw: &str) -> ModelResult<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
            .map_err(|e| ModelError(format!("Invalid query string: {}", e)))?;

        let mut bag = ParameterBag::new();
        for (key, value) in pairs {
            if key.is_empty() {
                continue;
            }

            let (name, op) = split_key(&key)?;
            let existing = bag.entries.iter_mut().find(|(k, _)| k == name).map(|(_, v)| v);
            match (existing, op) {
                (None, None) => {
                    bag.entries.push((name.to_owned(), ParamValue::Scalar(Scalar::String(value))))
                }
                (None, Some(op)) => bag.entries.push((
                    name.to_owned(),
                    ParamValue::Map(BTreeMap::from([(op.to_owned(), Scalar::String(value))])),
                )),
                (Some(ParamValue::Map(ops)), Some(op)) => {
                    if ops.insert(op.to_owned(), Scalar::String(value)).is_some() {
                        return Err(ModelError(format!(
                            "Parameter {}[{}] cannot have more than one value",
                            name, op
                        )));
                    }
                }
                (Some(ParamValue::Scalar(_)), None) => {
                    return Err(ModelError(format!(
                        "Parameter {} cannot have more than one value",
                        name
                    )));
                }
                (Some(_), _) => {
                    return Err(ModelError(format!(
                        "Parameter {} cannot be both a value and a set of operators",
                        name
                    )));
                }
            }
        }
        Ok(bag)
    }

    /// Adds or replaces the parameter `key` and returns the bag for chaining.
    pub fn with<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces the parameter `key`, returning its previous value.
    pub fn insert<K: Into<String>, V: Into<ParamValue>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<ParamValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, old)) => Some(std::mem::replace(old, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value of the parameter `key`, if present.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true if the parameter `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits a parameter `key` into its name and, if nested, its operator.
fn split_key(key: &str) -> ModelResult<(&str, Option<&str>)> {
    let malformed = || ModelError(format!("Malformed parameter name '{}'", key));

    match key.find('[') {
        None if key.contains(']') => Err(malformed()),
        None => Ok((key, None)),
        Some(pos) => {
            let name = &key[..pos];
            if name.is_empty() || name.contains(']') {
                return Err(malformed());
            }
            match key[pos + 1..].strip_suffix(']') {
                Some(op) if !op.is_empty() && !op.contains(['[', ']']) => Ok((name, Some(op))),
                _ => Err(malformed()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_empty() {
        assert!(ParameterBag::from_query("").unwrap().is_empty());
    }

    #[test]
    fn test_from_query_scalars_keep_order() {
        let bag = ParameterBag::from_query("sort=-price&difficulty=easy&limit=5").unwrap();
        let keys = bag.iter().map(|(k, _)| k).collect::<Vec<&str>>();
        assert_eq!(vec!["sort", "difficulty", "limit"], keys);
        assert_eq!(Some(&ParamValue::from("-price")), bag.get("sort"));
        assert_eq!(Some(&ParamValue::from("5")), bag.get("limit"));
    }

    #[test]
    fn test_from_query_decodes() {
        let bag = ParameterBag::from_query("name=The+Forest%20Hiker&fields=name%2Cprice").unwrap();
        assert_eq!(Some(&ParamValue::from("The Forest Hiker")), bag.get("name"));
        assert_eq!(Some(&ParamValue::from("name,price")), bag.get("fields"));
    }

    #[test]
    fn test_from_query_nested() {
        let bag = ParameterBag::from_query("price[gte]=50&duration=5&price%5Blte%5D=200").unwrap();
        assert_eq!(2, bag.len());
        assert_eq!(
            Some(&ParamValue::map([("gte", "50"), ("lte", "200")])),
            bag.get("price")
        );
        assert_eq!(Some(&ParamValue::from("5")), bag.get("duration"));
    }

    #[test]
    fn test_from_query_values_not_coerced() {
        let bag = ParameterBag::from_query("isPremium=true&price=100").unwrap();
        assert_eq!(
            Some(&ParamValue::Scalar(Scalar::String("true".to_owned()))),
            bag.get("isPremium")
        );
        assert_eq!(Some(&ParamValue::Scalar(Scalar::String("100".to_owned()))), bag.get("price"));
    }

    #[test]
    fn test_from_query_skips_empty_names() {
        let bag = ParameterBag::from_query("=foo&a=1").unwrap();
        assert_eq!(1, bag.len());
        assert!(bag.contains_key("a"));
    }

    #[test]
    fn test_from_query_missing_value() {
        let bag = ParameterBag::from_query("flag").unwrap();
        assert_eq!(Some(&ParamValue::from("")), bag.get("flag"));
    }

    #[test]
    fn test_from_query_repeated() {
        assert_eq!(
            ModelError("Parameter a cannot have more than one value".to_owned()),
            ParameterBag::from_query("a=1&a=2").unwrap_err()
        );
        assert_eq!(
            ModelError("Parameter a[gt] cannot have more than one value".to_owned()),
            ParameterBag::from_query("a[gt]=1&a[gt]=2").unwrap_err()
        );
    }

    #[test]
    fn test_from_query_mixed_forms() {
        for raw in ["a=1&a[gt]=2", "a[gt]=2&a=1"] {
            assert_eq!(
                ModelError("Parameter a cannot be both a value and a set of operators".to_owned()),
                ParameterBag::from_query(raw).unwrap_err()
            );
        }
    }

    #[test]
    fn test_from_query_malformed_names() {
        for key in ["a[]", "a[b][c]", "a[b", "a]b", "[b]", "a]b[c]", "a[b]c"] {
            let raw = serde_urlencoded::to_string([(key, "1")]).unwrap();
            assert_eq!(
                ModelError(format!("Malformed parameter name '{}'", key)),
                ParameterBag::from_query(&raw).unwrap_err()
            );
        }
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut bag = ParameterBag::new().with("a", "1").with("b", "2");
        assert_eq!(Some(ParamValue::from("1")), bag.insert("a", 3i64));
        assert_eq!(None, bag.insert("c", true));

        let entries = bag.iter().map(|(k, v)| (k.to_owned(), v.clone())).collect::<Vec<_>>();
        assert_eq!(
            vec![
                ("a".to_owned(), ParamValue::from(3i64)),
                ("b".to_owned(), ParamValue::from("2")),
                ("c".to_owned(), ParamValue::from(true)),
            ],
            entries
        );
    }
}
