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

//! The `QueryDescriptor` data type and its parts.

use crate::model::{Range, Scalar};
use derive_getters::Getters;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tours_core::model::FieldName;

/// The condition that a single field must satisfy.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// The field must be equal to the value.
    Equals(Scalar),

    /// The field must fall within the range.
    Range(Range),
}

/// Conditions that records must satisfy, in the order in which they were given.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(Vec<(FieldName, FilterValue)>);

impl Filter {
    /// Appends a condition.  Callers guarantee that `field` is not yet present.
    pub(crate) fn push(&mut self, field: FieldName, value: FilterValue) {
        debug_assert!(self.get(field.as_str()).is_none(), "Duplicate filter {}", field);
        self.0.push((field, value));
    }

    /// Returns the condition for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.0.iter().find(|(f, _)| f.as_str() == field).map(|(_, v)| v)
    }

    /// Iterates over all conditions.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FilterValue)> {
        self.0.iter().map(|(f, v)| (f, v))
    }

    /// Returns the number of conditions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no conditions, in which case all records match.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// The fields to return for every matching record.
///
/// A projection is never empty.  Fields that are not part of it are not selected.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection(Vec<FieldName>);

impl Projection {
    /// Creates a projection from a non-empty list of `fields`, dropping duplicates.
    pub(crate) fn new(fields: Vec<FieldName>) -> Self {
        let mut projection = Self(Vec::with_capacity(fields.len()));
        for field in fields {
            if !projection.0.contains(&field) {
                projection.0.push(field);
            }
        }
        debug_assert!(!projection.0.is_empty(), "Projections cannot be empty");
        projection
    }

    /// Returns true if `field` is selected.
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f.as_str() == field)
    }

    /// Returns the selected fields in order.
    pub fn fields(&self) -> &[FieldName] {
        &self.0
    }
}

impl Serialize for Projection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in &self.0 {
            map.serialize_entry(field, &true)?;
        }
        map.end()
    }
}

/// Direction of a sort key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest values first.
    Asc,

    /// Largest values first.
    Desc,
}

/// A single sort criterion.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct SortKey {
    /// The field to sort by.
    field: FieldName,

    /// The direction in which to sort.
    direction: SortDirection,
}

impl SortKey {
    /// Creates a new sort key.
    pub fn new(field: FieldName, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// The result of translating the parameters of a request.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    /// Conditions that records must satisfy.
    filter: Filter,

    /// Fields to return, or all of them if not present.
    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<Projection>,

    /// Maximum number of records to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,

    /// Number of records to skip.  Only present when `limit` is.
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,

    /// Sort criteria, primary first.
    order_by: Vec<SortKey>,
}

impl QueryDescriptor {
    /// Creates a new descriptor from its parts.
    pub(crate) fn new(
        filter: Filter,
        projection: Option<Projection>,
        limit: Option<u64>,
        offset: Option<u64>,
        order_by: Vec<SortKey>,
    ) -> Self {
        debug_assert!(offset.is_none() || limit.is_some(), "Offset requires a limit");
        Self { filter, projection, limit, offset, order_by }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_projection_dedups() {
        let projection =
            Projection::new(vec!["name".into(), "price".into(), "name".into()]);
        assert_eq!(&[FieldName::from("name"), FieldName::from("price")], projection.fields());
        assert!(projection.contains("price"));
        assert!(!projection.contains("password"));
    }

    #[test]
    fn test_descriptor_serialize_minimal() {
        let descriptor = QueryDescriptor::new(Filter::default(), None, None, None, vec![]);
        assert_eq!(
            serde_json::json!({"filter": {}, "orderBy": []}),
            serde_json::to_value(&descriptor).unwrap()
        );
    }

    #[test]
    fn test_descriptor_serialize_full() {
        let mut filter = Filter::default();
        filter.push("difficulty".into(), FilterValue::Equals(Scalar::from("easy")));
        let range = Range::from_operators(
            "price",
            &BTreeMap::from([("lt".to_owned(), Scalar::from("1000"))]),
        )
        .unwrap();
        filter.push("price".into(), FilterValue::Range(range));

        let descriptor = QueryDescriptor::new(
            filter,
            Some(Projection::new(vec!["name".into(), "price".into()])),
            Some(10),
            Some(20),
            vec![
                SortKey::new("price".into(), SortDirection::Desc),
                SortKey::new("name".into(), SortDirection::Asc),
            ],
        );
        assert_eq!(
            serde_json::json!({
                "filter": {"difficulty": "easy", "price": {"lt": 1000}},
                "projection": {"name": true, "price": true},
                "limit": 10,
                "offset": 20,
                "orderBy": [
                    {"field": "price", "direction": "desc"},
                    {"field": "name", "direction": "asc"},
                ],
            }),
            serde_json::to_value(&descriptor).unwrap()
        );
    }

    #[test]
    fn test_filter_lookup() {
        let mut filter = Filter::default();
        filter.push("isPremium".into(), FilterValue::Equals(Scalar::Bool(true)));
        assert_eq!(1, filter.len());
        assert_eq!(Some(&FilterValue::Equals(Scalar::Bool(true))), filter.get("isPremium"));
        assert_eq!(None, filter.get("price"));
    }
}
