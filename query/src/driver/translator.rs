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

//! The query translator.

use crate::driver::exclusions::exclude;
use crate::driver::{
    FIELDS_KEY, LIMIT_KEY, PAGE_KEY, QueryError, QueryResult, RESERVED_KEYS, SORT_KEY,
};
use crate::model::{
    FieldCatalog, Filter, FilterValue, ParamValue, ParameterBag, Projection, QueryDescriptor,
    Range, Scalar, SortDirection, SortKey,
};
use log::{debug, warn};
use tours_core::model::FieldName;

/// Translates parameter bags into query descriptors.
///
/// A translator is configured once, typically when registering the route that uses it, so that
/// configuration problems surface before any request is served.
#[derive(Clone, Debug, Default)]
pub struct QueryTranslator {
    /// Fields of the entity being queried, if known.
    catalog: Option<FieldCatalog>,

    /// Projection to use when the request does not choose its own fields.
    default_projection: Option<Projection>,

    /// Whether to reject fields that are not in the catalog.
    strict: bool,
}

impl QueryTranslator {
    /// Creates a translator that accepts any field and returns all fields by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a translator for an entity with the given `catalog` of fields.
    pub fn with_catalog(catalog: FieldCatalog) -> Self {
        Self { catalog: Some(catalog), ..Default::default() }
    }

    /// Hides the given fields from the results of requests that do not list their own `fields`.
    pub fn with_default_exclusions(mut self, exclusions: &[&str]) -> QueryResult<Self> {
        let catalog = match self.catalog.as_ref() {
            Some(catalog) => catalog,
            None => {
                warn!("Refusing default exclusions {:?} without a catalog", exclusions);
                return Err(missing_catalog("default exclusions"));
            }
        };
        self.default_projection = Some(exclude(catalog, exclusions)?);
        Ok(self)
    }

    /// Makes translation fail when a request refers to a field that is not in the catalog.
    pub fn reject_unknown_fields(mut self) -> QueryResult<Self> {
        if self.catalog.is_none() {
            warn!("Refusing to reject unknown fields without a catalog");
            return Err(missing_catalog("strict field checks"));
        }
        self.strict = true;
        Ok(self)
    }

    /// Translates the parameters in `bag` into a query descriptor.
    pub fn translate(&self, bag: &ParameterBag) -> QueryResult<QueryDescriptor> {
        let known = if self.strict { self.catalog.as_ref() } else { None };
        translate_bag(bag, known, self.default_projection.as_ref())
    }
}

/// Translates the parameters in `bag` into a query descriptor.
///
/// When `default_exclusions` is given, requests that do not list their own `fields` get a
/// projection with every field of `catalog` except for the exclusions.  Passing exclusions
/// without a catalog is a configuration error.
pub fn translate(
    bag: &ParameterBag,
    catalog: Option<&FieldCatalog>,
    default_exclusions: Option<&[&str]>,
) -> QueryResult<QueryDescriptor> {
    let default_projection = match (catalog, default_exclusions) {
        (_, None) => None,
        (Some(catalog), Some(exclusions)) => Some(exclude(catalog, exclusions)?),
        (None, Some(_)) => return Err(missing_catalog("default exclusions")),
    };
    translate_bag(bag, None, default_projection.as_ref())
}

/// Builds the error returned when `feature` is requested without a catalog.
fn missing_catalog(feature: &str) -> QueryError {
    QueryError::ConfigurationError(format!("Cannot use {} without a field catalog", feature))
}

/// Translates `bag`, restricting fields to those in `known` if present and using
/// `default_projection` when the request does not choose its fields.
fn translate_bag(
    bag: &ParameterBag,
    known: Option<&FieldCatalog>,
    default_projection: Option<&Projection>,
) -> QueryResult<QueryDescriptor> {
    let mut filter = Filter::default();
    for (key, value) in bag.iter() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }
        let field = parse_field(key, known)?;
        let kind = known.and_then(|known| known.kind(field.as_str()));
        let value = match value {
            ParamValue::Scalar(scalar) => match kind {
                Some(kind) => FilterValue::Equals(kind.coerce(&field, scalar)?),
                None => FilterValue::Equals(scalar.clone().coerce()),
            },
            ParamValue::Map(operators) => {
                let range = Range::from_operators(key, operators)?;
                if let Some(kind) = kind {
                    kind.check_range(&field, &range)?;
                }
                FilterValue::Range(range)
            }
        };
        filter.push(field, value);
    }

    let limit = bag.get(LIMIT_KEY).map(|v| parse_positive_integer(LIMIT_KEY, v)).transpose()?;
    let page = bag.get(PAGE_KEY).map(|v| parse_positive_integer(PAGE_KEY, v)).transpose()?;
    let offset = match (page, limit) {
        (Some(page), Some(limit)) => match (page - 1).checked_mul(limit) {
            Some(offset) => Some(offset),
            None => {
                return Err(QueryError::ValidationError(format!(
                    "Page {} is out of range for limit {}",
                    page, limit
                )));
            }
        },
        _ => None,
    };

    let mut fields = vec![];
    if let Some(value) = bag.get(FIELDS_KEY) {
        for name in parse_list(FIELDS_KEY, value)? {
            fields.push(parse_field(name, known)?);
        }
    }
    let projection = if fields.is_empty() {
        default_projection.cloned()
    } else {
        Some(Projection::new(fields))
    };

    let mut order_by: Vec<SortKey> = vec![];
    if let Some(value) = bag.get(SORT_KEY) {
        for entry in parse_list(SORT_KEY, value)? {
            let (name, direction) = match entry.strip_prefix('-') {
                Some(name) => (name, SortDirection::Desc),
                None => (entry, SortDirection::Asc),
            };
            let field = parse_field(name, known)?;
            if !order_by.iter().any(|k| *k.field() == field) {
                order_by.push(SortKey::new(field, direction));
            }
        }
    }

    let descriptor = QueryDescriptor::new(filter, projection, limit, offset, order_by);
    debug!("Translated query {:?} into {:?}", bag, descriptor);
    Ok(descriptor)
}

/// Validates the field `name` and, if `known` is present, ensures it is part of that catalog.
fn parse_field(name: &str, known: Option<&FieldCatalog>) -> QueryResult<FieldName> {
    let field = FieldName::new(name)?;
    if let Some(known) = known {
        if !known.contains(field.as_str()) {
            return Err(QueryError::ValidationError(format!("Unknown field '{}'", field)));
        }
    }
    Ok(field)
}

/// Parses the value of the control key `key` as a strictly positive integer.
///
/// Integral floats such as `2.0` are accepted.
fn parse_positive_integer(key: &str, value: &ParamValue) -> QueryResult<u64> {
    let invalid =
        || QueryError::ValidationError(format!("Parameter '{}' must be a positive integer", key));

    let number = match value {
        ParamValue::Scalar(scalar) => match scalar.clone().coerce() {
            Scalar::Number(n) => n,
            _ => return Err(invalid()),
        },
        ParamValue::Map(_) => return Err(invalid()),
    };

    let integer = match number.as_u64() {
        Some(i) => i,
        None => match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f > 0.0 && f < u64::MAX as f64 => f as u64,
            _ => return Err(invalid()),
        },
    };
    if integer == 0 {
        return Err(invalid());
    }
    Ok(integer)
}

/// Parses the value of the control key `key` as a comma-separated list, dropping empty entries.
fn parse_list<'a>(key: &str, value: &'a ParamValue) -> QueryResult<Vec<&'a str>> {
    match value {
        ParamValue::Scalar(Scalar::String(s)) => {
            Ok(s.split(',').map(str::trim).filter(|e| !e.is_empty()).collect())
        }
        _ => Err(QueryError::ValidationError(format!(
            "Parameter '{}' must be a comma-separated list of field names",
            key
        ))),
    }
}
