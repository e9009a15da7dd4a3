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

//! The `FieldCatalog` data type.

use crate::model::{Range, RangeValue, Scalar};
use std::fmt;
use tours_core::model::{FieldName, ModelError, ModelResult};

/// The type of the values that a field holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Free-form text.  Values are compared verbatim and never coerced.
    Text,

    /// Integers or floating point numbers.
    Number,

    /// Dates or points in time.
    Date,

    /// Booleans.
    Bool,
}

impl FieldKind {
    /// Returns the name of the kind, for error reporting.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Bool => "boolean",
        }
    }

    /// Converts the raw `value` of an equality filter on `field` into a value of this kind.
    ///
    /// The `null` literal is accepted by every kind.
    pub fn coerce(self, field: &FieldName, value: &Scalar) -> ModelResult<Scalar> {
        let coerced = value.clone().coerce();
        let ok = match (self, &coerced) {
            (_, Scalar::Null) => return Ok(coerced),
            (FieldKind::Text, _) => return Ok(value.clone()),
            (FieldKind::Number, Scalar::Number(_)) => true,
            (FieldKind::Bool, Scalar::Bool(_)) => true,
            (FieldKind::Date, Scalar::String(_)) => matches!(
                RangeValue::parse(value),
                Ok(RangeValue::Date(_)) | Ok(RangeValue::DateTime(_))
            ),
            (_, _) => false,
        };
        if !ok {
            return Err(ModelError(format!(
                "Field '{}' expects a {} value but got '{}'",
                field, self, value
            )));
        }
        Ok(coerced)
    }

    /// Ensures that `range` is a valid filter for `field`.
    pub fn check_range(self, field: &FieldName, range: &Range) -> ModelResult<()> {
        let expected = match self {
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Text | FieldKind::Bool => {
                return Err(ModelError(format!(
                    "Field '{}' holds {} values and does not support ranges",
                    field, self
                )));
            }
        };
        for bound in range.bounds() {
            if bound.value().kind() != expected {
                return Err(ModelError(format!(
                    "Field '{}' expects {} bounds but got '{}'",
                    field,
                    expected,
                    bound.value()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical, ordered set of fields of an entity, optionally with the kind of each field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldCatalog(Vec<(FieldName, Option<FieldKind>)>);

impl FieldCatalog {
    /// Creates a catalog from the given field `names`, validating each of them.  Fields created
    /// this way accept values of any kind.
    pub fn new<I, S>(names: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(names.into_iter().map(|name| (name, None)))
    }

    /// Creates a catalog from the given `fields` and their kinds, validating each of them.
    pub fn with_kinds<I, S>(fields: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (S, FieldKind)>,
        S: Into<String>,
    {
        Self::build(fields.into_iter().map(|(name, kind)| (name, Some(kind))))
    }

    /// Builds a catalog from `fields`, rejecting invalid and duplicate names.
    fn build<I, S>(fields: I) -> ModelResult<Self>
    where
        I: Iterator<Item = (S, Option<FieldKind>)>,
        S: Into<String>,
    {
        let mut entries: Vec<(FieldName, Option<FieldKind>)> = vec![];
        for (name, kind) in fields {
            let name = FieldName::new(name)?;
            if entries.iter().any(|(other, _)| *other == name) {
                return Err(ModelError(format!(
                    "Field '{}' appears more than once in catalog",
                    name
                )));
            }
            entries.push((name, kind));
        }
        Ok(Self(entries))
    }

    /// Returns true if `name` is part of the catalog.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(f, _)| f.as_str() == name)
    }

    /// Returns the kind of the field `name`, if the field is known and has a kind.
    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.0.iter().find(|(f, _)| f.as_str() == name).and_then(|(_, kind)| *kind)
    }

    /// Iterates over the fields in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter().map(|(f, _)| f)
    }

    /// Returns the number of fields in the catalog.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the catalog has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
