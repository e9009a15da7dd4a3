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

//! The `FieldName` data type.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize, de::Visitor};
use std::fmt;

/// Maximum length of a field name.
pub(crate) const MAX_FIELD_NAME_LENGTH: usize = 64;

/// Represents a correctly-formatted (but maybe non-existent) field name of an entity.
///
/// Field names are plain identifiers: they start with an ASCII letter or an underscore and
/// continue with ASCII alphanumerics or underscores.  Unlike usernames, field names are
/// case-sensitive because they have to match the names of the entity's attributes verbatim.
///
/// Given these restrictions, field names can be safely embedded in quoted SQL identifiers.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    /// Creates a new field name from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.is_empty() {
            return Err(ModelError("Field name cannot be empty".to_owned()));
        }
        if s.len() > MAX_FIELD_NAME_LENGTH {
            return Err(ModelError(format!("Field name '{}' is too long", s)));
        }

        for (i, ch) in s.chars().enumerate() {
            let valid = if i == 0 {
                ch.is_ascii_alphabetic() || ch == '_'
            } else {
                ch.is_ascii_alphanumeric() || ch == '_'
            };
            if !valid {
                return Err(ModelError(format!(
                    "Unsupported character '{}' in field name '{}'",
                    ch, s
                )));
            }
        }

        Ok(Self(s))
    }

    /// Returns a string view of the field name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for FieldName {
    /// Creates a new field name from a hardcoded string, which must be valid.
    fn from(name: &'static str) -> Self {
        FieldName::new(name).expect("Hardcoded field names must be valid")
    }
}

/// A deserialization visitor for a `FieldName`.
struct FieldNameVisitor;

impl Visitor<'_> for FieldNameVisitor {
    type Value = FieldName;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        FieldName::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        FieldName::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(FieldNameVisitor)
    }
}
