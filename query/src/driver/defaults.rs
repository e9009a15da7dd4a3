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

//! Caller-supplied values for control keys.

use crate::driver::{FIELDS_KEY, LIMIT_KEY, QueryError, QueryResult, SORT_KEY};
use crate::model::{ParamValue, ParameterBag};
use log::warn;
use tours_core::env::get_optional_var;
use tours_core::model::FieldName;

/// Values for the `limit`, `sort` and `fields` control keys that a route wants to impose.
///
/// Defaults can either fill in keys that a request omitted, which is how a route sets its page
/// size, or replace whatever the request said, which is how a route implements a preset such as
/// "the five best-rated cheap tours".
///
/// Values are validated when they are set so that a bad default is reported as a configuration
/// problem and never as an invalid request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryDefaults {
    /// Value for the `limit` key.
    limit: Option<u64>,

    /// Value for the `sort` key.
    sort: Option<String>,

    /// Value for the `fields` key.
    fields: Option<String>,
}

/// Checks that `value`, the default for the control key `key`, is a non-empty comma-separated list
/// of field names, each optionally prefixed by `-` if `allow_desc` is true.
fn validate_list(key: &str, value: &str, allow_desc: bool) -> QueryResult<()> {
    let invalid = |detail: String| {
        warn!("Refusing default {} '{}': {}", key, value, detail);
        QueryError::ConfigurationError(format!("Invalid default {} '{}': {}", key, value, detail))
    };

    let mut count = 0;
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let name = match entry.strip_prefix('-') {
            Some(name) if allow_desc => name,
            _ => entry,
        };
        FieldName::new(name).map_err(|e| invalid(e.to_string()))?;
        count += 1;
    }
    if count == 0 {
        return Err(invalid("no field names given".to_owned()));
    }
    Ok(())
}

impl QueryDefaults {
    /// Creates a set of defaults that does not touch any key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set of defaults from environment variables whose names start with `prefix`.
    ///
    /// The variables are `<prefix>_DEFAULT_LIMIT`, `<prefix>_DEFAULT_SORT` and
    /// `<prefix>_DEFAULT_FIELDS`.  All of them are optional but, when set, must hold the same
    /// values that the builder methods accept.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let mut defaults = Self::new();
        if let Some(limit) = get_optional_var::<u64>(prefix, "DEFAULT_LIMIT")? {
            defaults = defaults.with_limit(limit).map_err(|e| e.to_string())?;
        }
        if let Some(sort) = get_optional_var::<String>(prefix, "DEFAULT_SORT")? {
            defaults = defaults.with_sort(sort).map_err(|e| e.to_string())?;
        }
        if let Some(fields) = get_optional_var::<String>(prefix, "DEFAULT_FIELDS")? {
            defaults = defaults.with_fields(fields).map_err(|e| e.to_string())?;
        }
        Ok(defaults)
    }

    /// Sets the value of the `limit` key, which must be positive.
    pub fn with_limit(mut self, limit: u64) -> QueryResult<Self> {
        if limit == 0 {
            warn!("Refusing default limit of zero");
            return Err(QueryError::ConfigurationError(
                "Default limit must be a positive integer".to_owned(),
            ));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Sets the value of the `sort` key as a comma-separated list of fields, each optionally
    /// prefixed by `-` to sort in descending order.
    pub fn with_sort<S: Into<String>>(mut self, sort: S) -> QueryResult<Self> {
        let sort = sort.into();
        validate_list(SORT_KEY, &sort, true)?;
        self.sort = Some(sort);
        Ok(self)
    }

    /// Sets the value of the `fields` key as a comma-separated list of fields.
    pub fn with_fields<S: Into<String>>(mut self, fields: S) -> QueryResult<Self> {
        let fields = fields.into();
        validate_list(FIELDS_KEY, &fields, false)?;
        self.fields = Some(fields);
        Ok(self)
    }

    /// Adds the configured keys to `bag` unless the request already set them.
    pub fn apply(&self, bag: &mut ParameterBag) {
        for (key, value) in self.entries() {
            if !bag.contains_key(key) {
                bag.insert(key, value);
            }
        }
    }

    /// Sets the configured keys in `bag`, replacing any values given by the request.
    pub fn apply_overrides(&self, bag: &mut ParameterBag) {
        for (key, value) in self.entries() {
            bag.insert(key, value);
        }
    }

    /// Returns the configured keys and their values.
    fn entries(&self) -> Vec<(&'static str, ParamValue)> {
        let mut entries = vec![];
        if let Some(limit) = self.limit {
            entries.push((LIMIT_KEY, ParamValue::from(limit)));
        }
        if let Some(sort) = self.sort.as_ref() {
            entries.push((SORT_KEY, ParamValue::from(sort.as_str())));
        }
        if let Some(fields) = self.fields.as_ref() {
            entries.push((FIELDS_KEY, ParamValue::from(fields.as_str())));
        }
        entries
    }
}
