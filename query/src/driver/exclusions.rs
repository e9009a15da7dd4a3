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

//! Computation of default projections.

use crate::driver::{QueryError, QueryResult};
use crate::model::{FieldCatalog, Projection};
use tours_core::model::FieldName;

/// Computes the projection that selects every field in `catalog` except for `exclusions`.
///
/// The selected fields keep catalog order.  Naming a field that is not in the catalog indicates a
/// misconfigured caller.  So does ending up with no fields at all, because an empty projection
/// cannot be distinguished from a request that wants nothing back.
pub fn exclude(catalog: &FieldCatalog, exclusions: &[&str]) -> QueryResult<Projection> {
    if catalog.is_empty() {
        return Err(QueryError::ConfigurationError(
            "Cannot compute a projection for an empty catalog".to_owned(),
        ));
    }

    for exclusion in exclusions {
        if !catalog.contains(exclusion) {
            return Err(QueryError::ConfigurationError(format!(
                "Cannot exclude unknown field '{}'",
                exclusion
            )));
        }
    }

    let fields = catalog
        .iter()
        .filter(|f| !exclusions.contains(&f.as_str()))
        .cloned()
        .collect::<Vec<FieldName>>();
    if fields.is_empty() {
        return Err(QueryError::ConfigurationError(
            "Cannot exclude every field of the catalog".to_owned(),
        ));
    }
    Ok(Projection::new(fields))
}
