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

//! Translation of parameter bags into query descriptors.
//!
//! Translation is pure: it does not perform I/O and its output depends only on its input, so a
//! single `QueryTranslator` can be shared by any number of concurrent request handlers.  Policies
//! that vary per route, such as default page sizes, live in `QueryDefaults` and are applied to the
//! bag before translating it.

use tours_core::model::ModelError;

mod defaults;
pub use defaults::QueryDefaults;
mod exclusions;
pub use exclusions::exclude;
mod translator;
pub use translator::{QueryTranslator, translate};

/// Name of the control key that selects the page to return.
pub const PAGE_KEY: &str = "page";

/// Name of the control key that sets the maximum number of records to return.
pub const LIMIT_KEY: &str = "limit";

/// Name of the control key that lists the sort criteria.
pub const SORT_KEY: &str = "sort";

/// Name of the control key that lists the fields to return.
pub const FIELDS_KEY: &str = "fields";

/// Control keys, which never become filters.
pub const RESERVED_KEYS: [&str; 4] = [PAGE_KEY, LIMIT_KEY, SORT_KEY, FIELDS_KEY];

/// Translation errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Indicates that the translator was misconfigured by its caller.  This is a programming
    /// error, not a problem with the request.
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    /// Indicates that the request parameters are malformed.
    #[error("{0}")]
    ValidationError(String),
}

impl From<ModelError> for QueryError {
    fn from(e: ModelError) -> Self {
        QueryError::ValidationError(e.to_string())
    }
}

/// Result type for this module.
pub type QueryResult<T> = Result<T, QueryError>;
