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

//! Adapters to run query descriptors against a database.
//!
//! Descriptors are data-store agnostic.  The adapters in this module render them in the dialect of
//! a specific database and return matching records as JSON objects keyed by field name, which is
//! what list APIs hand back to their clients.

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// A single record returned by a query, keyed by field name.
pub type Record = serde_json::Map<String, serde_json::Value>;
