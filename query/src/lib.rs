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

//! Translation of URL query parameters into structured queries.
//!
//! List APIs receive requests such as `GET /tours?price[gte]=50&sort=-price,name&page=2&limit=10`
//! and need to hand a typed description of that query to the data layer.  This crate performs that
//! translation following the usual layers:
//!
//! 1.  `model`: the raw `ParameterBag` that comes from the query string and the `QueryDescriptor`
//!     that results from translating it, plus the types they are made of.
//!
//! 1.  `driver`: the translation itself (`QueryTranslator`), which is pure and synchronous, along
//!     with caller policies such as `QueryDefaults`.
//!
//! 1.  `db`: an adapter that renders a `QueryDescriptor` as SQL and runs it.
//!
//! 1.  `rest`: an extractor that obtains a `ParameterBag` from a request and the mapping of
//!     translation errors to HTTP responses.
//!
//! Pagination is skip-based: the offset is computed as `(page - 1) * limit`.  Page boundaries can
//! shift if rows are inserted or deleted between requests.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod model;
pub mod rest;
