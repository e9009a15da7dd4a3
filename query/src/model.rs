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

//! High-level data types.
//!
//! The input side is a `ParameterBag`, which is built fresh for every request and carries values
//! as they came from the query string.  The output side is a `QueryDescriptor`, which can only be
//! obtained through the translator in the `driver` layer and is therefore always well-formed.

mod bag;
pub use bag::{ParamValue, ParameterBag};
mod catalog;
pub use catalog::{FieldCatalog, FieldKind};
mod descriptor;
pub use descriptor::{Filter, FilterValue, Projection, QueryDescriptor, SortDirection, SortKey};
mod range;
pub use range::{Bound, Range, RangeOp, RangeValue};
mod scalar;
pub use scalar::Scalar;
