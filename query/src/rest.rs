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

//! Integration of query translation with REST handlers.

use crate::driver::QueryError;
use crate::model::ParameterBag;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tours_core::rest::RestError;

impl From<QueryError> for RestError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::ConfigurationError(_) => RestError::InternalError(e.to_string()),
            QueryError::ValidationError(_) => RestError::InvalidRequest(e.to_string()),
        }
    }
}

/// Extractor for the parameters in the query string of a request.
///
/// Query strings that cannot be parsed into a `ParameterBag` are rejected as invalid requests.
pub struct QueryBag(pub ParameterBag);

#[async_trait]
impl<S> FromRequestParts<S> for QueryBag
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bag = ParameterBag::from_query(parts.uri.query().unwrap_or(""))?;
        Ok(QueryBag(bag))
    }
}
