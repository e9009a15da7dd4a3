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

//! Common utilities to interact with an SQLite database.

use crate::db::{DbError, DbResult};
use crate::env::{get_optional_var, get_required_var};
use log::debug;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Options to establish a connection to an SQLite database.
#[derive(Debug, Default, PartialEq)]
pub struct SqliteOptions {
    /// Connection string of the database, such as `sqlite://tours.db` or `:memory:`.
    pub uri: String,

    /// Maximum number of connections in the pool, or the driver's default if not set.
    pub max_connections: Option<u32>,
}

impl SqliteOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_URI` and `<prefix>_MAX_CONNECTIONS`.
    pub fn from_env(prefix: &str) -> Result<SqliteOptions, String> {
        Ok(SqliteOptions {
            uri: get_required_var::<String>(prefix, "URI")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
        })
    }
}

/// Opens a connection pool to the database described by `opts`.
pub async fn connect(opts: SqliteOptions) -> DbResult<SqlitePool> {
    debug!("Connecting to SQLite database {}", opts.uri);
    let mut pool_options = SqlitePoolOptions::new();
    if let Some(max_connections) = opts.max_connections {
        pool_options = pool_options.max_connections(max_connections);
    }
    pool_options.connect(&opts.uri).await.map_err(map_sqlx_error)
}

/// Helper function to initialize the database with a schema.
///
/// The `schema` can contain multiple semicolon-separated statements.
pub async fn run_schema(pool: &SqlitePool, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(pool).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Initializes the test database.
    ///
    /// The pool is limited to a single connection because every connection to `:memory:` gets
    /// its own private database.
    pub async fn setup() -> SqlitePool {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        let opts = SqliteOptions { uri: ":memory:".to_owned(), max_connections: Some(1) };
        connect(opts).await.unwrap()
    }
}
