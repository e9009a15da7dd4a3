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

//! Execution of query descriptors against SQLite.

use crate::db::Record;
use crate::model::{
    Bound, FilterValue, QueryDescriptor, RangeOp, RangeValue, Scalar, SortDirection,
};
use log::debug;
use serde_json::{Number, Value};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, QueryBuilder, Row, Sqlite, TypeInfo, ValueRef};
use tours_core::db::sqlite::map_sqlx_error;
use tours_core::db::{DbError, DbResult};
use tours_core::model::FieldName;

/// Appends `name` to `query` as a quoted identifier.
///
/// Backticks are used instead of double quotes because SQLite reinterprets a double-quoted name
/// that matches no column as a string literal.  `FieldName`s cannot contain backticks so they need
/// no escaping.
fn push_ident(query: &mut QueryBuilder<'static, Sqlite>, name: &FieldName) {
    query.push('`').push(name.as_str()).push('`');
}

/// Appends the keyword that joins the next condition of the `WHERE` clause.
fn push_conjunction(query: &mut QueryBuilder<'static, Sqlite>, first: &mut bool) {
    if *first {
        query.push(" WHERE ");
        *first = false;
    } else {
        query.push(" AND ");
    }
}

/// Binds a number, keeping integers as integers so that comparisons against `INTEGER` columns
/// stay exact.
fn push_number(query: &mut QueryBuilder<'static, Sqlite>, n: &Number) {
    match n.as_i64() {
        Some(i) => query.push_bind(i),
        None => query.push_bind(n.as_f64()),
    };
}

/// Binds the value of an equality condition.  `Null` is handled by the caller.
fn push_scalar(query: &mut QueryBuilder<'static, Sqlite>, scalar: &Scalar) {
    match scalar {
        Scalar::Null => {
            query.push("NULL");
        }
        Scalar::Bool(b) => {
            query.push_bind(*b);
        }
        Scalar::Number(n) => push_number(query, n),
        Scalar::String(s) => {
            query.push_bind(s.clone());
        }
    }
}

/// Appends the condition that compares `field` against a range bound.
///
/// Dates and date-times are compared as Julian day numbers so that plain dates, UTC timestamps
/// and timestamps with an offset all sort on the same timeline.
fn push_bound(query: &mut QueryBuilder<'static, Sqlite>, field: &FieldName, bound: &Bound) {
    let op = comparison(*bound.op());
    match bound.value() {
        RangeValue::Number(n) => {
            push_ident(query, field);
            query.push(' ').push(op).push(' ');
            push_number(query, n);
        }
        value @ (RangeValue::Date(_) | RangeValue::DateTime(_)) => {
            query.push("julianday(");
            push_ident(query, field);
            query.push(") ").push(op).push(" julianday(").push_bind(value.to_string()).push(')');
        }
    }
}

/// Returns the SQL operator for a range bound.
fn comparison(op: RangeOp) -> &'static str {
    match op {
        RangeOp::Gt => ">",
        RangeOp::Gte => ">=",
        RangeOp::Lt => "<",
        RangeOp::Lte => "<=",
    }
}

/// Converts a pagination value to the integer type that SQLite understands.
///
/// Values beyond the range of SQLite integers are clamped, which does not change the results.
fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Renders the `SELECT` statement that retrieves the records of `table` that match `descriptor`.
///
/// All values are bound as parameters.
pub fn select_query(
    table: &FieldName,
    descriptor: &QueryDescriptor,
) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT ");
    match descriptor.projection() {
        None => {
            query.push('*');
        }
        Some(projection) => {
            for (i, field) in projection.fields().iter().enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                push_ident(&mut query, field);
            }
        }
    }
    query.push(" FROM ");
    push_ident(&mut query, table);

    let mut first = true;
    for (field, value) in descriptor.filter().iter() {
        match value {
            FilterValue::Equals(Scalar::Null) => {
                push_conjunction(&mut query, &mut first);
                push_ident(&mut query, field);
                query.push(" IS NULL");
            }
            FilterValue::Equals(scalar) => {
                push_conjunction(&mut query, &mut first);
                push_ident(&mut query, field);
                query.push(" = ");
                push_scalar(&mut query, scalar);
            }
            FilterValue::Range(range) => {
                for bound in range.bounds() {
                    push_conjunction(&mut query, &mut first);
                    push_bound(&mut query, field, bound);
                }
            }
        }
    }

    for (i, key) in descriptor.order_by().iter().enumerate() {
        query.push(if i == 0 { " ORDER BY " } else { ", " });
        push_ident(&mut query, key.field());
        query.push(match key.direction() {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        });
    }

    if let Some(limit) = descriptor.limit() {
        query.push(" LIMIT ").push_bind(clamp_to_i64(*limit));
        if let Some(offset) = descriptor.offset() {
            query.push(" OFFSET ").push_bind(clamp_to_i64(*offset));
        }
    }

    query
}

/// Converts a result `row` into a record keyed by column name.
fn row_to_record(row: &SqliteRow) -> DbResult<Record> {
    let mut record = Record::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i).map_err(map_sqlx_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_owned();
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(i).map_err(map_sqlx_error)?),
                "REAL" => {
                    let f = row.try_get::<f64, _>(i).map_err(map_sqlx_error)?;
                    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
                }
                "TEXT" => Value::from(row.try_get::<String, _>(i).map_err(map_sqlx_error)?),
                other => {
                    return Err(DbError::DataIntegrityError(format!(
                        "Column {} has unsupported type {}",
                        column.name(),
                        other
                    )));
                }
            }
        };
        record.insert(column.name().to_owned(), value);
    }
    Ok(record)
}

/// Fetches the records of `table` that match `descriptor`.
pub async fn find(
    pool: &SqlitePool,
    table: &FieldName,
    descriptor: &QueryDescriptor,
) -> DbResult<Vec<Record>> {
    let mut query = select_query(table, descriptor);
    debug!("Running query: {}", query.sql());
    let rows = query.build().fetch_all(pool).await.map_err(map_sqlx_error)?;
    rows.iter().map(row_to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::translate;
    use crate::model::ParameterBag;
    use serde_json::json;
    use tours_core::db::sqlite::run_schema;
    use tours_core::db::sqlite::testutils::setup;

    /// Schema and contents of the test database.
    const SCHEMA: &str = r#"
        CREATE TABLE tour (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            price INTEGER NOT NULL,
            ratingsAverage REAL NOT NULL,
            difficulty TEXT NOT NULL,
            startDate TEXT NOT NULL,
            secretTour INTEGER NOT NULL,
            summary TEXT
        );

        INSERT INTO tour VALUES
            (1, 'The Forest Hiker', 397, 4.7, 'easy', '2021-04-25', 0, 'Breathtaking hike'),
            (2, 'The Sea Explorer', 497, 4.8, 'medium', '2021-06-19', 0, 'Exploring the sea'),
            (3, 'The Snow Adventurer', 997, 4.5, 'difficult', '2022-01-05', 0, 'Snowy peaks'),
            (4, 'The City Wanderer', 1197, 4.8, 'easy', '2021-03-11', 0, 'Living the city'),
            (5, 'The Secret Tour', 297, 4.9, 'easy', '2021-09-01', 1, NULL);
    "#;

    /// Creates a test database with the tours in `SCHEMA`.
    async fn setup_tours() -> SqlitePool {
        let pool = setup().await;
        run_schema(&pool, SCHEMA).await.unwrap();
        pool
    }

    /// Translates the raw query string `raw` into a descriptor.
    fn descriptor(raw: &str) -> QueryDescriptor {
        translate(&ParameterBag::from_query(raw).unwrap(), None, None).unwrap()
    }

    /// Runs the query described by `raw` against the `tour` table.
    async fn find_tours(pool: &SqlitePool, raw: &str) -> Vec<Value> {
        find(pool, &FieldName::from("tour"), &descriptor(raw))
            .await
            .unwrap()
            .into_iter()
            .map(Value::Object)
            .collect()
    }

    #[test]
    fn test_select_query_all() {
        let query = select_query(&FieldName::from("tour"), &descriptor(""));
        assert_eq!("SELECT * FROM `tour`", query.sql());
    }

    #[test]
    fn test_select_query_everything() {
        let query = select_query(
            &FieldName::from("tour"),
            &descriptor(
                "difficulty=easy&price[gte]=50&price[lte]=200&summary=null\
                 &sort=-ratingsAverage,price&page=2&limit=5&fields=name,price",
            ),
        );
        assert_eq!(
            concat!(
                "SELECT `name`, `price` FROM `tour`",
                " WHERE `difficulty` = ? AND `price` >= ? AND `price` <= ?",
                " AND `summary` IS NULL",
                " ORDER BY `ratingsAverage` DESC, `price` ASC",
                " LIMIT ? OFFSET ?",
            ),
            query.sql()
        );
    }

    #[test]
    fn test_select_query_limit_only() {
        let query = select_query(&FieldName::from("tour"), &descriptor("limit=3"));
        assert_eq!("SELECT * FROM `tour` LIMIT ?", query.sql());
    }

    #[tokio::test]
    async fn test_find_all() {
        let pool = setup_tours().await;
        let tours = find_tours(&pool, "").await;
        assert_eq!(5, tours.len());
        assert_eq!(
            json!({
                "id": 1,
                "name": "The Forest Hiker",
                "price": 397,
                "ratingsAverage": 4.7,
                "difficulty": "easy",
                "startDate": "2021-04-25",
                "secretTour": 0,
                "summary": "Breathtaking hike",
            }),
            tours[0]
        );
        assert_eq!(Value::Null, tours[4]["summary"]);
    }

    #[tokio::test]
    async fn test_find_filter_sort_and_project() {
        let pool = setup_tours().await;
        assert_eq!(
            vec![
                json!({"name": "The Secret Tour", "price": 297}),
                json!({"name": "The Forest Hiker", "price": 397}),
            ],
            find_tours(&pool, "price[lt]=1000&difficulty=easy&sort=price&fields=name,price")
                .await
        );
    }

    #[tokio::test]
    async fn test_find_multiple_sort_keys() {
        let pool = setup_tours().await;
        assert_eq!(
            vec![
                json!({"name": "The Secret Tour"}),
                json!({"name": "The Sea Explorer"}),
                json!({"name": "The City Wanderer"}),
            ],
            find_tours(&pool, "sort=-ratingsAverage,price&fields=name&limit=3").await
        );
    }

    #[tokio::test]
    async fn test_find_paginates() {
        let pool = setup_tours().await;
        assert_eq!(
            vec![json!({"id": 3}), json!({"id": 4})],
            find_tours(&pool, "sort=id&fields=id&page=2&limit=2").await
        );
        assert_eq!(
            vec![json!({"id": 5})],
            find_tours(&pool, "sort=id&fields=id&page=3&limit=2").await
        );
        assert!(find_tours(&pool, "sort=id&fields=id&page=4&limit=2").await.is_empty());
    }

    #[tokio::test]
    async fn test_find_huge_page() {
        let pool = setup_tours().await;
        let raw = "sort=id&fields=id&page=10000000000000000000&limit=1";
        assert!(find_tours(&pool, raw).await.is_empty());
    }

    #[tokio::test]
    async fn test_find_null_bool_and_float() {
        let pool = setup_tours().await;
        assert_eq!(vec![json!({"id": 5})], find_tours(&pool, "summary=null&fields=id").await);
        assert_eq!(vec![json!({"id": 5})], find_tours(&pool, "secretTour=true&fields=id").await);
        assert_eq!(
            vec![json!({"id": 2}), json!({"id": 4})],
            find_tours(&pool, "ratingsAverage=4.8&fields=id&sort=id").await
        );
    }

    #[tokio::test]
    async fn test_find_date_range() {
        let pool = setup_tours().await;
        assert_eq!(
            vec![
                json!({"name": "The Forest Hiker"}),
                json!({"name": "The Sea Explorer"}),
                json!({"name": "The Secret Tour"}),
            ],
            find_tours(
                &pool,
                "startDate[gte]=2021-04-01&startDate[lt]=2021-10-01&sort=startDate&fields=name"
            )
            .await
        );
    }

    #[test]
    fn test_select_query_date_range() {
        let query = select_query(
            &FieldName::from("tour"),
            &descriptor("startDate[gte]=2021-04-01&startDate[lt]=2021-10-01T00:00:00Z"),
        );
        assert_eq!(
            concat!(
                "SELECT * FROM `tour`",
                " WHERE julianday(`startDate`) >= julianday(?)",
                " AND julianday(`startDate`) < julianday(?)",
            ),
            query.sql()
        );
    }

    #[tokio::test]
    async fn test_find_date_time_range_against_dates() {
        let pool = setup_tours().await;
        assert_eq!(
            vec![json!({"id": 1}), json!({"id": 2})],
            find_tours(
                &pool,
                "startDate[gte]=2021-04-25T00:00:00Z&startDate[lte]=2021-06-19&sort=id&fields=id"
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_find_date_time_range_with_offsets() {
        let pool = setup_tours().await;
        // 2021-04-24T23:00:00Z, so the tour on 2021-04-25 starts after it.
        assert_eq!(
            vec![json!({"id": 4})],
            find_tours(&pool, "startDate[lt]=2021-04-25T01:00:00%2B02:00&sort=id&fields=id")
                .await
        );
        // 2021-04-25T00:30:00Z, so the tour on 2021-04-25 starts before it.
        assert_eq!(
            vec![json!({"id": 2}), json!({"id": 3}), json!({"id": 5})],
            find_tours(&pool, "startDate[gt]=2021-04-24T23:30:00-01:00&sort=id&fields=id")
                .await
        );
    }

    #[tokio::test]
    async fn test_find_inverted_range_matches_nothing() {
        let pool = setup_tours().await;
        assert!(find_tours(&pool, "price[gt]=1000&price[lt]=100").await.is_empty());
    }

    #[tokio::test]
    async fn test_find_unknown_column() {
        let pool = setup_tours().await;
        for raw in ["color=red", "color=color", "fields=color", "sort=color", "color[gt]=3"] {
            match find(&pool, &FieldName::from("tour"), &descriptor(raw)).await {
                Err(DbError::BackendError(e)) => {
                    assert!(e.contains("no such column: color"), "Unexpected error: {}", e)
                }
                e => panic!("{} must have failed with a BackendError but got: {:?}", raw, e),
            }
        }
    }

    #[tokio::test]
    async fn test_find_unknown_table() {
        let pool = setup_tours().await;
        match find(&pool, &FieldName::from("users"), &descriptor("")).await {
            Err(DbError::BackendError(_)) => (),
            e => panic!("Must have failed with a BackendError but got: {:?}", e),
        }
    }
}
