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

//! Range filters such as `price[gte]=50&price[lte]=200`.

use crate::model::Scalar;
use crate::model::scalar::parse_decimal;
use derive_getters::Getters;
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tours_core::model::{ModelError, ModelResult};

/// Format of date-only bounds.
const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// A comparison operator of a range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeOp {
    /// Strictly greater than.
    Gt,

    /// Greater than or equal to.
    Gte,

    /// Strictly less than.
    Lt,

    /// Less than or equal to.
    Lte,
}

impl RangeOp {
    /// Parses the name of an operator as it appears in a query string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(RangeOp::Gt),
            "gte" => Some(RangeOp::Gte),
            "lt" => Some(RangeOp::Lt),
            "lte" => Some(RangeOp::Lte),
            _ => None,
        }
    }

    /// Returns the name of the operator as it appears in a query string.
    pub fn as_str(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }

    /// Returns true if the operator bounds values from below.
    pub fn is_lower(self) -> bool {
        matches!(self, RangeOp::Gt | RangeOp::Gte)
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a range bound.  Only orderable types are accepted.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeValue {
    /// A number.
    Number(Number),

    /// A calendar date given as `YYYY-MM-DD`.
    Date(Date),

    /// A point in time given in RFC 3339 format.
    DateTime(OffsetDateTime),
}

impl RangeValue {
    /// Parses the raw value of a bound.
    pub fn parse(value: &Scalar) -> ModelResult<Self> {
        let invalid = || ModelError(format!("Invalid range bound '{}'", value));

        match value {
            Scalar::Number(n) => Ok(RangeValue::Number(n.clone())),
            Scalar::String(s) => {
                if let Some(n) = parse_decimal(s) {
                    Ok(RangeValue::Number(n))
                } else if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
                    Ok(RangeValue::DateTime(dt))
                } else if let Ok(d) = Date::parse(s, DATE_FORMAT) {
                    Ok(RangeValue::Date(d))
                } else {
                    Err(invalid())
                }
            }
            Scalar::Bool(_) | Scalar::Null => Err(invalid()),
        }
    }

    /// Returns the name of the kind of value, for error reporting.  Values of different kinds
    /// cannot be compared with each other.
    pub fn kind(&self) -> &'static str {
        match self {
            RangeValue::Number(_) => "number",
            RangeValue::Date(_) | RangeValue::DateTime(_) => "date",
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Number(n) => write!(f, "{}", n),
            RangeValue::Date(d) => f.write_str(&d.format(DATE_FORMAT).map_err(|_| fmt::Error)?),
            RangeValue::DateTime(dt) => f.write_str(&dt.format(&Rfc3339).map_err(|_| fmt::Error)?),
        }
    }
}

impl Serialize for RangeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RangeValue::Number(n) => n.serialize(serializer),
            RangeValue::Date(_) | RangeValue::DateTime(_) => serializer.collect_str(self),
        }
    }
}

/// A single bound of a range.
#[derive(Clone, Debug, Getters, PartialEq)]
pub struct Bound {
    /// The comparison to apply.
    op: RangeOp,

    /// The value to compare against.
    value: RangeValue,
}

/// A range filter with at most one bound in each direction.
///
/// Ranges where the lower bound is above the upper bound are valid: they simply match nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    /// The `gt` or `gte` bound.
    lower: Option<Bound>,

    /// The `lt` or `lte` bound.
    upper: Option<Bound>,
}

impl Range {
    /// Builds a range for `field` from the `operators` given in a nested parameter.
    pub fn from_operators(field: &str, operators: &BTreeMap<String, Scalar>) -> ModelResult<Self> {
        if operators.is_empty() {
            return Err(ModelError(format!("Range for field '{}' has no bounds", field)));
        }

        let mut lower: Option<Bound> = None;
        let mut upper: Option<Bound> = None;
        for (name, value) in operators {
            let op = match RangeOp::parse(name) {
                Some(op) => op,
                None => {
                    return Err(ModelError(format!(
                        "Unknown range operator '{}' for field '{}'",
                        name, field
                    )));
                }
            };
            let value = RangeValue::parse(value)
                .map_err(|e| ModelError(format!("{} for field '{}'", e, field)))?;

            let slot = if op.is_lower() { &mut lower } else { &mut upper };
            if let Some(previous) = slot {
                return Err(ModelError(format!(
                    "Field '{}' cannot have both '{}' and '{}' bounds",
                    field, previous.op, op
                )));
            }
            *slot = Some(Bound { op, value });
        }

        if let (Some(lower), Some(upper)) = (&lower, &upper) {
            if lower.value.kind() != upper.value.kind() {
                return Err(ModelError(format!(
                    "Bounds for field '{}' mix a {} and a {}",
                    field,
                    lower.value.kind(),
                    upper.value.kind()
                )));
            }
        }

        Ok(Self { lower, upper })
    }

    /// Returns the lower bound, if any.
    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    /// Returns the upper bound, if any.
    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }

    /// Iterates over the bounds that are present, lower first.
    pub fn bounds(&self) -> impl Iterator<Item = &Bound> {
        self.lower.iter().chain(self.upper.iter())
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.bounds().count()))?;
        for bound in self.bounds() {
            map.serialize_entry(bound.op.as_str(), &bound.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    /// Shorthand to build the operators of a range out of string pairs.
    fn ops(pairs: &[(&str, &str)]) -> BTreeMap<String, Scalar> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), Scalar::from(*v))).collect()
    }

    #[test]
    fn test_rangeop_roundtrip() {
        for op in [RangeOp::Gt, RangeOp::Gte, RangeOp::Lt, RangeOp::Lte] {
            assert_eq!(Some(op), RangeOp::parse(op.as_str()));
        }
        assert_eq!(None, RangeOp::parse("eq"));
        assert_eq!(None, RangeOp::parse("GTE"));
    }

    #[test]
    fn test_rangevalue_parse() {
        assert_eq!(RangeValue::Number(Number::from(50)), RangeValue::parse(&"50".into()).unwrap());
        assert_eq!(
            RangeValue::Number(Number::from_f64(4.5).unwrap()),
            RangeValue::parse(&"4.5".into()).unwrap()
        );
        assert_eq!(
            RangeValue::Number(Number::from(7)),
            RangeValue::parse(&Scalar::from(7i64)).unwrap()
        );
        assert_eq!(
            RangeValue::Date(date!(2021 - 03 - 15)),
            RangeValue::parse(&"2021-03-15".into()).unwrap()
        );
        assert_eq!(
            RangeValue::DateTime(datetime!(2021-03-15 10:30:00 UTC)),
            RangeValue::parse(&"2021-03-15T10:30:00Z".into()).unwrap()
        );
    }

    #[test]
    fn test_rangevalue_parse_errors() {
        for raw in ["cheap", "", "2021-13-01", "2021-03-15 10:30", "true"] {
            assert_eq!(
                ModelError(format!("Invalid range bound '{}'", raw)),
                RangeValue::parse(&raw.into()).unwrap_err()
            );
        }
        assert_eq!(
            ModelError("Invalid range bound 'null'".to_owned()),
            RangeValue::parse(&Scalar::Null).unwrap_err()
        );
    }

    #[test]
    fn test_rangevalue_serialize() {
        assert_eq!(
            serde_json::json!([50, "2021-03-15", "2021-03-15T10:30:00Z"]),
            serde_json::to_value([
                RangeValue::Number(Number::from(50)),
                RangeValue::Date(date!(2021 - 03 - 15)),
                RangeValue::DateTime(datetime!(2021-03-15 10:30:00 UTC)),
            ])
            .unwrap()
        );
    }

    #[test]
    fn test_range_closed() {
        let range = Range::from_operators("price", &ops(&[("gte", "50"), ("lte", "200")])).unwrap();
        assert_eq!(RangeOp::Gte, *range.lower().unwrap().op());
        assert_eq!(RangeOp::Lte, *range.upper().unwrap().op());
        assert_eq!(
            serde_json::json!({"gte": 50, "lte": 200}),
            serde_json::to_value(&range).unwrap()
        );
    }

    #[test]
    fn test_range_half_open() {
        let range = Range::from_operators("startDate", &ops(&[("gt", "2021-01-01")])).unwrap();
        assert!(range.upper().is_none());
        assert_eq!(1, range.bounds().count());
        assert_eq!(serde_json::json!({"gt": "2021-01-01"}), serde_json::to_value(&range).unwrap());
    }

    #[test]
    fn test_range_inverted_is_accepted() {
        let range = Range::from_operators("price", &ops(&[("gt", "500"), ("lt", "100")])).unwrap();
        assert_eq!(2, range.bounds().count());
    }

    #[test]
    fn test_range_unknown_operator() {
        assert_eq!(
            ModelError("Unknown range operator 'foo' for field 'price'".to_owned()),
            Range::from_operators("price", &ops(&[("foo", "1")])).unwrap_err()
        );
    }

    #[test]
    fn test_range_empty() {
        assert_eq!(
            ModelError("Range for field 'price' has no bounds".to_owned()),
            Range::from_operators("price", &BTreeMap::default()).unwrap_err()
        );
    }

    #[test]
    fn test_range_same_direction() {
        assert_eq!(
            ModelError("Field 'price' cannot have both 'gt' and 'gte' bounds".to_owned()),
            Range::from_operators("price", &ops(&[("gte", "1"), ("gt", "2")])).unwrap_err()
        );
        assert_eq!(
            ModelError("Field 'price' cannot have both 'lt' and 'lte' bounds".to_owned()),
            Range::from_operators("price", &ops(&[("lt", "1"), ("lte", "2")])).unwrap_err()
        );
    }

    #[test]
    fn test_range_mixed_kinds() {
        assert_eq!(
            ModelError("Bounds for field 'price' mix a number and a date".to_owned()),
            Range::from_operators("price", &ops(&[("gte", "1"), ("lte", "2021-01-01")]))
                .unwrap_err()
        );
    }

    #[test]
    fn test_range_bad_value() {
        assert_eq!(
            ModelError("Invalid range bound 'abc' for field 'price'".to_owned()),
            Range::from_operators("price", &ops(&[("gte", "abc")])).unwrap_err()
        );
    }
}
