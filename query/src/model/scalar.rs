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

//! The `Scalar` data type.

use regex::Regex;
use serde::Serialize;
use serde_json::Number;
use std::fmt;
use std::sync::LazyLock;

/// Strings that look like decimal numbers.  Leading zeros are not allowed so that values such as
/// `007` keep their textual meaning.
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?$").expect("Hardcoded regex must be valid")
});

/// A single value in a query: either what the user typed or what it has been coerced into.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// The `null` literal.
    Null,

    /// A boolean literal.
    Bool(bool),

    /// An integer or floating point number.
    Number(Number),

    /// Free-form text.
    String(String),
}

impl Scalar {
    /// Coerces textual values into the type they represent.
    ///
    /// Query strings carry no native types, so strings that parse as decimal numbers become
    /// numbers and the `true`, `false` and `null` literals become booleans and nulls.  Everything
    /// else, including values that are not strings to begin with, is returned unmodified.
    pub fn coerce(self) -> Scalar {
        match self {
            Scalar::String(s) => match coerce_str(&s) {
                Some(coerced) => coerced,
                None => Scalar::String(s),
            },
            other => other,
        }
    }

    /// Returns the text of this scalar if it holds a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Number(Number::from(i))
    }
}

impl From<u64> for Scalar {
    fn from(u: u64) -> Self {
        Scalar::Number(Number::from(u))
    }
}

/// Parses `s` as a decimal number, returning `None` if it does not look like one.
///
/// Integers that fit in an `i64` are kept as integers.  Everything else becomes a float.
pub(crate) fn parse_decimal(s: &str) -> Option<Number> {
    if !DECIMAL_RE.is_match(s) {
        return None;
    }
    if !s.contains('.') {
        if let Ok(i) = s.parse::<i64>() {
            return Some(Number::from(i));
        }
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Coerces the string `s` into a non-string scalar, if it represents one.
fn coerce_str(s: &str) -> Option<Scalar> {
    match s {
        "true" => Some(Scalar::Bool(true)),
        "false" => Some(Scalar::Bool(false)),
        "null" => Some(Scalar::Null),
        s => parse_decimal(s).map(Scalar::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integers() {
        assert_eq!(Scalar::from(100i64), Scalar::from("100").coerce());
        assert_eq!(Scalar::from(0i64), Scalar::from("0").coerce());
        assert_eq!(Scalar::from(-42i64), Scalar::from("-42").coerce());
    }

    #[test]
    fn test_coerce_floats() {
        assert_eq!(Scalar::Number(Number::from_f64(4.5).unwrap()), Scalar::from("4.5").coerce());
        assert_eq!(
            Scalar::Number(Number::from_f64(-0.25).unwrap()),
            Scalar::from("-0.25").coerce()
        );
    }

    #[test]
    fn test_coerce_big_integers_become_floats() {
        let coerced = Scalar::from("99999999999999999999").coerce();
        match coerced {
            Scalar::Number(n) => {
                assert!(n.as_i64().is_none());
                assert_eq!(Some(1e20), n.as_f64());
            }
            other => panic!("Expected a number but got {:?}", other),
        }
    }

    #[test]
    fn test_coerce_keywords() {
        assert_eq!(Scalar::Bool(true), Scalar::from("true").coerce());
        assert_eq!(Scalar::Bool(false), Scalar::from("false").coerce());
        assert_eq!(Scalar::Null, Scalar::from("null").coerce());
    }

    #[test]
    fn test_coerce_keeps_strings() {
        for s in [
            "", "easy", "007", "1,000", "1.", ".5", "1e5", "0x10", " 1", "1 ", "+1", "True", "NULL",
            "undefined", "--1",
        ] {
            assert_eq!(Scalar::from(s), Scalar::from(s).coerce(), "Coerced {:?}", s);
        }
    }

    #[test]
    fn test_coerce_non_strings_unmodified() {
        assert_eq!(Scalar::Null, Scalar::Null.coerce());
        assert_eq!(Scalar::Bool(false), Scalar::Bool(false).coerce());
        assert_eq!(Scalar::from(5i64), Scalar::from(5i64).coerce());
    }

    #[test]
    fn test_display() {
        assert_eq!("null", Scalar::Null.to_string());
        assert_eq!("true", Scalar::Bool(true).to_string());
        assert_eq!("12", Scalar::from(12i64).to_string());
        assert_eq!("some text", Scalar::from("some text").to_string());
    }

    #[test]
    fn test_serialize() {
        assert_eq!(
            serde_json::json!([null, true, 3, "3"]),
            serde_json::to_value([
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::from(3i64),
                Scalar::from("3")
            ])
            .unwrap()
        );
    }
}
