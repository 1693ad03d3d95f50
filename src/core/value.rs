// Copyright 2026 Strata Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scalar value type for Strata
//!
//! A [`Value`] is a single typed scalar: a filter constant, a statistics
//! bound, or one element pulled out of a vector. Each variant maps 1:1 to a
//! [`PhysicalType`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::types::PhysicalType;

/// A runtime scalar value with type information
///
/// Note: Varchar uses `Arc<str>` for cheap cloning during scans and
/// statistics maintenance.
#[derive(Debug, Clone)]
pub enum Value {
    /// 8-bit signed integer
    TinyInt(i8),

    /// 16-bit signed integer
    SmallInt(i16),

    /// 32-bit signed integer
    Integer(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// UTF-8 string (Arc for cheap cloning)
    Varchar(Arc<str>),
}

impl Value {
    /// Create a Varchar value from anything string-like
    pub fn varchar(s: impl AsRef<str>) -> Self {
        Value::Varchar(Arc::from(s.as_ref()))
    }

    /// Returns the physical type of this value
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Value::TinyInt(_) => PhysicalType::Int8,
            Value::SmallInt(_) => PhysicalType::Int16,
            Value::Integer(_) => PhysicalType::Int32,
            Value::BigInt(_) => PhysicalType::Int64,
            Value::Float(_) => PhysicalType::Float32,
            Value::Double(_) => PhysicalType::Float64,
            Value::Varchar(_) => PhysicalType::Varchar,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::TinyInt(a), Value::TinyInt(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Varchar(a), Value::Varchar(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    /// Values of different physical types are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::TinyInt(a), Value::TinyInt(b)) => a.partial_cmp(b),
            (Value::SmallInt(a), Value::SmallInt(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Varchar(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::varchar(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_type_mapping() {
        assert_eq!(Value::TinyInt(1).physical_type(), PhysicalType::Int8);
        assert_eq!(Value::Integer(1).physical_type(), PhysicalType::Int32);
        assert_eq!(Value::Double(1.0).physical_type(), PhysicalType::Float64);
        assert_eq!(Value::varchar("x").physical_type(), PhysicalType::Varchar);
    }

    #[test]
    fn test_cross_type_comparison_is_unordered() {
        assert_eq!(Value::Integer(1).partial_cmp(&Value::BigInt(1)), None);
        assert_ne!(Value::Integer(1), Value::BigInt(1));
    }

    #[test]
    fn test_same_type_ordering() {
        assert!(Value::Integer(1) < Value::Integer(2));
        assert!(Value::varchar("a") < Value::varchar("b"));
    }
}
