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

//! Core type definitions for Strata
//!
//! This module defines the fundamental types: PhysicalType and CompareOp.
//! The physical type set is closed; the filter kernel and the segment block
//! layout are both monomorphized over it, so any new type must be added here
//! and nowhere else.

use std::fmt;

/// Physical storage types supported by the columnar engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PhysicalType {
    /// 8-bit signed integer
    Int8 = 0,

    /// 16-bit signed integer
    Int16 = 1,

    /// 32-bit signed integer
    Int32 = 2,

    /// 64-bit signed integer
    Int64 = 3,

    /// 32-bit floating point number
    Float32 = 4,

    /// 64-bit floating point number
    Float64 = 5,

    /// Length-prefixed UTF-8 string
    Varchar = 6,
}

impl PhysicalType {
    /// Returns the fixed width of a single value in bytes, or `None` for
    /// variable-length types.
    pub fn size(&self) -> Option<usize> {
        match self {
            PhysicalType::Int8 => Some(1),
            PhysicalType::Int16 => Some(2),
            PhysicalType::Int32 => Some(4),
            PhysicalType::Int64 => Some(8),
            PhysicalType::Float32 => Some(4),
            PhysicalType::Float64 => Some(8),
            PhysicalType::Varchar => None,
        }
    }

    /// Returns true if values of this type have a fixed width
    pub fn is_fixed_width(&self) -> bool {
        self.size().is_some()
    }

    /// Returns true if this type is numeric
    pub fn is_numeric(&self) -> bool {
        !matches!(self, PhysicalType::Varchar)
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicalType::Int8 => "INT8",
            PhysicalType::Int16 => "INT16",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Float32 => "FLOAT32",
            PhysicalType::Float64 => "FLOAT64",
            PhysicalType::Varchar => "VARCHAR",
        };
        write!(f, "{}", name)
    }
}

/// Comparison operators for predicate filters
///
/// Only the ordering comparisons are executable by the vectorized filter
/// kernel; `NotEquals` is representable but rejected with a not-implemented
/// error when pushed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (=)
    Equals,
    /// Not equal (!=)
    NotEquals,
    /// Less than (<)
    LessThan,
    /// Greater than (>)
    GreaterThan,
    /// Less than or equal (<=)
    LessThanOrEquals,
    /// Greater than or equal (>=)
    GreaterThanOrEquals,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "!=",
            CompareOp::LessThan => "<",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThanOrEquals => "<=",
            CompareOp::GreaterThanOrEquals => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_type_sizes() {
        assert_eq!(PhysicalType::Int8.size(), Some(1));
        assert_eq!(PhysicalType::Int16.size(), Some(2));
        assert_eq!(PhysicalType::Int32.size(), Some(4));
        assert_eq!(PhysicalType::Int64.size(), Some(8));
        assert_eq!(PhysicalType::Float32.size(), Some(4));
        assert_eq!(PhysicalType::Float64.size(), Some(8));
        assert_eq!(PhysicalType::Varchar.size(), None);
    }

    #[test]
    fn test_fixed_width() {
        assert!(PhysicalType::Int32.is_fixed_width());
        assert!(!PhysicalType::Varchar.is_fixed_width());
    }

    #[test]
    fn test_display() {
        assert_eq!(PhysicalType::Int64.to_string(), "INT64");
        assert_eq!(CompareOp::LessThanOrEquals.to_string(), "<=");
    }
}
