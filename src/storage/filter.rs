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

//! Vectorized predicate filter kernel
//!
//! [`filter_selection`] refines a selection vector in place to the indices
//! where `vector[i] <op> constant` holds and `nullmask[i]` is clear. The
//! kernel is monomorphized over the closed physical-type set, with a
//! null-free and a null-aware loop per operator; surviving indices keep
//! their order, so repeated runs over identical inputs are identical.

use std::sync::Arc;

use crate::core::{CompareOp, Error, Result, Value};
use crate::storage::vector::{NullMask, SelectionVector, Vector, VectorData};

/// A pushed-down comparison against a constant
#[derive(Debug, Clone)]
pub struct TableFilter {
    pub comparison: CompareOp,
    pub constant: Value,
}

impl TableFilter {
    pub fn new(comparison: CompareOp, constant: Value) -> Self {
        Self {
            comparison,
            constant,
        }
    }
}

/// Refine `sel` to the positions satisfying `filter`, excluding nulls
///
/// `approved_tuple_count` bounds the logical positions considered and is
/// updated to the surviving count.
pub fn filter_selection(
    sel: &mut SelectionVector,
    result: &Vector,
    filter: &TableFilter,
    approved_tuple_count: &mut usize,
    nullmask: &NullMask,
) -> Result<()> {
    let count = *approved_tuple_count;
    let op = filter.comparison;
    let new_sel = match (result.data(), &filter.constant) {
        (VectorData::Int8(values), Value::TinyInt(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Int16(values), Value::SmallInt(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Int32(values), Value::Integer(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Int64(values), Value::BigInt(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Float32(values), Value::Float(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Float64(values), Value::Double(constant)) => {
            filter_typed(values, constant, sel, count, op, nullmask)?
        }
        (VectorData::Varchar(values), Value::Varchar(constant)) => {
            filter_typed::<Arc<str>>(values, constant, sel, count, op, nullmask)?
        }
        _ => {
            return Err(Error::InvalidFilterType {
                vector: result.physical_type(),
                constant: filter.constant.physical_type(),
            })
        }
    };
    *approved_tuple_count = new_sel.len();
    *sel = new_sel;
    Ok(())
}

/// Resolve a comparison operator to a monomorphic predicate
fn comparator<T: PartialOrd>(op: CompareOp) -> Result<fn(&T, &T) -> bool> {
    Ok(match op {
        CompareOp::Equals => |a, b| a == b,
        CompareOp::LessThan => |a, b| a < b,
        CompareOp::GreaterThan => |a, b| a > b,
        CompareOp::LessThanOrEquals => |a, b| a <= b,
        CompareOp::GreaterThanOrEquals => |a, b| a >= b,
        CompareOp::NotEquals => {
            return Err(Error::not_implemented(
                "comparison kind != cannot be pushed into a scan",
            ))
        }
    })
}

fn filter_typed<T: PartialOrd>(
    values: &[T],
    constant: &T,
    sel: &SelectionVector,
    approved_tuple_count: usize,
    op: CompareOp,
    nullmask: &NullMask,
) -> Result<SelectionVector> {
    let cmp = comparator::<T>(op)?;
    let mut new_sel = SelectionVector::with_capacity(approved_tuple_count);
    if !nullmask.any() {
        for i in 0..approved_tuple_count {
            let idx = sel.get(i);
            if cmp(&values[idx], constant) {
                new_sel.push(idx);
            }
        }
    } else {
        for i in 0..approved_tuple_count {
            let idx = sel.get(i);
            if !nullmask.is_null(idx) && cmp(&values[idx], constant) {
                new_sel.push(idx);
            }
        }
    }
    Ok(new_sel)
}
