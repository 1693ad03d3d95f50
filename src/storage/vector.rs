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

//! Fixed-size column vectors, null masks and selection vectors
//!
//! A [`Vector`] is one horizontal slice of a column: up to
//! [`STANDARD_VECTOR_SIZE`] values of a single physical type plus a null
//! mask. A [`SelectionVector`] is an indirection array mapping logical scan
//! positions to physical vector positions; filters refine it in place
//! without copying values.

use std::sync::Arc;

use crate::core::{Error, PhysicalType, Result, Value};

/// Number of tuples in a full vector
pub const STANDARD_VECTOR_SIZE: usize = 1024;

/// Words in a null mask covering one vector
const NULLMASK_WORDS: usize = STANDARD_VECTOR_SIZE / 64;

/// Bytes occupied by one serialized null mask
pub const NULLMASK_BYTES: usize = NULLMASK_WORDS * 8;

/// Null mask for one vector: bit set means NULL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMask {
    words: [u64; NULLMASK_WORDS],
}

impl NullMask {
    /// Create an all-valid mask
    pub fn new() -> Self {
        Self {
            words: [0; NULLMASK_WORDS],
        }
    }

    /// Returns true if any bit is set
    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }

    /// Returns true if position `idx` is NULL
    #[inline]
    pub fn is_null(&self, idx: usize) -> bool {
        debug_assert!(idx < STANDARD_VECTOR_SIZE);
        self.words[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    /// Set or clear the NULL bit at position `idx`
    #[inline]
    pub fn set_null(&mut self, idx: usize, null: bool) {
        debug_assert!(idx < STANDARD_VECTOR_SIZE);
        let bit = 1u64 << (idx % 64);
        if null {
            self.words[idx / 64] |= bit;
        } else {
            self.words[idx / 64] &= !bit;
        }
    }

    /// Number of NULL positions
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Deserialize a mask from its little-endian block representation
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= NULLMASK_BYTES);
        let mut words = [0u64; NULLMASK_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            *word = u64::from_le_bytes(buf);
        }
        Self { words }
    }

    /// Serialize the mask into its little-endian block representation
    pub fn write_to(&self, bytes: &mut [u8]) {
        debug_assert!(bytes.len() >= NULLMASK_BYTES);
        for (i, word) in self.words.iter().enumerate() {
            bytes[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
    }
}

impl Default for NullMask {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed value storage for one vector
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Varchar(Vec<Arc<str>>),
}

impl VectorData {
    fn new(physical_type: PhysicalType, len: usize) -> Self {
        match physical_type {
            PhysicalType::Int8 => VectorData::Int8(vec![0; len]),
            PhysicalType::Int16 => VectorData::Int16(vec![0; len]),
            PhysicalType::Int32 => VectorData::Int32(vec![0; len]),
            PhysicalType::Int64 => VectorData::Int64(vec![0; len]),
            PhysicalType::Float32 => VectorData::Float32(vec![0.0; len]),
            PhysicalType::Float64 => VectorData::Float64(vec![0.0; len]),
            PhysicalType::Varchar => VectorData::Varchar(vec![Arc::from(""); len]),
        }
    }

    fn with_capacity(physical_type: PhysicalType, capacity: usize) -> Self {
        match physical_type {
            PhysicalType::Int8 => VectorData::Int8(Vec::with_capacity(capacity)),
            PhysicalType::Int16 => VectorData::Int16(Vec::with_capacity(capacity)),
            PhysicalType::Int32 => VectorData::Int32(Vec::with_capacity(capacity)),
            PhysicalType::Int64 => VectorData::Int64(Vec::with_capacity(capacity)),
            PhysicalType::Float32 => VectorData::Float32(Vec::with_capacity(capacity)),
            PhysicalType::Float64 => VectorData::Float64(Vec::with_capacity(capacity)),
            PhysicalType::Varchar => VectorData::Varchar(Vec::with_capacity(capacity)),
        }
    }

    fn len(&self) -> usize {
        match self {
            VectorData::Int8(v) => v.len(),
            VectorData::Int16(v) => v.len(),
            VectorData::Int32(v) => v.len(),
            VectorData::Int64(v) => v.len(),
            VectorData::Float32(v) => v.len(),
            VectorData::Float64(v) => v.len(),
            VectorData::Varchar(v) => v.len(),
        }
    }

    fn physical_type(&self) -> PhysicalType {
        match self {
            VectorData::Int8(_) => PhysicalType::Int8,
            VectorData::Int16(_) => PhysicalType::Int16,
            VectorData::Int32(_) => PhysicalType::Int32,
            VectorData::Int64(_) => PhysicalType::Int64,
            VectorData::Float32(_) => PhysicalType::Float32,
            VectorData::Float64(_) => PhysicalType::Float64,
            VectorData::Varchar(_) => PhysicalType::Varchar,
        }
    }
}

/// A typed column vector with a null mask
#[derive(Debug, Clone)]
pub struct Vector {
    data: VectorData,
    nulls: NullMask,
}

impl Vector {
    /// Create a zero-filled, all-valid vector of `len` values
    pub fn new(physical_type: PhysicalType, len: usize) -> Self {
        debug_assert!(len <= STANDARD_VECTOR_SIZE);
        Self {
            data: VectorData::new(physical_type, len),
            nulls: NullMask::new(),
        }
    }

    /// Create an empty vector with room for `capacity` values
    pub fn with_capacity(physical_type: PhysicalType, capacity: usize) -> Self {
        Self {
            data: VectorData::with_capacity(physical_type, capacity),
            nulls: NullMask::new(),
        }
    }

    /// Build a vector from scalar values (test and loader convenience)
    pub fn from_values(physical_type: PhysicalType, values: &[Value]) -> Result<Self> {
        let mut vector = Vector::with_capacity(physical_type, values.len());
        for value in values {
            vector.push(value)?;
        }
        Ok(vector)
    }

    /// The vector's physical type
    pub fn physical_type(&self) -> PhysicalType {
        self.data.physical_type()
    }

    /// Number of values in the vector
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the vector holds no values
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Typed value storage
    pub fn data(&self) -> &VectorData {
        &self.data
    }

    /// The vector's null mask
    pub fn nulls(&self) -> &NullMask {
        &self.nulls
    }

    /// Returns true if position `idx` is NULL
    #[inline]
    pub fn is_null(&self, idx: usize) -> bool {
        self.nulls.is_null(idx)
    }

    /// Set or clear the NULL bit at position `idx`
    pub fn set_null(&mut self, idx: usize, null: bool) {
        debug_assert!(idx < self.len());
        self.nulls.set_null(idx, null);
    }

    /// Read the value at position `idx` (the null bit is tracked separately)
    pub fn value(&self, idx: usize) -> Value {
        match &self.data {
            VectorData::Int8(v) => Value::TinyInt(v[idx]),
            VectorData::Int16(v) => Value::SmallInt(v[idx]),
            VectorData::Int32(v) => Value::Integer(v[idx]),
            VectorData::Int64(v) => Value::BigInt(v[idx]),
            VectorData::Float32(v) => Value::Float(v[idx]),
            VectorData::Float64(v) => Value::Double(v[idx]),
            VectorData::Varchar(v) => Value::Varchar(Arc::clone(&v[idx])),
        }
    }

    /// Overwrite the value at position `idx`, clearing its NULL bit
    pub fn set_value(&mut self, idx: usize, value: &Value) -> Result<()> {
        match (&mut self.data, value) {
            (VectorData::Int8(v), Value::TinyInt(x)) => v[idx] = *x,
            (VectorData::Int16(v), Value::SmallInt(x)) => v[idx] = *x,
            (VectorData::Int32(v), Value::Integer(x)) => v[idx] = *x,
            (VectorData::Int64(v), Value::BigInt(x)) => v[idx] = *x,
            (VectorData::Float32(v), Value::Float(x)) => v[idx] = *x,
            (VectorData::Float64(v), Value::Double(x)) => v[idx] = *x,
            (VectorData::Varchar(v), Value::Varchar(x)) => v[idx] = Arc::clone(x),
            (data, value) => {
                return Err(Error::InvalidFilterType {
                    vector: data.physical_type(),
                    constant: value.physical_type(),
                })
            }
        }
        self.nulls.set_null(idx, false);
        Ok(())
    }

    /// Append a non-NULL value
    pub fn push(&mut self, value: &Value) -> Result<()> {
        match (&mut self.data, value) {
            (VectorData::Int8(v), Value::TinyInt(x)) => v.push(*x),
            (VectorData::Int16(v), Value::SmallInt(x)) => v.push(*x),
            (VectorData::Int32(v), Value::Integer(x)) => v.push(*x),
            (VectorData::Int64(v), Value::BigInt(x)) => v.push(*x),
            (VectorData::Float32(v), Value::Float(x)) => v.push(*x),
            (VectorData::Float64(v), Value::Double(x)) => v.push(*x),
            (VectorData::Varchar(v), Value::Varchar(x)) => v.push(Arc::clone(x)),
            (data, value) => {
                return Err(Error::InvalidFilterType {
                    vector: data.physical_type(),
                    constant: value.physical_type(),
                })
            }
        }
        Ok(())
    }

    /// Append the value at `src_idx` of `src`, carrying its NULL bit
    pub fn push_from(&mut self, src: &Vector, src_idx: usize) -> Result<()> {
        let dst_idx = self.len();
        self.push(&src.value(src_idx))?;
        self.nulls.set_null(dst_idx, src.is_null(src_idx));
        Ok(())
    }

    /// Copy the value and NULL bit at `src_idx` of `src` into `dst_idx`
    pub fn copy_from(&mut self, dst_idx: usize, src: &Vector, src_idx: usize) -> Result<()> {
        self.set_value(dst_idx, &src.value(src_idx))?;
        self.nulls.set_null(dst_idx, src.is_null(src_idx));
        Ok(())
    }

    /// Deserialize a full vector from its block representation
    ///
    /// `mask` is the little-endian null-mask region, `values` the packed
    /// little-endian value region. Only fixed-width types have a block form.
    pub fn decode(physical_type: PhysicalType, mask: &[u8], values: &[u8]) -> Result<Self> {
        let width = physical_type
            .size()
            .ok_or(Error::UnsupportedSegmentType(physical_type))?;
        debug_assert!(values.len() >= width * STANDARD_VECTOR_SIZE);
        let nulls = NullMask::from_bytes(mask);
        let n = STANDARD_VECTOR_SIZE;
        let data = match physical_type {
            PhysicalType::Int8 => {
                VectorData::Int8(values[..n].iter().map(|b| *b as i8).collect())
            }
            PhysicalType::Int16 => VectorData::Int16(
                values[..n * 2]
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            PhysicalType::Int32 => VectorData::Int32(
                values[..n * 4]
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            PhysicalType::Int64 => VectorData::Int64(
                values[..n * 8]
                    .chunks_exact(8)
                    .map(|c| {
                        i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            ),
            PhysicalType::Float32 => VectorData::Float32(
                values[..n * 4]
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            PhysicalType::Float64 => VectorData::Float64(
                values[..n * 8]
                    .chunks_exact(8)
                    .map(|c| {
                        f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            ),
            PhysicalType::Varchar => return Err(Error::UnsupportedSegmentType(physical_type)),
        };
        Ok(Self { data, nulls })
    }

    /// Serialize a full vector into its block representation
    pub fn encode_into(&self, mask: &mut [u8], values: &mut [u8]) -> Result<()> {
        let physical_type = self.physical_type();
        let width = physical_type
            .size()
            .ok_or(Error::UnsupportedSegmentType(physical_type))?;
        debug_assert!(values.len() >= width * self.len());
        self.nulls.write_to(mask);
        match &self.data {
            VectorData::Int8(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i] = *x as u8;
                }
            }
            VectorData::Int16(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i * 2..i * 2 + 2].copy_from_slice(&x.to_le_bytes());
                }
            }
            VectorData::Int32(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i * 4..i * 4 + 4].copy_from_slice(&x.to_le_bytes());
                }
            }
            VectorData::Int64(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i * 8..i * 8 + 8].copy_from_slice(&x.to_le_bytes());
                }
            }
            VectorData::Float32(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i * 4..i * 4 + 4].copy_from_slice(&x.to_le_bytes());
                }
            }
            VectorData::Float64(v) => {
                for (i, x) in v.iter().enumerate() {
                    values[i * 8..i * 8 + 8].copy_from_slice(&x.to_le_bytes());
                }
            }
            VectorData::Varchar(_) => return Err(Error::UnsupportedSegmentType(physical_type)),
        }
        Ok(())
    }
}

/// Indirection array mapping logical positions to physical vector positions
///
/// Filters shrink the selection; surviving indices keep their relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionVector {
    indices: Vec<u32>,
}

impl SelectionVector {
    /// Identity selection over the first `count` positions
    pub fn identity(count: usize) -> Self {
        debug_assert!(count <= STANDARD_VECTOR_SIZE);
        Self {
            indices: (0..count as u32).collect(),
        }
    }

    /// Empty selection with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Physical index at logical position `pos`
    #[inline]
    pub fn get(&self, pos: usize) -> usize {
        self.indices[pos] as usize
    }

    /// Append a surviving physical index
    #[inline]
    pub fn push(&mut self, idx: usize) {
        self.indices.push(idx as u32);
    }

    /// Number of selected positions
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected physical indices in order
    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_mask_roundtrip() {
        let mut mask = NullMask::new();
        assert!(!mask.any());
        mask.set_null(0, true);
        mask.set_null(63, true);
        mask.set_null(64, true);
        mask.set_null(1023, true);
        assert_eq!(mask.count(), 4);
        assert!(mask.is_null(64));
        mask.set_null(64, false);
        assert!(!mask.is_null(64));
        assert_eq!(mask.count(), 3);

        let mut bytes = [0u8; NULLMASK_BYTES];
        mask.write_to(&mut bytes);
        let restored = NullMask::from_bytes(&bytes);
        assert_eq!(restored, mask);
    }

    #[test]
    fn test_vector_set_and_get() {
        let mut vector = Vector::new(PhysicalType::Int32, 4);
        vector.set_value(2, &Value::Integer(42)).unwrap();
        assert_eq!(vector.value(2), Value::Integer(42));
        assert!(!vector.is_null(2));
        vector.set_null(2, true);
        assert!(vector.is_null(2));
    }

    #[test]
    fn test_vector_type_mismatch() {
        let mut vector = Vector::new(PhysicalType::Int32, 4);
        let err = vector.set_value(0, &Value::BigInt(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterType { .. }));
    }

    #[test]
    fn test_push_from_carries_null_bit() {
        let mut src = Vector::new(PhysicalType::Int64, 2);
        src.set_value(0, &Value::BigInt(7)).unwrap();
        src.set_null(1, true);

        let mut dst = Vector::with_capacity(PhysicalType::Int64, 2);
        dst.push_from(&src, 0).unwrap();
        dst.push_from(&src, 1).unwrap();
        assert_eq!(dst.value(0), Value::BigInt(7));
        assert!(dst.is_null(1));
    }

    #[test]
    fn test_selection_vector_identity() {
        let sel = SelectionVector::identity(8);
        assert_eq!(sel.len(), 8);
        assert_eq!(sel.get(3), 3);
    }
}
