//! N-dimensional tensor views over shared buffers.
//!
//! This module provides:
//!
//! - [`Tensor`]: a shape, strides and offset over an `Rc`-shared [`Buffer`]
//! - Factories: [`Tensor::full`], [`Tensor::zeros`], [`Tensor::ones`],
//!   [`Tensor::range`], the `*_like` family, ingestion and buffer adoption
//! - View operations: index, slice, reshape, broadcast, cast, copy, reverse
//!
//! Aliasing is explicit. [`Tensor::index`], [`Tensor::slice`],
//! [`Tensor::reshape`], [`Tensor::from_buffer`] and `clone` share the
//! receiver's buffer; [`Tensor::broadcast`], [`Tensor::cast`] and
//! [`Tensor::copy`] allocate a new one. Writes through a shared buffer are
//! visible through every alias.
//!
//! # Example
//!
//! ```rust
//! use stridex::Tensor;
//!
//! let t = Tensor::<i32>::range(0, 6, 1).unwrap().reshape(&[2, 3]).unwrap();
//! let row = t.index(&[1]).unwrap();
//! assert_eq!(row.ravel(), vec![3, 4, 5]);
//!
//! row.set(&[0], 30).unwrap();
//! assert_eq!(t.get(&[1, 0]).unwrap(), 30);
//! ```

use std::rc::Rc;

use crate::buffer::Buffer;
use crate::error::{Result, TensorError};
use crate::ingest::{self, Backing};
use crate::iter::{Cursor, Iter};
use crate::layout::{self, Axis};
use crate::scalars::{Element, Scalar};

// region: Tensor

/// A view over a flat buffer: offset, shape and row-major strides.
///
/// Cloning a tensor is cheap and yields an alias of the same buffer; use
/// [`Tensor::copy`] for an independent one.
#[derive(Clone)]
pub struct Tensor<T: Element> {
    /// Shared element storage.
    buffer: Rc<Buffer<T>>,
    /// Position of this view's first element in `buffer`.
    offset: usize,
    /// Axis extents.
    shape: Vec<usize>,
    /// Per-axis strides in elements.
    strides: Vec<usize>,
}

impl<T: Element> Tensor<T> {
    /// Wraps freshly produced row-major data in an exclusively owned buffer.
    fn from_vec(data: Vec<T>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), layout::numel(&shape));
        Self {
            buffer: Rc::new(Buffer::from(data)),
            offset: 0,
            strides: layout::strides(&shape),
            shape,
        }
    }

    /// A view sharing this tensor's buffer.
    fn alias(&self, offset: usize, shape: Vec<usize>, strides: Vec<usize>) -> Self {
        Self {
            buffer: Rc::clone(&self.buffer),
            offset,
            shape,
            strides,
        }
    }
}

// endregion: Tensor

// region: Factories

impl<T: Element> Tensor<T> {
    /// Builds a tensor from a scalar, a (nested) sequence, or another tensor.
    ///
    /// Elements are converted to `T`. Nesting levels become axes, outermost
    /// first; a bare scalar yields a rank-0 tensor.
    pub fn from_backing<B: Backing + ?Sized>(value: &B) -> Result<Self> {
        let (data, shape) = ingest::ingest::<T, B>(value)?;
        Ok(Self::from_vec(data, shape))
    }

    /// Adopts a caller-owned buffer without copying it.
    ///
    /// The result is rank 1 with one axis spanning the whole buffer. Later
    /// writes through `buffer` are visible through the tensor and vice versa.
    pub fn from_buffer(buffer: &Rc<Buffer<T>>) -> Result<Self> {
        if buffer.is_empty() {
            return Err(TensorError::BadBacking {
                reason: "empty buffer",
            });
        }
        Ok(Self {
            buffer: Rc::clone(buffer),
            offset: 0,
            shape: vec![buffer.len()],
            strides: vec![1],
        })
    }

    /// A tensor of the given shape with every element set to `value`.
    ///
    /// The shape is validated before anything is allocated.
    pub fn full<A: Axis>(value: T, shape: &[A]) -> Result<Self> {
        let shape = layout::verify_shape(shape)?;
        let data = vec![value; layout::numel(&shape)];
        Ok(Self::from_vec(data, shape))
    }

    /// A tensor of the given shape filled with zeros.
    pub fn zeros<A: Axis>(shape: &[A]) -> Result<Self> {
        Self::full(T::ZERO, shape)
    }

    /// A tensor of the given shape filled with ones.
    pub fn ones<A: Axis>(shape: &[A]) -> Result<Self> {
        Self::full(T::ONE, shape)
    }

    /// A tensor shaped like `other` with every element set to `value`.
    pub fn full_like<U: Element>(value: T, other: &Tensor<U>) -> Self {
        let shape = other.shape.clone();
        let data = vec![value; layout::numel(&shape)];
        Self::from_vec(data, shape)
    }

    /// A tensor shaped like `other` filled with zeros.
    pub fn zeros_like<U: Element>(other: &Tensor<U>) -> Self {
        Self::full_like(T::ZERO, other)
    }

    /// A tensor shaped like `other` filled with ones.
    pub fn ones_like<U: Element>(other: &Tensor<U>) -> Self {
        Self::full_like(T::ONE, other)
    }

    /// Rank-1 tensor of `start + k * step` for `k` in `[0, |end - start| / |step|)`.
    ///
    /// The length ignores the sign of `step`. A zero step fails with
    /// [`TensorError::BadStep`]; a range with no elements fails with
    /// [`TensorError::BadShape`].
    pub fn range(start: i64, end: i64, step: i64) -> Result<Self> {
        layout::verify_step(step)?;
        let distance = (i128::from(end) - i128::from(start)).unsigned_abs();
        let len = usize::try_from(distance / u128::from(step.unsigned_abs())).map_err(|_| {
            TensorError::BadShape {
                reason: "range too long",
            }
        })?;
        if len == 0 {
            return Err(TensorError::BadShape {
                reason: "empty range",
            });
        }
        // Every element lies in [start, end), so the i128 sum narrows losslessly.
        let data = (0..len)
            .map(|k| {
                let value = i128::from(start) + k as i128 * i128::from(step);
                T::from_scalar(Scalar::Int(value as i64))
            })
            .collect();
        Ok(Self::from_vec(data, vec![len]))
    }
}

// endregion: Factories

// region: Accessors

impl<T: Element> Tensor<T> {
    /// Axis extents.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis strides, in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Position of the first element within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of axes; 0 for a scalar.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        layout::numel(&self.shape)
    }

    /// Extent of one axis.
    pub fn size(&self, axis: usize) -> Option<usize> {
        self.shape.get(axis).copied()
    }

    /// The underlying storage.
    pub fn buffer(&self) -> &Rc<Buffer<T>> {
        &self.buffer
    }

    /// Whether both views address the same buffer.
    pub fn shares_buffer<U: Element>(&self, other: &Tensor<U>) -> bool {
        core::ptr::eq(
            Rc::as_ptr(&self.buffer) as *const u8,
            Rc::as_ptr(&other.buffer) as *const u8,
        )
    }

    /// Whether the strides are the row-major strides of the shape.
    pub fn is_contiguous(&self) -> bool {
        layout::is_row_major(&self.shape, &self.strides)
    }

    /// Row-major iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    fn cursor(&self) -> Cursor {
        Cursor::new(&self.shape, &self.strides, self.offset)
    }

    /// Copies the elements out in row-major order.
    pub fn ravel(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// The only element of a single-element tensor.
    pub fn scalar(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(TensorError::BadShape {
                reason: "not a single-element tensor",
            });
        }
        Ok(self.buffer.get(self.offset))
    }

    /// Reads one element.
    pub fn get<A: Axis>(&self, indices: &[A]) -> Result<T> {
        self.index(indices)?.scalar()
    }

    /// Writes one element through the shared buffer.
    pub fn set<A: Axis>(&self, indices: &[A], value: T) -> Result<()> {
        let view = self.index(indices)?;
        if view.numel() != 1 {
            return Err(TensorError::BadShape {
                reason: "not a single-element tensor",
            });
        }
        self.buffer.set(view.offset, value);
        Ok(())
    }

    /// Smallest element.
    pub fn min(&self) -> T {
        self.iter()
            .reduce(|a, b| if b < a { b } else { a })
            .unwrap_or(T::ZERO)
    }

    /// Largest element.
    pub fn max(&self) -> T {
        self.iter()
            .reduce(|a, b| if b > a { b } else { a })
            .unwrap_or(T::ZERO)
    }
}

// endregion: Accessors

// region: Views

impl<T: Element> Tensor<T> {
    /// Zero-copy view at the given leading indices.
    ///
    /// With `k` indices the result keeps the trailing `rank - k` axes and
    /// shares this tensor's buffer.
    pub fn index<A: Axis>(&self, indices: &[A]) -> Result<Self> {
        layout::verify_rank(indices.len(), self.rank())?;
        let mut offset = self.offset;
        for (axis, &index) in indices.iter().enumerate() {
            let i = layout::verify_axis(axis, index, self.shape[axis])?;
            offset += i * self.strides[axis];
        }
        let k = indices.len();
        Ok(self.alias(offset, self.shape[k..].to_vec(), self.strides[k..].to_vec()))
    }

    /// Zero-copy view of rows `[start, end)` of the leading axis.
    pub fn slice<A: Axis>(&self, start: A, end: A) -> Result<Self> {
        if self.rank() == 0 {
            return Err(TensorError::BadShape {
                reason: "cannot slice a rank-0 tensor",
            });
        }
        let (start, end) = layout::verify_interval(start, end, self.shape[0])?;
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Ok(self.alias(
            self.offset + start * self.strides[0],
            shape,
            self.strides.clone(),
        ))
    }

    /// View with a new shape over the same elements.
    ///
    /// An empty shape turns a single-element tensor into a scalar. Otherwise
    /// the shape must be valid and address exactly as many elements as this
    /// tensor has.
    pub fn reshape<A: Axis>(&self, shape: &[A]) -> Result<Self> {
        if shape.is_empty() && self.numel() <= 1 {
            return Ok(self.alias(self.offset, Vec::new(), Vec::new()));
        }
        let shape = layout::verify_shape(shape)?;
        if layout::numel(&shape) != self.numel() {
            return Err(TensorError::BadShape {
                reason: "reshape changes the element count",
            });
        }
        let source = if self.is_contiguous() {
            self.clone()
        } else {
            self.copy()
        };
        let strides = layout::strides(&shape);
        Ok(source.alias(source.offset, shape, strides))
    }

    /// Whether this tensor can be broadcast to `shape`.
    pub fn broadcastable(&self, shape: &[usize]) -> bool {
        layout::broadcastable(&self.shape, shape)
    }

    /// Materializes this tensor replicated up to `shape`.
    ///
    /// Shapes are right-aligned; every axis must match or be 1 here. The
    /// result owns a new buffer of `product(shape)` elements, so this costs
    /// O(output) time and memory.
    pub fn broadcast<A: Axis>(&self, shape: &[A]) -> Result<Self> {
        let target = layout::verify_shape(shape)?;
        if !self.broadcastable(&target) {
            return Err(TensorError::not_broadcastable(&self.shape, &target));
        }
        let strides = layout::broadcast_strides(&self.shape, &self.strides, &target);
        let mut cursor = Cursor::new(&target, &strides, self.offset);
        let mut data = Vec::with_capacity(layout::numel(&target));
        while let Some(position) = cursor.next_position() {
            data.push(self.buffer.get(position));
        }
        log::debug!(
            "broadcast materialized {:?} -> {:?} ({} elements)",
            self.shape,
            target,
            data.len()
        );
        Ok(Self::from_vec(data, target))
    }

    /// Converts every element into a new, independently owned buffer.
    pub fn cast<U: Element>(&self) -> Tensor<U> {
        let data = self.iter().map(Element::cast::<U>).collect();
        Tensor::from_vec(data, self.shape.clone())
    }

    /// Deep copy into an independently owned buffer.
    pub fn copy(&self) -> Self {
        Self::from_vec(self.ravel(), self.shape.clone())
    }

    /// Reverses the element order in place.
    ///
    /// Mutates the shared buffer, so every alias observes the change.
    pub fn reverse(&self) -> Self {
        let mut cursor = self.cursor();
        let mut positions = Vec::with_capacity(self.numel());
        while let Some(position) = cursor.next_position() {
            positions.push(position);
        }
        let (mut i, mut j) = (0, positions.len().saturating_sub(1));
        while i < j {
            self.buffer.swap(positions[i], positions[j]);
            i += 1;
            j -= 1;
        }
        self.clone()
    }
}

// endregion: Views

impl<T: Element> core::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("data", &self.ravel())
            .finish()
    }
}

// region: Tests


// endregion: Tests
