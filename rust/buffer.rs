//! Flat element storage shared between tensor views.
//!
//! A [`Buffer`] is an arena: it owns the elements and nothing else. Views
//! hold an `Rc<Buffer<T>>` plus their own offset, shape and strides, so
//! several views can address the same storage. Elements sit in `Cell`s, so
//! a write through one view is visible through every alias without any view
//! needing `&mut`.
//!
//! Worker threads never see a `Buffer` or a view. They receive a
//! [`RawWindow`], a pointer plus layout that is only valid while the call
//! that created it is blocked waiting for them.

use core::cell::Cell;
use core::marker::PhantomData;

use crate::iter::Cursor;
use crate::scalars::Element;

/// Contiguous element storage that may be aliased by many views.
pub struct Buffer<T> {
    cells: Box<[Cell<T>]>,
}

impl<T: Element> Buffer<T> {
    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads the element at a flat position.
    ///
    /// # Panics
    /// If `position` is out of bounds.
    #[inline]
    pub fn get(&self, position: usize) -> T {
        self.cells[position].get()
    }

    /// Writes the element at a flat position.
    ///
    /// # Panics
    /// If `position` is out of bounds.
    #[inline]
    pub fn set(&self, position: usize, value: T) {
        self.cells[position].set(value)
    }

    /// Copies the whole buffer out.
    pub fn to_vec(&self) -> Vec<T> {
        self.cells.iter().map(Cell::get).collect()
    }

    #[inline]
    pub(crate) fn swap(&self, a: usize, b: usize) {
        self.cells[a].swap(&self.cells[b])
    }

    /// Base pointer with write provenance over every element.
    pub(crate) fn as_mut_ptr(&self) -> *mut T {
        self.cells.as_ptr() as *mut T
    }
}

impl<T: Element> From<Vec<T>> for Buffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            cells: data.into_iter().map(Cell::new).collect(),
        }
    }
}

impl<T: Element> core::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.cells.iter().map(Cell::get)).finish()
    }
}

/// A view's layout over a buffer, detached from the buffer's ownership.
///
/// Used to hand partitions of a tensor to worker threads.
pub(crate) struct RawWindow<'a, T> {
    base: *mut T,
    len: usize,
    offset: usize,
    shape: Vec<usize>,
    strides: Vec<usize>,
    _marker: PhantomData<&'a Buffer<T>>,
}

// Safety: a window is only created from a buffer borrowed for `'a`, and the
// zip engine gives each worker windows whose written positions are disjoint
// from every other worker's, while the owning thread is blocked in the join.
unsafe impl<T: Send> Send for RawWindow<'_, T> {}

impl<'a, T: Element> RawWindow<'a, T> {
    /// # Panics
    /// If any position the layout addresses falls outside `buffer`.
    pub(crate) fn new(buffer: &'a Buffer<T>, offset: usize, shape: &[usize], strides: &[usize]) -> Self {
        let last = shape
            .iter()
            .zip(strides)
            .try_fold(offset, |end, (&extent, &stride)| {
                extent.checked_sub(1)?.checked_mul(stride)?.checked_add(end)
            });
        assert!(
            matches!(last, Some(last) if last < buffer.len()),
            "window {:?}/{:?}+{} exceeds buffer of {} elements",
            shape,
            strides,
            offset,
            buffer.len()
        );
        Self {
            base: buffer.as_mut_ptr(),
            len: buffer.len(),
            offset,
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            _marker: PhantomData,
        }
    }

    /// Restricts the window to rows `[start, end)` of its leading axis.
    pub(crate) fn rows(&self, start: usize, end: usize) -> Self {
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Self {
            base: self.base,
            len: self.len,
            offset: self.offset + start * self.strides[0],
            shape,
            strides: self.strides.clone(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn cursor(&self) -> Cursor {
        Cursor::new(&self.shape, &self.strides, self.offset)
    }

    /// # Safety
    /// No other thread may write `position` concurrently.
    #[inline]
    pub(crate) unsafe fn read(&self, position: usize) -> T {
        debug_assert!(position < self.len);
        self.base.add(position).read()
    }

    /// # Safety
    /// No other thread may read or write `position` concurrently.
    #[inline]
    pub(crate) unsafe fn write(&self, position: usize, value: T) {
        debug_assert!(position < self.len);
        self.base.add(position).write(value)
    }
}
