//! Row-major traversal of a view's index space.
//!
//! The traversal visits logical elements: for a freshly laid-out tensor the
//! order equals physical buffer order, while for views with inherited strides
//! it follows those strides.

use crate::layout;
use crate::scalars::Element;
use crate::tensor::Tensor;

/// Index-vector state machine shared by [`Iter`] and the zip workers.
///
/// Yields buffer positions; knows nothing about the buffer itself.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    indices: Vec<usize>,
    yielded: usize,
    exhausted: bool,
}

impl Cursor {
    pub(crate) fn new(shape: &[usize], strides: &[usize], offset: usize) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
            indices: vec![0; shape.len()],
            yielded: 0,
            exhausted: layout::numel(shape) == 0,
        }
    }

    /// Buffer position of the current index vector, then advances it.
    ///
    /// Advancing scans from the last axis backward for the first index below
    /// its extent minus one, increments it and zeroes everything to its
    /// right. When no axis can move the cursor is exhausted.
    pub(crate) fn next_position(&mut self) -> Option<usize> {
        if self.exhausted {
            return None;
        }
        let position = self.position();
        self.yielded += 1;
        self.exhausted = true;
        for i in (0..self.indices.len()).rev() {
            if self.indices[i] + 1 < self.shape[i] {
                self.indices[i] += 1;
                for index in &mut self.indices[i + 1..] {
                    *index = 0;
                }
                self.exhausted = false;
                break;
            }
        }
        Some(position)
    }

    pub(crate) fn position(&self) -> usize {
        self.offset
            + self
                .indices
                .iter()
                .zip(&self.strides)
                .map(|(i, s)| i * s)
                .sum::<usize>()
    }

    pub(crate) fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub(crate) fn remaining(&self) -> usize {
        layout::numel(&self.shape) - self.yielded
    }

    pub(crate) fn reset(&mut self) {
        self.indices.iter_mut().for_each(|i| *i = 0);
        self.yielded = 0;
        self.exhausted = layout::numel(&self.shape) == 0;
    }
}

/// A restartable row-major iterator over the elements of a [`Tensor`].
///
/// # Example
///
/// ```rust
/// use stridex::Tensor;
///
/// let t = Tensor::<i32>::from_backing(&[[1, 2], [3, 4]]).unwrap();
/// let mut it = t.iter();
/// assert_eq!(it.next_indexed(), Some((vec![0, 0], 1)));
/// assert_eq!(it.by_ref().collect::<Vec<_>>(), vec![2, 3, 4]);
/// it.reset();
/// assert_eq!(it.next(), Some(1));
/// ```
pub struct Iter<'a, T: Element> {
    tensor: &'a Tensor<T>,
    cursor: Cursor,
}

impl<'a, T: Element> Iter<'a, T> {
    pub(crate) fn new(tensor: &'a Tensor<T>) -> Self {
        Self {
            tensor,
            cursor: Cursor::new(tensor.shape(), tensor.strides(), tensor.offset()),
        }
    }

    /// Total number of elements the iterator visits per pass.
    pub fn size(&self) -> usize {
        self.tensor.numel()
    }

    /// Index vector of the element the next call will return.
    pub fn indices(&self) -> &[usize] {
        self.cursor.indices()
    }

    /// Whether every element has been returned.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// Returns the next element together with its index vector.
    pub fn next_indexed(&mut self) -> Option<(Vec<usize>, T)> {
        let indices = self.cursor.indices().to_vec();
        self.cursor
            .next_position()
            .map(|position| (indices, self.tensor.buffer().get(position)))
    }

    /// Rewinds to the first element so the sequence can be replayed.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl<T: Element> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.cursor
            .next_position()
            .map(|position| self.tensor.buffer().get(position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.remaining();
        (remaining, Some(remaining))
    }
}

impl<T: Element> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_row_major_indices() {
        let t = Tensor::<i32>::zeros(&[2, 2]).unwrap();
        let mut it = t.iter();
        let mut seen = Vec::new();
        while let Some((indices, _)) = it.next_indexed() {
            seen.push(indices);
        }
        assert_eq!(seen, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert!(it.is_exhausted());
        assert_eq!(it.next(), None);
        assert_eq!(it.next_indexed(), None);
    }

    #[test]
    fn iter_reset_replays() {
        let t = Tensor::<i32>::range(0, 4, 1).unwrap().reshape(&[2, 2]).unwrap();
        let mut it = t.iter();
        let first: Vec<i32> = it.by_ref().collect();
        assert_eq!(first, vec![0, 1, 2, 3]);
        it.reset();
        assert_eq!(it.indices(), &[0, 0]);
        let second: Vec<i32> = it.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn iter_scalar_yields_once() {
        let t = Tensor::<f64>::from_backing(&7.5).unwrap();
        let mut it = t.iter();
        assert_eq!(it.size(), 1);
        assert_eq!(it.len(), 1);
        assert_eq!(it.next(), Some(7.5));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn iter_follows_view_strides() {
        let t = Tensor::<i32>::range(0, 12, 1).unwrap().reshape(&[3, 4]).unwrap();
        let row = t.index(&[1]).unwrap();
        assert_eq!(row.iter().collect::<Vec<_>>(), vec![4, 5, 6, 7]);

        let tail = t.slice(1, 3).unwrap();
        let mut it = tail.iter();
        assert_eq!(it.len(), 8);
        assert_eq!(it.next(), Some(4));
        assert_eq!(it.len(), 7);
        assert_eq!(it.last(), Some(11));
    }

    #[test]
    fn cursor_positions_with_offset() {
        let mut cursor = Cursor::new(&[2, 2], &[4, 1], 1);
        let mut positions = Vec::new();
        while let Some(p) = cursor.next_position() {
            positions.push(p);
        }
        assert_eq!(positions, vec![1, 2, 5, 6]);
        cursor.reset();
        assert_eq!(cursor.next_position(), Some(1));
    }
}
