//! Parallel elementwise dispatch with broadcasting.
//!
//! [`Tensor::zip`] reconciles two operand shapes, splits the leading axis of
//! the result into one contiguous block of rows per worker, and applies a
//! binary function to every aligned pair of elements. Results are written
//! into the left operand's buffer, or into a broadcast copy of it when its
//! shape had to grow.
//!
//! Workers are forked fresh on every call and joined before it returns.
//! Each worker writes only rows it owns, so the writes need no locking.
//!
//! # Example
//!
//! ```rust
//! use stridex::{Config, Tensor};
//!
//! let config = Config::default();
//! let col = Tensor::<i32>::from_backing(&[[0], [10], [20], [30]]).unwrap();
//! let sum = col.add(&[1, 2, 3], &config).unwrap();
//!
//! assert_eq!(sum.shape(), &[4, 3]);
//! assert_eq!(sum.get(&[2, 1]).unwrap(), 22);
//! ```

use crate::buffer::RawWindow;
use crate::error::{Result, TensorError};
use crate::ingest::Backing;
use crate::layout;
use crate::scalars::Element;
use crate::tensor::Tensor;
use crate::Config;

/// Splits `[0, extent)` into `workers` contiguous ranges.
///
/// Range `i` is `[i * extent / workers, (i + 1) * extent / workers)`. The
/// ranges cover every row exactly once, and none is empty while
/// `workers <= extent`.
pub fn partition(extent: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.max(1);
    (0..workers)
        .map(|i| (i * extent / workers, (i + 1) * extent / workers))
        .collect()
}

/// Broadcasts both operands to a common shape.
///
/// Each operand is grown toward the other's shape where it has extent 1,
/// then the shapes must agree. Nothing is written on failure, and an
/// operand whose shape is already right is returned as the same view.
pub fn reconcile<T: Element>(lhs: &Tensor<T>, rhs: &Tensor<T>) -> Result<(Tensor<T>, Tensor<T>)> {
    if lhs.shape() == rhs.shape() {
        return Ok((lhs.clone(), rhs.clone()));
    }
    let lhs = grow(lhs, rhs.shape())?;
    let rhs = grow(rhs, lhs.shape())?;
    if lhs.shape() != rhs.shape() {
        return Err(TensorError::not_broadcastable(rhs.shape(), lhs.shape()));
    }
    log::debug!("reconciled operands to {:?}", lhs.shape());
    Ok((lhs, rhs))
}

fn grow<T: Element>(tensor: &Tensor<T>, other: &[usize]) -> Result<Tensor<T>> {
    let target = layout::midway_broadcast(tensor.shape(), other);
    if target.as_slice() != tensor.shape() && tensor.broadcastable(&target) {
        tensor.broadcast(&target)
    } else {
        Ok(tensor.clone())
    }
}

impl<T: Element> Tensor<T> {
    /// Applies `f` to every aligned pair of elements of `self` and `other`.
    ///
    /// `other` is ingested first, so it may be a scalar, a nested sequence,
    /// a tensor of another element kind, or a failed result, whose error is
    /// returned as is. The returned tensor shares `self`'s buffer unless
    /// `self` had to be broadcast; in both cases its elements hold the
    /// results.
    ///
    /// In interactive mode errors panic instead of being returned.
    pub fn zip<B, F>(&self, other: &B, config: &Config, f: F) -> Result<Tensor<T>>
    where
        B: Backing + ?Sized,
        F: Fn(T, T) -> T + Sync,
    {
        let result = Tensor::<T>::from_backing(other)
            .and_then(|rhs| reconcile(self, &rhs))
            .map(|(lhs, rhs)| {
                execute(&lhs, &rhs, config, &f);
                lhs
            });
        config.escalate(result)
    }

    /// Elementwise `self + other`.
    pub fn add<B: Backing + ?Sized>(&self, other: &B, config: &Config) -> Result<Tensor<T>> {
        self.zip(other, config, |x, y| x + y)
    }

    /// Elementwise `self - other`.
    pub fn sub<B: Backing + ?Sized>(&self, other: &B, config: &Config) -> Result<Tensor<T>> {
        self.zip(other, config, |x, y| x - y)
    }

    /// Elementwise `self * other`.
    pub fn mul<B: Backing + ?Sized>(&self, other: &B, config: &Config) -> Result<Tensor<T>> {
        self.zip(other, config, |x, y| x * y)
    }

    /// Elementwise `self / other`.
    ///
    /// # Panics
    /// On integer division by zero, as the `/` operator does.
    pub fn div<B: Backing + ?Sized>(&self, other: &B, config: &Config) -> Result<Tensor<T>> {
        self.zip(other, config, |x, y| x / y)
    }
}

/// Runs `f` over two operands of identical shape, writing into `lhs`.
///
/// `rhs` must not share a buffer with `lhs`; ingestion always copies, so
/// this holds for every operand reaching here from [`Tensor::zip`].
fn execute<T, F>(lhs: &Tensor<T>, rhs: &Tensor<T>, config: &Config, f: &F)
where
    T: Element,
    F: Fn(T, T) -> T + Sync,
{
    debug_assert_eq!(lhs.shape(), rhs.shape());
    debug_assert!(!lhs.shares_buffer(rhs));

    let left = RawWindow::new(lhs.buffer(), lhs.offset(), lhs.shape(), lhs.strides());
    let right = RawWindow::new(rhs.buffer(), rhs.offset(), rhs.shape(), rhs.strides());

    if lhs.rank() == 0 {
        // Safety: single element, calling thread only.
        unsafe {
            let value = f(left.read(lhs.offset()), right.read(rhs.offset()));
            left.write(lhs.offset(), value);
        }
        return;
    }

    let extent = lhs.shape()[0];
    let workers = config.workers(extent);
    log::debug!("zip over {:?} with {} worker(s)", lhs.shape(), workers);
    if workers == 1 {
        drive(&left, &right, f);
        return;
    }

    let parts: Vec<_> = partition(extent, workers)
        .into_iter()
        .map(|(start, end)| {
            log::trace!("zip partition rows [{}, {})", start, end);
            (left.rows(start, end), right.rows(start, end))
        })
        .collect();

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.scope(|scope| {
            for (left, right) in parts {
                scope.spawn(move |_| drive(&left, &right, f));
            }
        }),
        Err(err) => {
            log::warn!("worker pool unavailable ({}), running zip sequentially", err);
            for (left, right) in &parts {
                drive(left, right, f);
            }
        }
    }
}

/// Walks two windows in lockstep, storing `f(l, r)` at each left position.
fn drive<T, F>(left: &RawWindow<'_, T>, right: &RawWindow<'_, T>, f: &F)
where
    T: Element,
    F: Fn(T, T) -> T,
{
    let mut lc = left.cursor();
    let mut rc = right.cursor();
    while let (Some(lp), Some(rp)) = (lc.next_position(), rc.next_position()) {
        // Safety: `left` covers rows no other worker touches, and `right`
        // lives in a different buffer that nobody writes during the call.
        unsafe {
            let value = f(left.read(lp), right.read(rp));
            left.write(lp, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_partition_covers_rows() {
        assert_eq!(partition(10, 3), vec![(0, 3), (3, 6), (6, 10)]);
        assert_eq!(partition(4, 4), vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(partition(5, 1), vec![(0, 5)]);

        for extent in 1..40 {
            for workers in 1..=extent {
                let parts = partition(extent, workers);
                assert_eq!(parts.len(), workers);
                assert_eq!(parts[0].0, 0);
                assert_eq!(parts[workers - 1].1, extent);
                for pair in parts.windows(2) {
                    assert_eq!(pair[0].1, pair[1].0);
                }
                assert!(parts.iter().all(|(s, e)| s < e));
            }
        }
    }

    #[test]
    fn zip_broadcasts_column_against_row() {
        let lhs = Tensor::<i32>::from_backing(&[[0], [10], [20], [30]]).unwrap();
        let rhs = [1, 2, 3];
        for config in [Config::sequential(), Config::default().with_parallelism(3)] {
            let out = lhs.add(&rhs, &config).unwrap();
            assert_eq!(out.shape(), &[4, 3]);
            for i in 0..4 {
                for j in 0..3 {
                    assert_eq!(
                        out.get(&[i, j]).unwrap(),
                        lhs.get(&[i, 0]).unwrap() + rhs[j]
                    );
                }
            }
            assert!(!out.shares_buffer(&lhs));
        }
        assert_eq!(lhs.ravel(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn zip_incompatible_shapes_leave_operands_alone() {
        let lhs = Tensor::<f32>::from_backing(&[1.0, 2.0, 3.0]).unwrap();
        let rhs = Tensor::<f32>::from_backing(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = lhs.add(&rhs, &Config::default()).unwrap_err();
        assert!(matches!(err, TensorError::NotBroadcastable { .. }));
        assert_eq!(lhs.ravel(), vec![1.0, 2.0, 3.0]);
        assert_eq!(rhs.ravel(), vec![1.0, 2.0, 3.0, 4.0]);

        let wide = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let tall = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        assert!(wide.mul(&tall, &Config::default()).is_err());
    }

    #[test]
    fn zip_writes_into_receiver() {
        let t = Tensor::<i64>::range(0, 8, 1).unwrap().reshape(&[4, 2]).unwrap();
        let out = t.mul(&2, &Config::default().with_parallelism(2)).unwrap();
        assert!(out.shares_buffer(&t));
        assert_eq!(t.ravel(), vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn zip_on_slice_touches_only_the_window() {
        let t = Tensor::<i32>::range(0, 12, 1).unwrap().reshape(&[4, 3]).unwrap();
        let middle = t.slice(1, 3).unwrap();
        middle
            .sub(&[[1, 1, 1], [2, 2, 2]], &Config::default().with_parallelism(2))
            .unwrap();
        assert_eq!(t.ravel(), vec![0, 1, 2, 2, 3, 4, 4, 5, 6, 9, 10, 11]);
    }

    #[test]
    fn zip_deterministic_across_workers() {
        let data: Vec<Vec<f64>> = (0..17)
            .map(|i| (0..5).map(|j| (i * 5 + j) as f64 * 0.25).collect())
            .collect();
        let other: Vec<f64> = (0..5).map(|j| j as f64 + 0.5).collect();
        let mut results = Vec::new();
        for parallelism in [1, 2, 3, 7, 17, 0] {
            let t = Tensor::<f64>::from_backing(&data).unwrap();
            let config = Config::default().with_parallelism(parallelism);
            results.push(t.div(&other, &config).unwrap().ravel());
        }
        for result in &results[1..] {
            assert_eq!(result, &results[0]);
        }
    }

    #[test]
    fn zip_rank_zero() {
        let s = Tensor::<i32>::from_backing(&5).unwrap();
        let out = s.add(&3, &Config::default()).unwrap();
        assert_eq!(out.rank(), 0);
        assert_eq!(s.scalar().unwrap(), 8);

        let grown = s.add(&[1, 2], &Config::default()).unwrap();
        assert_eq!(grown.ravel(), vec![9, 10]);
        assert_eq!(s.scalar().unwrap(), 8);
    }

    #[test]
    fn zip_self_operand_is_copied() {
        let t = Tensor::<i32>::from_backing(&[1, 2, 3, 4]).unwrap();
        t.add(&t, &Config::default().with_parallelism(2)).unwrap();
        assert_eq!(t.ravel(), vec![2, 4, 6, 8]);
    }

    #[test]
    fn zip_mixed_element_kinds() {
        let t = Tensor::<f32>::from_backing(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let ints = Tensor::<u8>::from_backing(&[10, 20]).unwrap();
        let out = t.add(&ints, &Config::default()).unwrap();
        assert_eq!(out.ravel(), vec![11.0, 22.0, 13.0, 24.0]);
    }

    #[test]
    fn zip_sticky_error_operand() {
        let t = Tensor::<i32>::ones(&[2]).unwrap();
        let failed = Tensor::<i32>::range(0, 4, 0);
        assert_eq!(t.add(&failed, &Config::default()).unwrap_err(), TensorError::BadStep);
        assert_eq!(t.ravel(), vec![1, 1]);

        let chained = t.add(&t.add(&[1, 2, 3], &Config::default()), &Config::default());
        assert!(matches!(chained, Err(TensorError::NotBroadcastable { .. })));
    }

    #[test]
    #[should_panic(expected = "not broadcastable")]
    fn zip_interactive_panics() {
        let config = Config::sequential().with_interactive(true);
        let t = Tensor::<i32>::ones(&[3]).unwrap();
        let _ = t.add(&[1, 2], &config);
    }
}
