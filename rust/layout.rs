//! Row-major layout arithmetic and argument validation.
//!
//! Everything here is a pure function over shapes, strides and indices; none
//! of it touches a buffer.

use crate::error::{Result, TensorError};

/// Integer types accepted as axis extents, indices and interval bounds.
///
/// Signed inputs are allowed so that negative values are reported as the
/// matching error kind instead of wrapping around.
pub trait Axis: Copy {
    /// The value widened losslessly.
    fn value(self) -> i128;

    /// The value as an in-memory index, if it is non-negative and fits.
    fn to_index(self) -> Option<usize> {
        usize::try_from(self.value()).ok()
    }
}

macro_rules! impl_axis {
    ($($t:ty),*) => {
        $(
            impl Axis for $t {
                #[inline(always)]
                fn value(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_axis!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Row-major strides, in elements, for the given shape.
///
/// The last axis has stride 1 and every other axis skips the product of the
/// extents to its right.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0usize; shape.len()];
    let mut stride = 1usize;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// Number of elements addressed by a shape; 1 for rank 0.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Checks that a shape is non-empty with strictly positive extents whose
/// product fits in `usize`.
pub fn verify_shape<A: Axis>(shape: &[A]) -> Result<Vec<usize>> {
    if shape.is_empty() {
        return Err(TensorError::BadShape {
            reason: "shape has no axes",
        });
    }
    let extents = shape
        .iter()
        .map(|&d| match d.to_index() {
            Some(0) => Err(TensorError::BadShape {
                reason: "zero-sized axis",
            }),
            Some(d) => Ok(d),
            None => Err(TensorError::BadShape {
                reason: "negative axis",
            }),
        })
        .collect::<Result<Vec<usize>>>()?;
    if extents.iter().try_fold(1usize, |n, &d| n.checked_mul(d)).is_none() {
        return Err(TensorError::BadShape {
            reason: "element count overflows usize",
        });
    }
    Ok(extents)
}

/// Checks that `index` lies in `[0, size)` for `axis`.
pub fn verify_axis<A: Axis>(axis: usize, index: A, size: usize) -> Result<usize> {
    match index.to_index() {
        Some(i) if i < size => Ok(i),
        _ => Err(TensorError::BadAxis {
            axis,
            index: index.value(),
            size,
        }),
    }
}

/// Checks that no more indices were supplied than the tensor has axes.
pub fn verify_rank(got: usize, rank: usize) -> Result<()> {
    if got > rank {
        return Err(TensorError::BadRank { got, rank });
    }
    Ok(())
}

/// Checks `0 <= start < end <= size`.
pub fn verify_interval<A: Axis>(start: A, end: A, size: usize) -> Result<(usize, usize)> {
    let bad = || TensorError::BadInterval {
        start: start.value(),
        end: end.value(),
        size,
    };
    let (s, e) = match (start.to_index(), end.to_index()) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(bad()),
    };
    if s >= e || e > size {
        return Err(bad());
    }
    Ok((s, e))
}

/// Checks that a range step is non-zero.
pub fn verify_step(step: i64) -> Result<()> {
    if step == 0 {
        return Err(TensorError::BadStep);
    }
    Ok(())
}

/// Left-pads `shape` with 1s up to `rank` axes.
pub(crate) fn pad_left(shape: &[usize], rank: usize) -> Vec<usize> {
    let mut padded = vec![1usize; rank.saturating_sub(shape.len())];
    padded.extend_from_slice(shape);
    padded
}

/// Whether `from` can be broadcast to `to`.
///
/// Shapes are aligned by their right edge; every aligned axis must either
/// match or be 1 in `from`. A shape of higher rank than the target never
/// broadcasts.
pub fn broadcastable(from: &[usize], to: &[usize]) -> bool {
    if from.len() > to.len() {
        return false;
    }
    let padded = pad_left(from, to.len());
    padded.iter().zip(to).all(|(&f, &t)| f == t || f == 1)
}

/// Smallest shape that `first` can be broadcast to on the way to `second`.
///
/// Both shapes are right-aligned and left-padded with 1s, then every axis
/// where `first` has extent 1 takes `second`'s extent. Axes where `first`
/// is not 1 are kept as they are, so the result is only a valid target if
/// the two shapes are compatible. For `[4, 1]` against `[3]` the result is
/// `[4, 3]`.
pub fn midway_broadcast(first: &[usize], second: &[usize]) -> Vec<usize> {
    let rank = first.len().max(second.len());
    let other = pad_left(second, rank);
    let mut shape = pad_left(first, rank);
    for (s, &o) in shape.iter_mut().zip(&other) {
        if *s == 1 && o != 1 {
            *s = o;
        }
    }
    shape
}

/// Strides that read a `from`-shaped layout as if it had shape `to`.
///
/// Broadcast axes, including the padded leading ones, get stride 0 so the
/// same source element is revisited along them. Caller guarantees
/// `broadcastable(from, to)`.
pub(crate) fn broadcast_strides(from: &[usize], from_strides: &[usize], to: &[usize]) -> Vec<usize> {
    let lead = to.len() - from.len();
    let mut out = vec![0usize; to.len()];
    for (i, (&extent, &stride)) in from.iter().zip(from_strides).enumerate() {
        if extent == to[lead + i] {
            out[lead + i] = stride;
        }
    }
    out
}

/// Whether `strides` are the canonical row-major strides for `shape`.
pub fn is_row_major(shape: &[usize], strides: &[usize]) -> bool {
    self::strides(shape) == strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_strides() {
        assert_eq!(strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(strides(&[5]), vec![1]);
        assert!(strides(&[]).is_empty());
        assert_eq!(numel(&[]), 1);
        assert_eq!(numel(&[2, 3]), 6);
    }

    #[test]
    fn layout_bad_shape() {
        let empty: [usize; 0] = [];
        assert!(matches!(verify_shape(&empty), Err(TensorError::BadShape { .. })));
        assert!(matches!(verify_shape(&[0, 2]), Err(TensorError::BadShape { .. })));
        assert!(matches!(verify_shape(&[-1, 2]), Err(TensorError::BadShape { .. })));
        assert_eq!(verify_shape(&[2u8, 3]).unwrap(), vec![2, 3]);
    }

    #[test]
    fn layout_shape_overflow() {
        let overflow: Result<Vec<usize>> = Err(TensorError::BadShape {
            reason: "element count overflows usize",
        });
        assert_eq!(verify_shape(&[usize::MAX, 2]), overflow);
        assert_eq!(verify_shape(&[1usize << 22, 1 << 22, 1 << 22]), overflow);
        assert_eq!(verify_shape(&[usize::MAX, 1]).unwrap(), vec![usize::MAX, 1]);
    }

    #[test]
    fn layout_bounds() {
        assert_eq!(verify_axis(0, 1, 2).unwrap(), 1);
        assert!(matches!(verify_axis(0, 2, 2), Err(TensorError::BadAxis { .. })));
        assert!(matches!(verify_axis(1, -1, 2), Err(TensorError::BadAxis { axis: 1, .. })));
        assert!(verify_rank(2, 2).is_ok());
        assert_eq!(verify_rank(3, 2), Err(TensorError::BadRank { got: 3, rank: 2 }));
        assert_eq!(verify_interval(1, 3, 3).unwrap(), (1, 3));
        assert!(verify_interval(2, 2, 3).is_err());
        assert!(verify_interval(0, 4, 3).is_err());
        assert!(verify_interval(-1, 2, 3).is_err());
        assert_eq!(verify_step(0), Err(TensorError::BadStep));
        assert!(verify_step(-2).is_ok());
    }

    #[test]
    fn layout_broadcastable() {
        assert!(broadcastable(&[3], &[4, 3]));
        assert!(broadcastable(&[4, 1], &[4, 3]));
        assert!(broadcastable(&[], &[2, 2]));
        assert!(!broadcastable(&[3], &[4]));
        assert!(!broadcastable(&[2, 3], &[3]));
    }

    #[test]
    fn layout_midway_broadcast() {
        assert_eq!(midway_broadcast(&[3], &[4, 1]), vec![4, 3]);
        assert_eq!(midway_broadcast(&[4, 1], &[3]), vec![4, 3]);
        assert_eq!(midway_broadcast(&[3], &[4]), vec![3]);
        assert_eq!(midway_broadcast(&[2, 1, 5], &[3, 1]), vec![2, 3, 5]);
    }

    #[test]
    fn layout_broadcast_strides() {
        assert_eq!(broadcast_strides(&[4, 1], &[1, 1], &[4, 3]), vec![1, 0]);
        assert_eq!(broadcast_strides(&[3], &[1], &[4, 3]), vec![0, 1]);
        assert_eq!(broadcast_strides(&[2, 1, 3], &[3, 3, 1], &[2, 4, 3]), vec![3, 0, 1]);
    }
}
