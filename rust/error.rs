//! Error taxonomy shared by every fallible tensor operation.
//!
//! A failed operation returns one of these instead of a tensor. Errors are
//! cheap to clone, so an operand that already failed can be handed to the
//! next operation and comes back out unchanged.

use thiserror::Error;

/// Shape rendered as `[a, b, c]` inside error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDescriptor(Vec<usize>);

impl ShapeDescriptor {
    /// Create from a slice.
    pub fn from_slice(shape: &[usize]) -> Self {
        Self(shape.to_vec())
    }

    /// Return as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl core::fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[")?;
        for (i, &d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Error type for tensor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Shape is empty, or an axis extent is zero or negative.
    #[error("bad shape: {reason}")]
    BadShape { reason: &'static str },

    /// Index outside `[0, size)` for its axis.
    #[error("bad axis: index {index} out of bounds for axis {axis} of size {size}")]
    BadAxis { axis: usize, index: i128, size: usize },

    /// More indices than the tensor has axes.
    #[error("bad rank: {got} indices given for a tensor of rank {rank}")]
    BadRank { got: usize, rank: usize },

    /// Slice interval violating `0 <= start < end <= size`.
    #[error("bad interval: [{start}, {end}) is not within [0, {size})")]
    BadInterval { start: i128, end: i128, size: usize },

    /// Range step of zero.
    #[error("bad step: step must be non-zero")]
    BadStep,

    /// Input could not be unwrapped into a flat buffer.
    #[error("bad backing: {reason}")]
    BadBacking { reason: &'static str },

    /// Shapes cannot be reconciled under broadcasting rules.
    #[error("not broadcastable: {from} cannot be broadcast to {to}")]
    NotBroadcastable {
        from: ShapeDescriptor,
        to: ShapeDescriptor,
    },
}

impl TensorError {
    pub(crate) fn not_broadcastable(from: &[usize], to: &[usize]) -> Self {
        TensorError::NotBroadcastable {
            from: ShapeDescriptor::from_slice(from),
            to: ShapeDescriptor::from_slice(to),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, TensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_descriptor_display() {
        assert_eq!(ShapeDescriptor::from_slice(&[4, 1, 3]).to_string(), "[4, 1, 3]");
        assert_eq!(ShapeDescriptor::from_slice(&[]).to_string(), "[]");
    }

    #[test]
    fn tensor_error_display() {
        let err = TensorError::BadStep;
        assert_eq!(format!("{}", err), "bad step: step must be non-zero");

        let err = TensorError::BadAxis {
            axis: 1,
            index: -1,
            size: 2,
        };
        assert_eq!(
            format!("{}", err),
            "bad axis: index -1 out of bounds for axis 1 of size 2"
        );

        let err = TensorError::not_broadcastable(&[3], &[4]);
        assert_eq!(format!("{}", err), "not broadcastable: [3] cannot be broadcast to [4]");
        match err {
            TensorError::NotBroadcastable { from, to } => {
                assert_eq!(from.as_slice(), &[3]);
                assert_eq!(to.as_slice(), &[4]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
