//! Conversion of scalars, nested sequences and tensors into a flat buffer.
//!
//! [`Backing`] is implemented for everything a tensor can be built from. The
//! input is walked depth first; each nesting level contributes one axis,
//! sibling sequences must agree on their length, and every leaf is converted
//! to the target element kind. [`Value`] covers inputs whose element kinds or
//! nesting are only known at runtime.

use crate::error::{Result, TensorError};
use crate::scalars::{bf16, f16, Element, Scalar};
use crate::tensor::Tensor;

/// Accumulates the flat data and inferred shape during a walk.
pub struct Ingestion<T> {
    data: Vec<T>,
    shape: Vec<usize>,
    leaf_depth: Option<usize>,
}

impl<T: Element> Ingestion<T> {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            shape: Vec::new(),
            leaf_depth: None,
        }
    }

    /// Records a numeric leaf found `depth` levels down.
    pub fn push_leaf(&mut self, depth: usize, value: Scalar) -> Result<()> {
        match self.leaf_depth {
            None => self.leaf_depth = Some(depth),
            Some(d) if d != depth => {
                return Err(TensorError::BadBacking {
                    reason: "scalars and sequences mixed at the same depth",
                })
            }
            Some(_) => {}
        }
        self.data.push(T::from_scalar(value));
        Ok(())
    }

    /// Records a sequence of `len` items found `depth` levels down.
    pub fn enter_sequence(&mut self, depth: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Err(TensorError::BadBacking {
                reason: "empty sequence",
            });
        }
        if matches!(self.leaf_depth, Some(d) if d <= depth) {
            return Err(TensorError::BadBacking {
                reason: "scalars and sequences mixed at the same depth",
            });
        }
        if self.shape.len() == depth {
            self.shape.push(len);
        } else if self.shape[depth] != len {
            return Err(TensorError::BadBacking {
                reason: "ragged nested sequences",
            });
        }
        Ok(())
    }

    fn finish(self) -> (Vec<T>, Vec<usize>) {
        (self.data, self.shape)
    }
}

/// Something a tensor can be built from.
pub trait Backing {
    /// Feeds this value, found `depth` levels down, into `out`.
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()>;
}

/// Flattens any backing into `(data, shape)` with elements of kind `T`.
///
/// A bare scalar yields rank 0. Empty and ragged sequences fail with
/// [`TensorError::BadBacking`].
pub fn ingest<T: Element, B: Backing + ?Sized>(value: &B) -> Result<(Vec<T>, Vec<usize>)> {
    let mut out = Ingestion::new();
    value.unwrap_into(&mut out, 0)?;
    Ok(out.finish())
}

macro_rules! impl_backing_scalar {
    ($($t:ty),*) => {
        $(
            impl Backing for $t {
                fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
                    out.push_leaf(depth, self.to_scalar())
                }
            }
        )*
    };
}

impl_backing_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, f16, bf16);

impl<B: Backing> Backing for [B] {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        out.enter_sequence(depth, self.len())?;
        for item in self {
            item.unwrap_into(out, depth + 1)?;
        }
        Ok(())
    }
}

impl<B: Backing, const N: usize> Backing for [B; N] {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        self.as_slice().unwrap_into(out, depth)
    }
}

impl<B: Backing> Backing for Vec<B> {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        self.as_slice().unwrap_into(out, depth)
    }
}

impl<B: Backing + ?Sized> Backing for &B {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        (**self).unwrap_into(out, depth)
    }
}

/// Text is ingested as its UTF-8 bytes.
impl Backing for str {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        self.as_bytes().unwrap_into(out, depth)
    }
}

impl Backing for String {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        self.as_str().unwrap_into(out, depth)
    }
}

/// A tensor contributes its own axes and is cast element by element.
impl<U: Element> Backing for Tensor<U> {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        for (axis, &extent) in self.shape().iter().enumerate() {
            out.enter_sequence(depth + axis, extent)?;
        }
        let leaf = depth + self.rank();
        for value in self.iter() {
            out.push_leaf(leaf, value.to_scalar())?;
        }
        Ok(())
    }
}

/// A failed operation's result ingests as its error, unchanged.
impl<U: Element> Backing for Result<Tensor<U>> {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        match self {
            Ok(tensor) => tensor.unwrap_into(out, depth),
            Err(err) => Err(err.clone()),
        }
    }
}

/// Dynamically shaped numeric input.
///
/// # Example
///
/// ```rust
/// use stridex::{Tensor, Value};
///
/// let v = Value::from(vec![
///     Value::from(vec![Value::from(1u8), Value::from(2.5f64)]),
///     Value::from(vec![Value::from(-3i64), Value::from(4u32)]),
/// ]);
/// let t = Tensor::<f32>::from_backing(&v).unwrap();
/// assert_eq!(t.shape(), &[2, 2]);
/// assert_eq!(t.ravel(), vec![1.0, 2.5, -3.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numeric leaf.
    Scalar(Scalar),
    /// A sequence of nested values.
    Seq(Vec<Value>),
}

impl Backing for Value {
    fn unwrap_into<T: Element>(&self, out: &mut Ingestion<T>, depth: usize) -> Result<()> {
        match self {
            Value::Scalar(s) => out.push_leaf(depth, *s),
            Value::Seq(items) => items.unwrap_into(out, depth),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

macro_rules! impl_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(x: $t) -> Self {
                    Value::Scalar(x.to_scalar())
                }
            }
        )*
    };
}

impl_value_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, f16, bf16);
