//! # Stridex - Strided N-Dimensional Tensor Views
//!
//! * Row-major tensors over flat, `Rc`-shared buffers with explicit aliasing.
//! * Zero-copy indexing, slicing, reshaping and adoption of caller-owned buffers.
//! * Handles integral, `f32`, `f64`, half-precision (`f16`) and brain floating point (`bf16`) elements.
//! * Elementwise arithmetic with broadcasting, forked across worker threads per call.
//!
//! ## Example
//!
//! ```rust
//! use stridex::{Config, Tensor};
//!
//! let config = Config::default();
//! let a = Tensor::<f32>::from_backing(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
//!
//! // Row views alias the parent buffer
//! let second = a.index(&[1]).unwrap();
//! assert_eq!(second.ravel(), vec![4.0, 5.0, 6.0]);
//!
//! // Arithmetic broadcasts the right operand and writes into the left one
//! a.mul(&[10.0, 100.0, 1000.0], &config).unwrap();
//! assert_eq!(second.ravel(), vec![40.0, 500.0, 6000.0]);
//! ```
//!
//! ## Aliasing
//!
//! Index, slice, reshape, [`Tensor::from_buffer`] and `clone` share the
//! parent buffer. Broadcast, cast and copy allocate a new one. Writes made
//! by [`Tensor::set`], [`Tensor::reverse`] and the elementwise operations
//! are visible through every alias.
//!
//! ## Errors
//!
//! Every fallible operation returns [`Result`]. A failed result can be fed
//! back in as an operand, and the same error comes out without any work
//! being done. [`Config::escalate`] turns errors into panics when
//! [`Config::interactive`] is set.
//!
//! ## Modules
//!
//! - [`layout`]: strides, shape validation and broadcast shape arithmetic.
//! - [`scalars`]: the [`Element`] kinds and [`Scalar`] conversions.
//! - [`ingest`]: [`Backing`] inputs and the dynamic [`Value`] tree.
//! - [`tensor`]: the [`Tensor`] view and its operations.
//! - [`zip`]: parallel elementwise dispatch.

pub mod buffer;
pub mod config;
pub mod error;
pub mod ingest;
pub mod iter;
pub mod layout;
pub mod scalars;
pub mod tensor;
pub mod zip;

pub use buffer::Buffer;
pub use config::Config;
pub use error::{Result, ShapeDescriptor, TensorError};
pub use ingest::{ingest, Backing, Value};
pub use iter::Iter;
pub use layout::{broadcastable, midway_broadcast, numel, strides, Axis};
pub use scalars::{bf16, f16, Element, Scalar};
pub use tensor::Tensor;
