//! Shape, data type and layout inference for tensor operations.
//!
//! Operands are described by [`TensorMeta`](loom::tensor::TensorMeta) descriptors that carry no data.
//! A [`Registry`](loom::registry::Registry) maps each op to a meta function computing the descriptors
//! of its results, or the [`TensorError`](loom::tensor::TensorError) the op would raise.
//!
//! ```
//! use mia_meta::{
//!     hal,
//!     loom::{device::Device, layout::Shape, ops::{MetaArgs, OpName}, tensor::TensorMeta},
//! };
//!
//! let input = TensorMeta::empty::<f32>(Device::Meta, [2, 3, 8, 8]);
//! let args = MetaArgs::new()
//!     .with("self", input)
//!     .with("padding", vec![1i64, 1, 2, 2]);
//! let output = hal::registry()
//!     .dispatch(OpName::ReflectionPad2d.into(), args)
//!     .unwrap();
//! assert_eq!(output[0].shape(), Shape::from([2, 3, 12, 10]));
//! ```

pub mod hal;
pub mod loom;
