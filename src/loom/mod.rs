//! The `loom` module provides the foundational abstractions for meta inference:
//! symbolic tensors that carry a layout, a data type and a device, but never any data.
//!
//! ## Key Components
//! 1. **Tensor Descriptors**:
//!    - Tensor layouts (`Layout`) made of shapes and strides.
//!    - Contiguous and column-major layout construction, transposition and permutation.
//!    - Descriptors (`TensorMeta`) and advanced index entries (`IndexMeta`).
//!
//! 2. **Numerical System**:
//!    - Data type tags (`DataType`) and their real/complex classification.
//!    - Scalar types (`f32`, `f16`, `i64`, etc.) mapped to their tags.
//!
//! 3. **Shape Utilities**:
//!    - Dimension canonicalization, reduction dims and broadcasting.
//!
//! 4. **Dispatch**:
//!    - Op identifiers (`OpId`) as closed enums, named arguments (`MetaArgs`).
//!    - A registry (`Registry`) populated once through `RegistryBuilder` and read-only afterwards.

pub mod device;
pub mod layout;
pub mod num;
pub mod ops;
pub mod registry;
pub mod tensor;
pub mod utils;
