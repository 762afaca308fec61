use derive_more::Display;
use thiserror::Error;

use super::{
    device::Device,
    layout::{IntoLayout, Layout, Shape, Stride},
    num::{DataType, Scalar},
    ops::{OpId, OpName},
    utils,
};

/// Expected number of dimensions, as reported by [`TensorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Rank {
    #[display("{_0}")]
    Exactly(usize),
    #[display("at least {_0}")]
    AtLeast(usize),
    #[display("{_0} or {_1}")]
    Either(usize, usize),
}

impl Rank {
    #[inline]
    pub fn contains(self, rank: usize) -> bool {
        match self {
            Rank::Exactly(x) => rank == x,
            Rank::AtLeast(x) => rank >= x,
            Rank::Either(x, y) => rank == x || rank == y,
        }
    }
}

/// Failures of meta inference. Messages are only formatted when displayed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    #[error("{op}: expected {expected}-D tensor, but got {found}-D tensor")]
    Rank {
        op: OpName,
        expected: Rank,
        found: usize,
    },
    #[error("expected {expected}-D shape, but got {shape}")]
    Shape { expected: Rank, shape: Shape },
    #[error("{op}: A must be batches of square matrices, but they are {rows} by {cols} matrices")]
    Square { op: OpName, rows: usize, cols: usize },
    #[error("dimension out of range (expected to be in range of [{min}, {max}], but got {dim})")]
    DimRange { dim: i64, min: i64, max: i64 },
    #[error("dim {0} appears multiple times in the list of dims")]
    DuplicateDim(usize),
    #[error("shape mismatch: objects cannot be broadcast to a single shape: {0} and {1}")]
    Broadcast(Shape, Shape),
    #[error("{op}: expected {expected} tensor, but got {found}")]
    Type {
        op: OpName,
        expected: &'static str,
        found: DataType,
    },
    #[error("tensors used as indices must be long, byte or bool tensors, but got {0}")]
    IndexType(DataType),
    #[error("at least one index must be provided")]
    EmptyIndices,
    #[error("too many indices for tensor of dimension {rank} (got {count})")]
    TooManyIndices { rank: usize, count: usize },
    #[error(
        "the shape of the mask {mask} at index {index} does not match the shape of the indexed tensor {shape} at index {dim}"
    )]
    MaskShape {
        mask: Shape,
        index: usize,
        shape: Shape,
        dim: usize,
    },
    #[error("{op}: the number of elements selected by the mask at index {index} depends on data")]
    DataDependent { op: OpName, index: usize },
    #[error("the mask at index {index} has {numel} elements, but {nonzero} are said to be selected")]
    MaskCount {
        index: usize,
        nonzero: usize,
        numel: usize,
    },
    #[error("{op}: cannot infer the output size of a meta tensor without `output_size`")]
    OutputSize { op: OpName },
    #[error("expected out tensor on device {expected}, but got {found}")]
    Device { expected: Device, found: Device },
    #[error("expected UPLO argument to be 'L' or 'U', but got {0}")]
    Uplo(String),
    #[error("{op}: expected {expected} values for `{name}`, but got {found}")]
    Length {
        op: OpName,
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{op}: 3D or 4D (batch mode) tensor with non-zero dimensions expected for input, but got {layout}")]
    Input { op: OpName, layout: Layout },
    #[error("{op}: computed output size {size} is negative")]
    NegativeSize { op: OpName, size: i64 },
    #[error("{op}: computed output size overflows")]
    SizeOverflow { op: OpName },
    #[error("missing argument `{0}`")]
    Argument(String),
    #[error("argument `{name}` is expected to be {expected}")]
    ArgumentType { name: String, expected: &'static str },
    #[error("no meta function is registered for {0}")]
    Unimplemented(OpId),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId;

/// A symbolic tensor: layout, data type and device, but no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorMeta {
    layout: Layout,
    r#type: DataType,
    device: Device,
    id: uid::Id<TensorId>,
}

impl TensorMeta {
    /// Create a descriptor.
    #[inline]
    pub fn new(device: Device, layout: impl IntoLayout, r#type: DataType) -> Self {
        let layout = layout.into_layout();
        let id = uid::Id::new();
        Self {
            layout,
            r#type,
            device,
            id,
        }
    }

    /// Create a descriptor whose data type is given by a Rust scalar type.
    #[inline]
    pub fn empty<T: Scalar>(device: Device, layout: impl IntoLayout) -> Self {
        Self::new(device, layout, T::DATA_TYPE)
    }

    /// Create a descriptor on the same device and of the same type.
    #[inline]
    pub fn new_empty(&self, layout: impl IntoLayout) -> Self {
        Self::new(self.device, layout, self.r#type)
    }

    /// Create a descriptor on the same device with another type.
    #[inline]
    pub fn new_empty_with_type(&self, layout: impl IntoLayout, r#type: DataType) -> Self {
        Self::new(self.device, layout, r#type)
    }

    /// Create a descriptor of the same layout, type and device, but a new identity.
    #[inline]
    pub fn empty_like(&self) -> Self {
        self.new_empty(self.layout())
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout.clone()
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.layout.shape()
    }

    #[inline]
    pub fn stride(&self) -> Stride {
        self.layout.stride()
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.r#type
    }

    #[inline]
    pub fn device(&self) -> Device {
        self.device
    }

    #[inline]
    pub fn id(&self) -> uid::Id<TensorId> {
        self.id
    }

    /// Number of dimensions.
    #[inline]
    pub fn dim(&self) -> usize {
        self.layout.len()
    }

    /// Number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    /// Size of a dimension. Negative `dim` counts from the back.
    /// A 0-d tensor answers as if it had a single dimension of size 1.
    #[inline]
    pub fn size(&self, dim: i64) -> Result<usize, TensorError> {
        let dim = utils::canonicalize_dim(self.dim(), dim)?;
        Ok(self.shape().get(dim).copied().unwrap_or(1))
    }

    /// Swap two dimensions of the descriptor.
    pub fn transpose(mut self, x: i64, y: i64) -> Result<Self, TensorError> {
        let rank = self.dim();
        let x = utils::canonicalize_dim(rank, x)?;
        let y = utils::canonicalize_dim(rank, y)?;
        if rank > 0 {
            self.layout = self.layout.transpose(x, y);
        }
        Ok(self)
    }

    /// Resize the descriptor in place, keeping its identity.
    /// The layout is kept if the shape does not change; otherwise it becomes contiguous.
    pub fn resize(&mut self, shape: impl Into<Shape>) {
        let shape = shape.into();
        if self.layout.shape() != shape {
            self.layout = Layout::from_shape(shape);
        }
    }

    /// Change the data type in place, keeping its identity.
    #[inline]
    pub fn set_type(&mut self, r#type: DataType) {
        self.r#type = r#type;
    }
}

/// One entry of an advanced index list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum IndexMeta {
    /// Takes the full extent of the dimension.
    #[default]
    Full,
    /// An `int64` index tensor, or an `int8`/`bool` mask.
    /// `nonzero` is the number of elements a mask selects, if it is known ahead of time.
    Tensor {
        tensor: TensorMeta,
        nonzero: Option<usize>,
    },
}

impl IndexMeta {
    /// A mask that selects exactly `nonzero` elements.
    #[inline]
    pub fn mask(tensor: TensorMeta, nonzero: usize) -> Self {
        let nonzero = Some(nonzero);
        Self::Tensor { tensor, nonzero }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, IndexMeta::Full)
    }
}

impl From<TensorMeta> for IndexMeta {
    #[inline]
    fn from(tensor: TensorMeta) -> Self {
        let nonzero = None;
        Self::Tensor { tensor, nonzero }
    }
}

impl From<Option<TensorMeta>> for IndexMeta {
    #[inline]
    fn from(value: Option<TensorMeta>) -> Self {
        value.map_or(IndexMeta::Full, IndexMeta::from)
    }
}
