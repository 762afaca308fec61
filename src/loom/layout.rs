use std::sync::Arc;

use derive_more::{Deref, Display, From, Into};
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::tensor::{Rank, TensorError};

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deref, From, Into, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("[{}]", _0.iter().format(", "))]
pub struct Shape(Arc<[usize]>);

impl<const N: usize> From<[usize; N]> for Shape {
    #[inline]
    fn from(value: [usize; N]) -> Self {
        Self(value.into())
    }
}

impl From<Vec<usize>> for Shape {
    #[inline]
    fn from(value: Vec<usize>) -> Self {
        Self(value.into())
    }
}

impl From<&[usize]> for Shape {
    #[inline]
    fn from(value: &[usize]) -> Self {
        Self(value.into())
    }
}

impl FromIterator<usize> for Shape {
    #[inline]
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Shape {
    /// Number of elements. A shape with no dimensions holds one element.
    #[inline]
    pub fn numel(&self) -> usize {
        self.iter().product()
    }

    /// Converts the shape into a fixed-size array. Fails if the rank is not `N`.
    #[inline]
    pub fn try_to_array<const N: usize>(&self) -> Result<[usize; N], TensorError> {
        <[usize; N]>::try_from(&self[..]).map_err(|_| TensorError::Shape {
            expected: Rank::Exactly(N),
            shape: self.clone(),
        })
    }

    /// Strides of a row-major contiguous tensor of this shape.
    /// Dimensions of size 0 contribute as if they had size 1.
    pub fn contiguous_stride(&self) -> Stride {
        let mut stride = vec![1; self.len()];
        for index in (0..self.len().saturating_sub(1)).rev() {
            stride[index] = stride[index + 1] * self[index + 1].max(1);
        }
        Stride::from(stride)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deref, From, Into, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("[{}]", _0.iter().format(", "))]
pub struct Stride(Arc<[usize]>);

impl<const N: usize> From<[usize; N]> for Stride {
    #[inline]
    fn from(value: [usize; N]) -> Self {
        Self(value.into())
    }
}

impl From<Vec<usize>> for Stride {
    #[inline]
    fn from(value: Vec<usize>) -> Self {
        Self(value.into())
    }
}

/// Shape and strides of a tensor.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("{shape}:{stride}")]
pub struct Layout {
    shape: Shape,
    stride: Stride,
}

impl Layout {
    /// Creates a layout from explicit shape and strides.
    ///
    /// # Panics
    /// This method will panic if the shape and the strides are of different lengths.
    #[inline]
    pub fn new(shape: impl Into<Shape>, stride: impl Into<Stride>) -> Self {
        let shape = shape.into();
        let stride = stride.into();
        assert_eq!(
            shape.len(),
            stride.len(),
            "shape {shape} and stride {stride} must be of the same length"
        );
        Self { shape, stride }
    }

    /// Creates a row-major contiguous layout.
    #[inline]
    pub fn from_shape(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let stride = shape.contiguous_stride();
        Self { shape, stride }
    }

    /// Creates a layout in which every matrix in the batch is stored column-major,
    /// i.e., the contiguous layout of the shape with its last two dimensions swapped,
    /// transposed back. Shapes with fewer than two dimensions are contiguous.
    pub fn column_major(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let len = shape.len();
        if len < 2 {
            return Self::from_shape(shape);
        }
        let mut swapped = shape.to_vec();
        swapped.swap(len - 2, len - 1);
        Self::from_shape(swapped).transpose(len - 2, len - 1)
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape.clone()
    }

    #[inline]
    pub fn stride(&self) -> Stride {
        self.stride.clone()
    }

    /// Number of dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.stride == self.shape.contiguous_stride()
    }

    /// Swaps two dimensions, together with their strides.
    ///
    /// # Panics
    /// This method will panic if either dimension is out of bounds.
    pub fn transpose(&self, x: usize, y: usize) -> Self {
        let mut shape = self.shape.to_vec();
        let mut stride = self.stride.to_vec();
        shape.swap(x, y);
        stride.swap(x, y);
        Self::new(shape, stride)
    }

    /// Reorders dimensions so that dimension `i` of the output is dimension `dims[i]` of `self`.
    ///
    /// # Panics
    /// This method will panic if `dims` is not a permutation of the dimensions.
    pub fn permute(&self, dims: &[usize]) -> Self {
        assert!(
            dims.len() == self.len() && dims.iter().all_unique(),
            "{dims:?} is not a permutation of {} dimensions",
            self.len()
        );
        let shape: Vec<_> = dims.iter().map(|&dim| self.shape[dim]).collect();
        let stride: Vec<_> = dims.iter().map(|&dim| self.stride[dim]).collect();
        Self::new(shape, stride)
    }
}

pub trait IntoLayout {
    fn into_layout(self) -> Layout;
}

impl IntoLayout for Layout {
    #[inline]
    fn into_layout(self) -> Layout {
        self
    }
}

impl IntoLayout for Shape {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

impl IntoLayout for Vec<usize> {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

impl<const N: usize> IntoLayout for [usize; N] {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, Shape, Stride};

    #[test]
    fn test_contiguous() {
        let layout = Layout::from_shape([2, 3, 4]);
        assert_eq!(layout.stride(), Stride::from([12, 4, 1]));
        assert!(layout.is_contiguous());
        assert_eq!(layout.numel(), 24);

        let layout = Layout::from_shape([2, 0, 4]);
        assert_eq!(layout.stride(), Stride::from([4, 4, 1]));
        assert_eq!(layout.numel(), 0);

        let layout = Layout::from_shape(Shape::default());
        assert!(layout.is_empty());
        assert_eq!(layout.numel(), 1);
    }

    #[test]
    fn test_column_major() {
        let layout = Layout::column_major([5, 3, 3]);
        assert_eq!(layout.shape(), Shape::from([5, 3, 3]));
        assert_eq!(layout.stride(), Stride::from([9, 1, 3]));
        assert!(!layout.is_contiguous());

        let layout = Layout::column_major([2, 4]);
        assert_eq!(layout.shape(), Shape::from([2, 4]));
        assert_eq!(layout.stride(), Stride::from([1, 2]));

        let layout = Layout::column_major([7]);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_permute() {
        let layout = Layout::from_shape([2, 3, 4]).permute(&[2, 0, 1]);
        assert_eq!(layout.shape(), Shape::from([4, 2, 3]));
        assert_eq!(layout.stride(), Stride::from([1, 12, 4]));
        assert_eq!(layout.to_string(), "[4, 2, 3]:[1, 12, 4]");
    }

    #[test]
    fn test_try_to_array() {
        let shape = Shape::from([3, 8, 8]);
        assert_eq!(shape.try_to_array::<3>().ok(), Some([3, 8, 8]));
        assert!(shape.try_to_array::<4>().is_err());
    }
}
