//! Dimension and shape helpers shared by the meta functions.

use itertools::Itertools;

use super::{layout::Shape, tensor::TensorError};

/// Wraps a possibly negative `dim` into `0..rank`.
/// A tensor of rank 0 accepts dims as if it had rank 1.
pub fn canonicalize_dim(rank: usize, dim: i64) -> Result<usize, TensorError> {
    let len = rank.max(1) as i64;
    let (min, max) = (-len, len - 1);
    if !(min..=max).contains(&dim) {
        return Err(TensorError::DimRange { dim, min, max });
    }
    Ok(match dim < 0 {
        true => (dim + len) as usize,
        false => dim as usize,
    })
}

/// Resolves the dims a reduction works on.
/// `None` or an empty list reduce over every dim. Duplicates are rejected.
pub fn reduction_dims(rank: usize, dims: Option<&[i64]>) -> Result<Vec<usize>, TensorError> {
    let dims = match dims {
        Some(dims) if !dims.is_empty() => dims,
        _ => return Ok((0..rank).collect()),
    };
    let dims = dims
        .iter()
        .map(|&dim| canonicalize_dim(rank, dim))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(&dim) = dims.iter().duplicates().next() {
        return Err(TensorError::DuplicateDim(dim));
    }
    Ok(dims)
}

/// Shape of a reduction over `dims`: reduced dims become 1 with `keepdim` and are dropped otherwise.
pub fn reduction_output_shape(shape: &Shape, dims: &[usize], keepdim: bool) -> Shape {
    shape
        .iter()
        .enumerate()
        .filter_map(|(index, &size)| match (dims.contains(&index), keepdim) {
            (false, _) => Some(size),
            (true, true) => Some(1),
            (true, false) => None,
        })
        .collect()
}

/// Broadcasts shapes against each other, aligning them from the last dimension.
/// Two sizes are compatible if they are equal or one of them is 1.
pub fn broadcast_shapes<'a>(
    shapes: impl IntoIterator<Item = &'a Shape>,
) -> Result<Shape, TensorError> {
    shapes
        .into_iter()
        .try_fold(Shape::default(), |lhs, rhs| broadcast_pair(&lhs, rhs))
}

fn broadcast_pair(lhs: &Shape, rhs: &Shape) -> Result<Shape, TensorError> {
    let len = lhs.len().max(rhs.len());
    // leading dims missing from the shorter shape count as 1
    let size = |shape: &Shape, index: usize| match index + shape.len() < len {
        true => 1,
        false => shape[index + shape.len() - len],
    };
    (0..len)
        .map(|index| match (size(lhs, index), size(rhs, index)) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(TensorError::Broadcast(lhs.clone(), rhs.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{broadcast_shapes, canonicalize_dim, reduction_dims, reduction_output_shape};
    use crate::loom::{layout::Shape, tensor::TensorError};

    #[test]
    fn test_canonicalize_dim() -> Result<(), Box<dyn Error>> {
        assert_eq!(canonicalize_dim(3, -1)?, 2);
        assert_eq!(canonicalize_dim(3, -3)?, 0);
        assert_eq!(canonicalize_dim(3, 2)?, 2);
        assert_eq!(canonicalize_dim(0, -1)?, 0);
        assert_eq!(canonicalize_dim(0, 0)?, 0);
        assert_eq!(
            canonicalize_dim(3, 3),
            Err(TensorError::DimRange {
                dim: 3,
                min: -3,
                max: 2
            })
        );
        assert!(canonicalize_dim(3, -4).is_err());
        Ok(())
    }

    #[test]
    fn test_reduction_dims() -> Result<(), Box<dyn Error>> {
        assert_eq!(reduction_dims(3, None)?, vec![0, 1, 2]);
        assert_eq!(reduction_dims(3, Some(&[][..]))?, vec![0, 1, 2]);
        assert_eq!(reduction_dims(3, Some(&[-1, 0][..]))?, vec![2, 0]);
        assert_eq!(
            reduction_dims(3, Some(&[1, -2][..])),
            Err(TensorError::DuplicateDim(1))
        );
        Ok(())
    }

    #[test]
    fn test_reduction_output_shape() {
        let shape = Shape::from([2, 3, 4, 5]);
        assert_eq!(
            reduction_output_shape(&shape, &[1, 3], true),
            Shape::from([2, 1, 4, 1])
        );
        assert_eq!(
            reduction_output_shape(&shape, &[3, 1], false),
            Shape::from([2, 4])
        );
        assert_eq!(
            reduction_output_shape(&shape, &[0, 1, 2, 3], false),
            Shape::default()
        );
    }

    #[test]
    fn test_reduction_rank() -> Result<(), Box<dyn Error>> {
        fastrand::seed(42);
        for _ in 0..64 {
            let rank = fastrand::usize(0..6);
            let shape: Shape = (0..rank).map(|_| fastrand::usize(0..5)).collect();
            let dims: Vec<i64> = (0..rank as i64)
                .filter(|_| fastrand::bool())
                .map(|dim| match fastrand::bool() {
                    true => dim - rank as i64,
                    false => dim,
                })
                .collect();
            let resolved = reduction_dims(rank, Some(dims.as_slice()))?;

            let keep = reduction_output_shape(&shape, &resolved, true);
            assert_eq!(keep.len(), rank);

            let drop = reduction_output_shape(&shape, &resolved, false);
            assert_eq!(drop.len(), rank - resolved.len());
        }
        Ok(())
    }

    #[test]
    fn test_broadcast_shapes() -> Result<(), Box<dyn Error>> {
        let shapes = [Shape::from([3, 1]), Shape::from([4]), Shape::from([2, 1, 1])];
        assert_eq!(broadcast_shapes(&shapes)?, Shape::from([2, 3, 4]));

        let shapes = [Shape::from([0, 1]), Shape::from([1, 5])];
        assert_eq!(broadcast_shapes(&shapes)?, Shape::from([0, 5]));

        let shapes = [Shape::from([3]), Shape::from([4])];
        assert_eq!(
            broadcast_shapes(&shapes),
            Err(TensorError::Broadcast(Shape::from([3]), Shape::from([4])))
        );

        assert_eq!(broadcast_shapes([])?, Shape::default());
        Ok(())
    }
}
