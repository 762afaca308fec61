use itertools::Itertools;

use super::out::bind_out;
use crate::loom::{
    layout::Shape,
    num::DataType,
    ops::OpName,
    registry::RegistryBuilder,
    tensor::{IndexMeta, TensorError, TensorMeta},
    utils,
};

/// Selects entries of `input` along `dim`.
/// The result has `index.numel()` entries along `dim`; a 0-d input keeps its shape.
pub fn index_select(
    input: &TensorMeta,
    dim: i64,
    index: &TensorMeta,
) -> Result<TensorMeta, TensorError> {
    if input.dim() == 0 {
        return Ok(input.new_empty(input.shape()));
    }
    let dim = utils::canonicalize_dim(input.dim(), dim)?;
    let mut shape = input.shape().to_vec();
    shape[dim] = index.numel();
    Ok(input.new_empty(shape))
}

pub fn index_select_out(
    input: &TensorMeta,
    dim: i64,
    index: &TensorMeta,
    out: TensorMeta,
) -> Result<TensorMeta, TensorError> {
    let f = || Ok([index_select(input, dim, index)?]);
    let [out] = bind_out(f, input.device(), [out])?;
    Ok(out)
}

/// Where a scan over index entries stands relative to the run of defined indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subspace {
    Before,
    Inside,
    After,
}

/// Checks if all defined entries sit next to each other.
fn has_contiguous_subspace(defined: impl IntoIterator<Item = bool>) -> bool {
    let mut state = Subspace::Before;
    for defined in defined {
        state = match (state, defined) {
            (Subspace::Before, true) => Subspace::Inside,
            (Subspace::Inside, false) => Subspace::After,
            (Subspace::After, true) => return false,
            (state, _) => state,
        };
    }
    true
}

/// Advanced indexing, `input[indices]`.
///
/// Each entry indexes one dimension: [`IndexMeta::Full`] keeps the dimension, an `int64`
/// tensor gathers along it, and an `int8`/`bool` mask of rank `k` consumes `k` dimensions.
/// All tensor indices are broadcast together into one replacement shape. If they are adjacent,
/// the replacement takes their place in the result; otherwise it is moved to the front.
pub fn index(input: &TensorMeta, indices: &[IndexMeta]) -> Result<TensorMeta, TensorError> {
    const OP: OpName = OpName::Index;

    if indices.is_empty() {
        return Err(TensorError::EmptyIndices);
    }
    let rank = input.dim();
    let shape = input.shape();

    // masks are expanded into one coordinate index per masked dimension
    let mut expanded: Vec<Option<Shape>> = Vec::with_capacity(rank);
    for (index, entry) in indices.iter().enumerate() {
        let (tensor, nonzero) = match entry {
            IndexMeta::Full => {
                expanded.push(None);
                continue;
            }
            IndexMeta::Tensor { tensor, nonzero } => (tensor, *nonzero),
        };
        match tensor.data_type() {
            DataType::I64 => expanded.push(Some(tensor.shape())),
            DataType::I8 | DataType::Bool => {
                let mask = tensor.shape();
                let start = expanded.len();
                if start + mask.len() > rank {
                    let count = start + mask.len();
                    return Err(TensorError::TooManyIndices { rank, count });
                }
                let mismatch = mask
                    .iter()
                    .zip_eq(&shape[start..start + mask.len()])
                    .position(|(x, y)| x != y);
                if let Some(offset) = mismatch {
                    return Err(TensorError::MaskShape {
                        mask,
                        index,
                        shape,
                        dim: start + offset,
                    });
                }
                let nonzero = nonzero.ok_or(TensorError::DataDependent { op: OP, index })?;
                let numel = tensor.numel();
                if nonzero > numel {
                    return Err(TensorError::MaskCount {
                        index,
                        nonzero,
                        numel,
                    });
                }
                let coords = Shape::from([nonzero]);
                expanded.extend(std::iter::repeat_n(Some(coords), mask.len()));
            }
            r#type => return Err(TensorError::IndexType(r#type)),
        }
    }
    if expanded.len() > rank {
        let count = expanded.len();
        return Err(TensorError::TooManyIndices { rank, count });
    }

    let replacement = utils::broadcast_shapes(expanded.iter().flatten())?;
    expanded.resize(rank, None);

    let defined = expanded.iter().map(Option::is_some).collect_vec();
    let dims = match has_contiguous_subspace(defined.iter().copied()) {
        true => (0..rank).collect_vec(),
        false => {
            let (front, back): (Vec<_>, Vec<_>) = (0..rank).partition(|&dim| defined[dim]);
            log::trace!("{OP}: move indexed dims {front:?} to the front");
            front.into_iter().chain(back).collect()
        }
    };
    let layout = input.layout().permute(&dims);

    let mut before = vec![];
    let mut after = vec![];
    let mut replaced = false;
    for (&dim, &size) in dims.iter().zip(layout.shape().iter()) {
        match (defined[dim], replaced) {
            (true, _) => replaced = true,
            (false, false) => before.push(size),
            (false, true) => after.push(size),
        }
    }
    let shape = before
        .into_iter()
        .chain(replacement.iter().copied())
        .chain(after)
        .collect::<Shape>();
    Ok(input.new_empty(shape))
}

/// Repeats each index `i` of `repeats` `repeats[i]` times.
/// The result length depends on the content of `repeats`, so it must be given as `output_size`.
pub fn repeat_interleave(
    repeats: &TensorMeta,
    output_size: Option<usize>,
) -> Result<TensorMeta, TensorError> {
    let op = OpName::RepeatInterleave;
    let size = output_size.ok_or(TensorError::OutputSize { op })?;
    Ok(repeats.new_empty([size]))
}

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    use crate::loom::ops::Overload;

    builder
        .add_op(OpName::IndexSelect.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let index = args.take_tensor("index")?;
            let dim = args.int("dim")?;
            Ok(index_select(&input, dim, &index)?.into())
        })
        .add_op(OpName::IndexSelect.with(Overload::Out), |mut args| {
            let input = args.take_tensor("self")?;
            let index = args.take_tensor("index")?;
            let out = args.take_tensor("out")?;
            let dim = args.int("dim")?;
            Ok(index_select_out(&input, dim, &index, out)?.into())
        })
        .add_op(OpName::Index.with(Overload::Tensor), |mut args| {
            let input = args.take_tensor("self")?;
            let indices = args.take_indices("indices")?;
            Ok(index(&input, &indices)?.into())
        })
        .add_op(OpName::RepeatInterleave.with(Overload::Tensor), |mut args| {
            let op = OpName::RepeatInterleave;
            let repeats = args.take_tensor("repeats")?;
            let output_size = match args.get_int("output_size")? {
                Some(size) => {
                    let size = usize::try_from(size)
                        .map_err(|_| TensorError::NegativeSize { op, size })?;
                    Some(size)
                }
                None => None,
            };
            Ok(repeat_interleave(&repeats, output_size)?.into())
        })
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use half::f16;

    use super::{has_contiguous_subspace, index, index_select, index_select_out, repeat_interleave};
    use crate::loom::{
        device::Device,
        layout::{Layout, Shape},
        num::DataType,
        ops::OpName,
        tensor::{IndexMeta, TensorError, TensorMeta},
    };

    fn idx(shape: impl Into<Shape>) -> IndexMeta {
        let shape: Shape = shape.into();
        TensorMeta::empty::<i64>(Device::Meta, shape).into()
    }

    fn mask(shape: impl Into<Shape>, nonzero: usize) -> IndexMeta {
        let shape: Shape = shape.into();
        IndexMeta::mask(TensorMeta::empty::<bool>(Device::Meta, shape), nonzero)
    }

    #[test]
    fn test_index_select() -> Result<(), Box<dyn Error>> {
        fastrand::seed(42);
        for _ in 0..64 {
            let rank = fastrand::usize(1..5);
            let shape: Shape = (0..rank).map(|_| fastrand::usize(0..6)).collect();
            let input = TensorMeta::empty::<f32>(Device::Cpu, shape.clone());
            let index = TensorMeta::empty::<i64>(Device::Cpu, [fastrand::usize(0..10)]);

            let dim = fastrand::i64(-(rank as i64)..rank as i64);
            let output = index_select(&input, dim, &index)?;
            let dim = dim.rem_euclid(rank as i64) as usize;

            let mut expected = shape.to_vec();
            expected[dim] = index.numel();
            assert_eq!(output.shape(), Shape::from(expected));
            assert_eq!(output.data_type(), DataType::F32);
            assert_eq!(output.device(), Device::Cpu);
        }

        let input = TensorMeta::empty::<f32>(Device::Meta, Shape::default());
        let index = TensorMeta::empty::<i64>(Device::Meta, [7]);
        assert_eq!(index_select(&input, 5, &index)?.shape(), Shape::default());

        let input = TensorMeta::empty::<f32>(Device::Meta, [3, 4]);
        assert!(matches!(
            index_select(&input, 2, &index),
            Err(TensorError::DimRange { dim: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_index_select_out() -> Result<(), Box<dyn Error>> {
        let input = TensorMeta::empty::<f16>(Device::Gpu(0), [3, 4]);
        let index = TensorMeta::empty::<i64>(Device::Gpu(0), [2]);
        let out = TensorMeta::empty::<f16>(Device::Gpu(0), Layout::default());
        let id = out.id();

        let out = index_select_out(&input, -1, &index, out)?;
        assert_eq!(out.id(), id);
        assert_eq!(out.shape(), Shape::from([3, 2]));

        let out = TensorMeta::empty::<f16>(Device::Cpu, [3, 2]);
        assert!(matches!(
            index_select_out(&input, -1, &index, out),
            Err(TensorError::Device { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_contiguous_subspace() {
        assert!(has_contiguous_subspace([false, true, false]));
        assert!(has_contiguous_subspace([true, true, false, false]));
        assert!(has_contiguous_subspace([false, false]));
        assert!(!has_contiguous_subspace([true, false, true]));
        assert!(!has_contiguous_subspace([false, true, false, false, true]));
    }

    #[test]
    fn test_index_in_place() -> Result<(), Box<dyn Error>> {
        let input = TensorMeta::empty::<f32>(Device::Meta, [5, 6, 7]);

        let output = index(&input, &[IndexMeta::Full, idx([3]), IndexMeta::Full])?;
        assert_eq!(output.shape(), Shape::from([5, 3, 7]));
        assert_eq!(output.data_type(), DataType::F32);

        // trailing dims are padded with full slices
        let output = index(&input, &[IndexMeta::Full, idx([2, 1]), idx([4])])?;
        assert_eq!(output.shape(), Shape::from([5, 2, 4]));

        let output = index(&input, &[idx([2, 3])])?;
        assert_eq!(output.shape(), Shape::from([2, 3, 6, 7]));

        let output = index(&input, &[IndexMeta::Full])?;
        assert_eq!(output.shape(), input.shape());
        Ok(())
    }

    #[test]
    fn test_index_to_front() -> Result<(), Box<dyn Error>> {
        let input = TensorMeta::empty::<f32>(Device::Meta, [5, 6, 7]);
        let output = index(&input, &[idx([4]), IndexMeta::Full, idx([2, 1])])?;
        assert_eq!(output.shape(), Shape::from([2, 4, 6]));

        let input = TensorMeta::empty::<f32>(Device::Meta, [2, 3, 4, 5]);
        let output = index(
            &input,
            &[IndexMeta::Full, idx([8]), IndexMeta::Full, idx([8])],
        )?;
        assert_eq!(output.shape(), Shape::from([8, 2, 4]));
        Ok(())
    }

    #[test]
    fn test_index_mask() -> Result<(), Box<dyn Error>> {
        let input = TensorMeta::empty::<f32>(Device::Meta, [2, 3, 4]);

        let output = index(&input, &[mask([2, 3], 5)])?;
        assert_eq!(output.shape(), Shape::from([5, 4]));

        let output = index(&input, &[IndexMeta::Full, mask([3, 4], 7)])?;
        assert_eq!(output.shape(), Shape::from([2, 7]));

        let byte = TensorMeta::empty::<i8>(Device::Meta, [2]);
        let output = index(&input, &[IndexMeta::mask(byte, 1), IndexMeta::Full, idx([9])])?;
        assert_eq!(output.shape(), Shape::from([9, 3]));

        assert_eq!(
            index(&input, &[IndexMeta::Full, mask([3, 5], 1)]),
            Err(TensorError::MaskShape {
                mask: Shape::from([3, 5]),
                index: 1,
                shape: Shape::from([2, 3, 4]),
                dim: 2,
            })
        );

        assert_eq!(index(&input, &[mask([2, 3], 6)])?.shape(), Shape::from([6, 4]));
        assert_eq!(index(&input, &[mask([2, 3], 0)])?.shape(), Shape::from([0, 4]));
        assert_eq!(
            index(&input, &[IndexMeta::Full, mask([3], 10)]),
            Err(TensorError::MaskCount {
                index: 1,
                nonzero: 10,
                numel: 3,
            })
        );

        let unknown = TensorMeta::empty::<bool>(Device::Meta, [2, 3]);
        assert_eq!(
            index(&input, &[unknown.into()]),
            Err(TensorError::DataDependent {
                op: OpName::Index,
                index: 0
            })
        );
        Ok(())
    }

    #[test]
    fn test_index_errors() {
        let input = TensorMeta::empty::<f32>(Device::Meta, [2, 3, 4]);

        assert_eq!(index(&input, &[]), Err(TensorError::EmptyIndices));
        assert_eq!(
            index(&input, &[idx([1]), idx([1]), idx([1]), idx([1])]),
            Err(TensorError::TooManyIndices { rank: 3, count: 4 })
        );
        assert_eq!(
            index(&input, &[IndexMeta::Full, IndexMeta::Full, mask([4, 1], 1)]),
            Err(TensorError::TooManyIndices { rank: 3, count: 4 })
        );

        let float = TensorMeta::empty::<f32>(Device::Meta, [2]);
        assert_eq!(
            index(&input, &[float.into()]),
            Err(TensorError::IndexType(DataType::F32))
        );
        let int = TensorMeta::empty::<i32>(Device::Meta, [2]);
        assert_eq!(
            index(&input, &[int.into()]),
            Err(TensorError::IndexType(DataType::I32))
        );

        assert_eq!(
            index(&input, &[idx([3]), idx([4])]),
            Err(TensorError::Broadcast(Shape::from([3]), Shape::from([4])))
        );
    }

    #[test]
    fn test_repeat_interleave() -> Result<(), Box<dyn Error>> {
        let repeats = TensorMeta::empty::<i64>(Device::Cpu, [4]);
        let output = repeat_interleave(&repeats, Some(10))?;
        assert_eq!(output.shape(), Shape::from([10]));
        assert_eq!(output.data_type(), DataType::I64);

        fastrand::seed(42);
        for _ in 0..16 {
            let rank = fastrand::usize(0..4);
            let shape: Shape = (0..rank).map(|_| fastrand::usize(0..8)).collect();
            let repeats = TensorMeta::empty::<i64>(Device::Meta, shape);
            assert_eq!(
                repeat_interleave(&repeats, None),
                Err(TensorError::OutputSize {
                    op: OpName::RepeatInterleave
                })
            );
        }
        Ok(())
    }
}
