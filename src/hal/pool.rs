use crate::loom::{
    layout::Shape,
    ops::OpName,
    registry::RegistryBuilder,
    tensor::{Rank, TensorError, TensorMeta},
};

fn check_size(op: OpName, size: i64) -> Result<usize, TensorError> {
    usize::try_from(size).map_err(|_| TensorError::NegativeSize { op, size })
}

/// Size of a dimension after adding `before` and `after` entries to it.
fn padded_size(op: OpName, size: usize, before: i64, after: i64) -> Result<usize, TensorError> {
    let size = i64::try_from(size)
        .ok()
        .and_then(|size| size.checked_add(before))
        .and_then(|size| size.checked_add(after))
        .ok_or(TensorError::SizeOverflow { op })?;
    check_size(op, size)
}

/// Pads the last two dimensions by reflecting the input at its borders.
/// `padding` is `[left, right, top, bottom]`; negative values crop.
pub fn reflection_pad2d(input: &TensorMeta, padding: &[i64]) -> Result<TensorMeta, TensorError> {
    let op = OpName::ReflectionPad2d;
    let shape = input.shape();
    let valid = match shape.len() {
        3 => shape[1] != 0 && shape[2] != 0,
        4 => shape[1] != 0 && shape[2] != 0 && shape[3] != 0,
        _ => false,
    };
    if !valid {
        let layout = input.layout();
        return Err(TensorError::Input { op, layout });
    }
    let [left, right, top, bottom] = <[i64; 4]>::try_from(padding).map_err(|_| {
        let name = "padding";
        let expected = 4;
        let found = padding.len();
        TensorError::Length {
            op,
            name,
            expected,
            found,
        }
    })?;

    let len = shape.len();
    let height = padded_size(op, shape[len - 2], top, bottom)?;
    let width = padded_size(op, shape[len - 1], left, right)?;

    let mut shape = shape.to_vec();
    shape[len - 2] = height;
    shape[len - 1] = width;
    Ok(input.new_empty(shape))
}

fn adaptive_avg_pool(
    op: OpName,
    input: &TensorMeta,
    output_size: &[i64],
    dims: usize,
) -> Result<TensorMeta, TensorError> {
    let expected = Rank::Either(dims + 1, dims + 2);
    let found = input.dim();
    if !expected.contains(found) {
        return Err(TensorError::Rank {
            op,
            expected,
            found,
        });
    }
    if output_size.len() != dims {
        let name = "output_size";
        let expected = dims;
        let found = output_size.len();
        return Err(TensorError::Length {
            op,
            name,
            expected,
            found,
        });
    }
    let output_size = output_size
        .iter()
        .map(|&size| check_size(op, size))
        .collect::<Result<Vec<_>, _>>()?;

    let shape = input.shape();
    let shape = shape[..found - dims]
        .iter()
        .copied()
        .chain(output_size)
        .collect::<Shape>();
    Ok(input.new_empty(shape))
}

/// Average pooling to a fixed `[height, width]`, over a 3-D or batched 4-D input.
#[inline]
pub fn adaptive_avg_pool2d(
    input: &TensorMeta,
    output_size: &[i64],
) -> Result<TensorMeta, TensorError> {
    adaptive_avg_pool(OpName::AdaptiveAvgPool2d, input, output_size, 2)
}

/// Average pooling to a fixed `[depth, height, width]`, over a 4-D or batched 5-D input.
#[inline]
pub fn adaptive_avg_pool3d(
    input: &TensorMeta,
    output_size: &[i64],
) -> Result<TensorMeta, TensorError> {
    adaptive_avg_pool(OpName::AdaptiveAvgPool3d, input, output_size, 3)
}

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .add_op(OpName::ReflectionPad2d.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let padding = args.int_list("padding")?;
            Ok(reflection_pad2d(&input, &padding)?.into())
        })
        .add_op(OpName::AdaptiveAvgPool2d.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let output_size = args.int_list("output_size")?;
            Ok(adaptive_avg_pool2d(&input, &output_size)?.into())
        })
        .add_op(OpName::AdaptiveAvgPool3d.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let output_size = args.int_list("output_size")?;
            Ok(adaptive_avg_pool3d(&input, &output_size)?.into())
        })
}
