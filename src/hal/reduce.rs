use crate::loom::{
    layout::Shape,
    ops::{OpName, Overload},
    registry::RegistryBuilder,
    tensor::{TensorError, TensorMeta},
    utils,
};

/// Maximum over all elements. The result is a scalar.
#[inline]
pub fn max(input: &TensorMeta) -> TensorMeta {
    input.new_empty(Shape::default())
}

/// Minimum over all elements. The result is a scalar.
#[inline]
pub fn min(input: &TensorMeta) -> TensorMeta {
    input.new_empty(Shape::default())
}

/// Variance and mean over `dims`, returned as `(var, mean)`.
///
/// `correction` only affects values, never shapes. The variance of a complex input is real.
pub fn var_mean(
    input: &TensorMeta,
    dims: Option<&[i64]>,
    correction: Option<f64>,
    keepdim: bool,
) -> Result<(TensorMeta, TensorMeta), TensorError> {
    let dims = utils::reduction_dims(input.dim(), dims)?;
    let shape = utils::reduction_output_shape(&input.shape(), &dims, keepdim);
    log::trace!(
        "{}: reduce {dims:?} with correction {correction:?}",
        OpName::VarMean
    );
    let var = input.new_empty_with_type(shape.clone(), input.data_type().to_real());
    let mean = input.new_empty(shape);
    Ok((var, mean))
}

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .add_op(OpName::Max.into(), |mut args| {
            let input = args.take_tensor("self")?;
            Ok(max(&input).into())
        })
        .add_op(OpName::Min.into(), |mut args| {
            let input = args.take_tensor("self")?;
            Ok(min(&input).into())
        })
        .add_op(OpName::VarMean.with(Overload::Correction), |mut args| {
            let input = args.take_tensor("self")?;
            let dims = args.get_int_list("dim")?;
            let correction = args.get_float("correction")?;
            let keepdim = args.get_bool("keepdim")?.unwrap_or_default();
            Ok(var_mean(&input, dims.as_deref(), correction, keepdim)?.into())
        })
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{max, min, var_mean};
    use crate::loom::{
        device::Device,
        layout::Shape,
        num::DataType,
        tensor::{TensorError, TensorMeta},
    };

    #[test]
    fn test_max_min() {
        let input = TensorMeta::empty::<i32>(Device::Cpu, [2, 3, 4]);
        for output in [max(&input), min(&input)] {
            assert_eq!(output.shape(), Shape::default());
            assert_eq!(output.data_type(), DataType::I32);
            assert_eq!(output.device(), Device::Cpu);
            assert_ne!(output.id(), input.id());
        }
    }

    #[test]
    fn test_var_mean() -> Result<(), Box<dyn Error>> {
        let input = TensorMeta::new(Device::Meta, [2, 3, 4], DataType::ComplexFloat);

        let (var, mean) = var_mean(&input, Some(&[1][..]), Some(1.0), true)?;
        assert_eq!(var.shape(), Shape::from([2, 1, 4]));
        assert_eq!(mean.shape(), Shape::from([2, 1, 4]));
        assert_eq!(var.data_type(), DataType::F32);
        assert_eq!(mean.data_type(), DataType::ComplexFloat);

        let (var, mean) = var_mean(&input, Some(&[-1, 0][..]), None, false)?;
        assert_eq!(var.shape(), Shape::from([3]));
        assert_eq!(mean.shape(), Shape::from([3]));

        let (var, _) = var_mean(&input, None, None, false)?;
        assert_eq!(var.shape(), Shape::default());

        assert_eq!(
            var_mean(&input, Some(&[0, 2, -3][..]), None, false).err(),
            Some(TensorError::DuplicateDim(0))
        );
        Ok(())
    }

    #[test]
    fn test_var_mean_rank() -> Result<(), Box<dyn Error>> {
        fastrand::seed(42);
        for _ in 0..64 {
            let rank = fastrand::usize(1..6);
            let shape: Shape = (0..rank).map(|_| fastrand::usize(1..5)).collect();
            let input = TensorMeta::empty::<f32>(Device::Meta, shape);
            let dims = fastrand::choose_multiple(0..rank as i64, fastrand::usize(1..=rank));

            let (var, mean) = var_mean(&input, Some(dims.as_slice()), None, true)?;
            assert_eq!(var.dim(), rank);
            assert_eq!(mean.dim(), rank);

            let (var, mean) = var_mean(&input, Some(dims.as_slice()), None, false)?;
            assert_eq!(var.dim(), rank - dims.len());
            assert_eq!(mean.dim(), rank - dims.len());
            assert_eq!(var.data_type(), DataType::F32);
        }
        Ok(())
    }
}
