//! Matrix ops. Every matrix-shaped result is stored column-major,
//! which is what the LAPACK-style kernels behind these ops write.

use std::str::FromStr;

use derive_more::Display;

use super::out::bind_out;
use crate::loom::{
    layout::{Layout, Shape},
    num::DataType,
    ops::{OpName, Overload},
    registry::RegistryBuilder,
    tensor::{Rank, TensorError, TensorMeta},
};

/// Which triangle of a symmetric matrix a decomposition reads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Uplo {
    #[default]
    #[display("L")]
    Lower,
    #[display("U")]
    Upper,
}

impl FromStr for Uplo {
    type Err = TensorError;

    /// Accepts a single `L` or `U`, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" | "l" => Ok(Uplo::Lower),
            "U" | "u" => Ok(Uplo::Upper),
            _ => Err(TensorError::Uplo(s.to_owned())),
        }
    }
}

fn check_rank(op: OpName, input: &TensorMeta, expected: Rank) -> Result<(), TensorError> {
    match expected.contains(input.dim()) {
        true => Ok(()),
        false => Err(TensorError::Rank {
            op,
            expected,
            found: input.dim(),
        }),
    }
}

/// Checks that `input` is a batch of square matrices.
fn check_square(op: OpName, input: &TensorMeta) -> Result<(), TensorError> {
    check_rank(op, input, Rank::AtLeast(2))?;
    let rows = input.size(-2)?;
    let cols = input.size(-1)?;
    match rows == cols {
        true => Ok(()),
        false => Err(TensorError::Square { op, rows, cols }),
    }
}

/// Inner product of two vectors. The result is a scalar.
pub fn dot(input: &TensorMeta, tensor: &TensorMeta) -> Result<TensorMeta, TensorError> {
    let op = OpName::Dot;
    check_rank(op, input, Rank::Exactly(1))?;
    check_rank(op, tensor, Rank::Exactly(1))?;
    Ok(input.new_empty(Layout::default()))
}

/// Inverse of a batch of matrices.
///
/// An input with no elements yields a descriptor of the very same layout,
/// while any other input yields a column-major result.
pub fn inverse(input: &TensorMeta) -> Result<TensorMeta, TensorError> {
    if input.numel() == 0 {
        return Ok(input.empty_like());
    }
    check_rank(OpName::Inverse, input, Rank::AtLeast(2))?;
    Ok(input.new_empty(Layout::column_major(input.shape())))
}

/// Eigendecomposition of a batch of Hermitian matrices, returned as `(eigenvalues, eigenvectors)`.
///
/// Eigenvalues are real, one vector per matrix. Both outputs are stored column-major,
/// so a batch of eigenvalues has its last two strides swapped as well.
pub fn linalg_eigh(input: &TensorMeta, uplo: &str) -> Result<(TensorMeta, TensorMeta), TensorError> {
    let op = OpName::LinalgEigh;
    check_square(op, input)?;
    let uplo: Uplo = uplo.parse()?;
    log::trace!("{op}: read {uplo} triangle of {}", input.layout());

    let shape = input.shape();
    let values = Shape::from(&shape[..shape.len() - 1]);
    let values = Layout::column_major(values);
    let values = input.new_empty_with_type(values, input.data_type().to_real());
    let vectors = input.new_empty(Layout::column_major(shape));
    Ok((values, vectors))
}

/// Cholesky decomposition of a batch of matrices, returned as `(L, info)`.
///
/// `L` is stored column-major; `info` holds one `int32` status per matrix.
/// `upper` and `check_errors` only affect values.
pub fn linalg_cholesky_ex(
    input: &TensorMeta,
    upper: bool,
    check_errors: bool,
) -> Result<(TensorMeta, TensorMeta), TensorError> {
    let op = OpName::LinalgCholeskyEx;
    check_rank(op, input, Rank::AtLeast(2))?;
    let r#type = input.data_type();
    if !r#type.is_float() && !r#type.is_complex() {
        let expected = "float or complex";
        let found = r#type;
        return Err(TensorError::Type {
            op,
            expected,
            found,
        });
    }
    check_square(op, input)?;
    log::trace!("{op}: upper = {upper}, check_errors = {check_errors}");

    let shape = input.shape();
    let l = input.new_empty(Layout::column_major(shape.clone()));
    let info = Shape::from(&shape[..shape.len() - 2]);
    let info = input.new_empty_with_type(info, DataType::I32);
    Ok((l, info))
}

pub fn linalg_cholesky_ex_out(
    input: &TensorMeta,
    upper: bool,
    check_errors: bool,
    l: TensorMeta,
    info: TensorMeta,
) -> Result<(TensorMeta, TensorMeta), TensorError> {
    let f = || {
        let (l, info) = linalg_cholesky_ex(input, upper, check_errors)?;
        Ok([l, info])
    };
    let [l, info] = bind_out(f, input.device(), [l, info])?;
    Ok((l, info))
}

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .add_op(OpName::Dot.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let tensor = args.take_tensor("tensor")?;
            Ok(dot(&input, &tensor)?.into())
        })
        .add_op(OpName::Inverse.into(), |mut args| {
            let input = args.take_tensor("self")?;
            Ok(inverse(&input)?.into())
        })
        .add_op(OpName::LinalgEigh.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let uplo = args.get_str("uplo")?.unwrap_or_else(|| Uplo::default().to_string());
            Ok(linalg_eigh(&input, &uplo)?.into())
        })
        .add_op(OpName::LinalgCholeskyEx.into(), |mut args| {
            let input = args.take_tensor("self")?;
            let upper = args.get_bool("upper")?.unwrap_or_default();
            let check_errors = args.get_bool("check_errors")?.unwrap_or_default();
            Ok(linalg_cholesky_ex(&input, upper, check_errors)?.into())
        })
        .add_op(OpName::LinalgCholeskyEx.with(Overload::L), |mut args| {
            let input = args.take_tensor("self")?;
            let l = args.take_tensor("L")?;
            let info = args.take_tensor("info")?;
            let upper = args.get_bool("upper")?.unwrap_or_default();
            let check_errors = args.get_bool("check_errors")?.unwrap_or_default();
            Ok(linalg_cholesky_ex_out(&input, upper, check_errors, l, info)?.into())
        })
}
