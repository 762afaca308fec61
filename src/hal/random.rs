use super::out::bind_out;
use crate::loom::{
    ops::{OpName, Overload},
    registry::RegistryBuilder,
    tensor::{TensorError, TensorMeta},
};

/// Draws a binary sample for every probability in `input`, writing into `out`.
///
/// `generator` stands in for a random generator handle as a plain seed. It only affects values,
/// so it is accepted and otherwise ignored.
pub fn bernoulli_out(
    input: &TensorMeta,
    generator: Option<i64>,
    out: TensorMeta,
) -> Result<TensorMeta, TensorError> {
    if let Some(generator) = generator {
        log::trace!("{}: generator {generator} is not used", OpName::Bernoulli);
    }
    let f = || Ok([input.empty_like()]);
    let [out] = bind_out(f, input.device(), [out])?;
    Ok(out)
}

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder.add_op(OpName::Bernoulli.with(Overload::Out), |mut args| {
        let input = args.take_tensor("self")?;
        let out = args.take_tensor("out")?;
        let generator = args.get_int("generator")?;
        Ok(bernoulli_out(&input, generator, out)?.into())
    })
}
