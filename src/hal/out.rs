use crate::loom::{device::Device, tensor::TensorError, tensor::TensorMeta};

/// Runs `f` and writes its results into caller-provided `outs`.
///
/// Every out tensor must live on `device`. On success each out is resized to the shape
/// and retyped to the type of its result, then handed back in place of the fresh results.
/// Nothing is written if `f` or any device check fails.
pub fn bind_out<const N: usize, F>(
    f: F,
    device: Device,
    mut outs: [TensorMeta; N],
) -> Result<[TensorMeta; N], TensorError>
where
    F: FnOnce() -> Result<[TensorMeta; N], TensorError>,
{
    let results = f()?;
    if let Some(out) = outs.iter().find(|out| out.device() != device) {
        let expected = device;
        let found = out.device();
        return Err(TensorError::Device { expected, found });
    }
    for (result, out) in results.iter().zip(outs.iter_mut()) {
        log::trace!("resize out {} to {}", out.layout(), result.shape());
        out.resize(result.shape());
        out.set_type(result.data_type());
    }
    Ok(outs)
}
