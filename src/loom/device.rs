use derive_more::Display;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the data of a tensor would live. Descriptors never own storage, so this is only a tag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Device {
    /// Placeholder device of tensors that never carry data.
    #[default]
    #[display("meta")]
    Meta,
    #[display("cpu")]
    Cpu,
    #[display("gpu:{_0}")]
    Gpu(usize),
}
