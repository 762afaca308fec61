use std::str::FromStr;

use derive_more::{Deref, Display, From, Into};
use rustc_hash::FxHashMap as HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tensor::{IndexMeta, TensorError, TensorMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OpName {
    #[display("index")]
    Index,
    #[display("index_select")]
    IndexSelect,
    #[display("repeat_interleave")]
    RepeatInterleave,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
    #[display("var_mean")]
    VarMean,
    #[display("dot")]
    Dot,
    #[display("inverse")]
    Inverse,
    #[display("linalg_eigh")]
    LinalgEigh,
    #[display("linalg_cholesky_ex")]
    LinalgCholeskyEx,
    #[display("reflection_pad2d")]
    ReflectionPad2d,
    #[display("_adaptive_avg_pool2d")]
    AdaptiveAvgPool2d,
    #[display("_adaptive_avg_pool3d")]
    AdaptiveAvgPool3d,
    #[display("bernoulli")]
    Bernoulli,
}

impl OpName {
    pub const ALL: [OpName; 14] = [
        OpName::Index,
        OpName::IndexSelect,
        OpName::RepeatInterleave,
        OpName::Max,
        OpName::Min,
        OpName::VarMean,
        OpName::Dot,
        OpName::Inverse,
        OpName::LinalgEigh,
        OpName::LinalgCholeskyEx,
        OpName::ReflectionPad2d,
        OpName::AdaptiveAvgPool2d,
        OpName::AdaptiveAvgPool3d,
        OpName::Bernoulli,
    ];

    #[inline]
    pub const fn with(self, overload: Overload) -> OpId {
        OpId {
            name: self,
            overload,
        }
    }
}

/// Selects one signature among the overloads of an op.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Overload {
    #[default]
    #[display("")]
    Default,
    /// Writes into caller-provided out tensors.
    #[display("out")]
    Out,
    #[display("Tensor")]
    Tensor,
    #[display("correction")]
    Correction,
    /// Out variant named after its first output.
    #[display("L")]
    L,
}

impl Overload {
    pub const ALL: [Overload; 5] = [
        Overload::Default,
        Overload::Out,
        Overload::Tensor,
        Overload::Correction,
        Overload::L,
    ];
}

/// Identifies an op together with its overload, e.g., `aten::index_select.out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpId {
    pub name: OpName,
    pub overload: Overload,
}

impl OpId {
    #[inline]
    pub const fn new(name: OpName, overload: Overload) -> Self {
        Self { name, overload }
    }
}

impl From<OpName> for OpId {
    #[inline]
    fn from(name: OpName) -> Self {
        name.with(Overload::Default)
    }
}

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.overload {
            Overload::Default => write!(f, "aten::{}", self.name),
            overload => write!(f, "aten::{}.{}", self.name, overload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown op `{0}`")]
pub struct ParseOpIdError(String);

impl FromStr for OpId {
    type Err = ParseOpIdError;

    /// Parses `name`, `name.overload`, optionally prefixed by the `aten::` namespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOpIdError(s.to_owned());
        let op = s.strip_prefix("aten::").unwrap_or(s);
        let (name, overload) = op.split_once('.').unwrap_or((op, ""));
        if overload.is_empty() && op.ends_with('.') {
            return Err(err());
        }
        let name = OpName::ALL
            .into_iter()
            .find(|x| x.to_string() == name)
            .ok_or_else(err)?;
        let overload = Overload::ALL
            .into_iter()
            .find(|x| x.to_string() == overload)
            .ok_or_else(err)?;
        Ok(name.with(overload))
    }
}

/// A named argument of a meta function.
#[derive(Debug, Clone, PartialEq, From)]
pub enum MetaValue {
    Tensor(TensorMeta),
    Indices(Vec<IndexMeta>),
    Int(i64),
    IntList(Vec<i64>),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl From<&str> for MetaValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

/// Arguments of a meta function call, keyed by parameter name.
/// An absent key stands for an argument left at `None`.
#[derive(Debug, Default, Clone)]
pub struct MetaArgs(HashMap<String, MetaValue>);

macro_rules! impl_get {
    ($get:ident, $variant:ident, $t:ty, $expected:literal) => {
        /// Reads an optional argument.
        pub fn $get(&self, name: &str) -> Result<Option<$t>, TensorError> {
            match self.0.get(name) {
                None => Ok(None),
                Some(MetaValue::$variant(value)) => Ok(Some(value.clone())),
                Some(_) => Err(TensorError::ArgumentType {
                    name: name.to_owned(),
                    expected: $expected,
                }),
            }
        }
    };
}

macro_rules! impl_take {
    ($take:ident, $variant:ident, $t:ty, $expected:literal) => {
        /// Moves a required argument out of the call.
        pub fn $take(&mut self, name: &str) -> Result<$t, TensorError> {
            match self.0.remove(name) {
                None => Err(TensorError::Argument(name.to_owned())),
                Some(MetaValue::$variant(value)) => Ok(value),
                Some(_) => Err(TensorError::ArgumentType {
                    name: name.to_owned(),
                    expected: $expected,
                }),
            }
        }
    };
}

impl MetaArgs {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, builder style.
    #[inline]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(name.into(), value.into());
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    impl_get!(get_int, Int, i64, "an integer");
    impl_get!(get_int_list, IntList, Vec<i64>, "a list of integers");
    impl_get!(get_float, Float, f64, "a float");
    impl_get!(get_bool, Bool, bool, "a boolean");
    impl_get!(get_str, Str, String, "a string");

    impl_take!(take_tensor, Tensor, TensorMeta, "a tensor");
    impl_take!(take_indices, Indices, Vec<IndexMeta>, "a list of indices");

    /// Reads a required integer.
    #[inline]
    pub fn int(&self, name: &str) -> Result<i64, TensorError> {
        self.get_int(name)?
            .ok_or_else(|| TensorError::Argument(name.to_owned()))
    }

    /// Reads a required list of integers.
    #[inline]
    pub fn int_list(&self, name: &str) -> Result<Vec<i64>, TensorError> {
        self.get_int_list(name)?
            .ok_or_else(|| TensorError::Argument(name.to_owned()))
    }
}

/// Descriptors produced by a meta function, in the order the op returns them.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref, From, Into)]
pub struct MetaOutput(Vec<TensorMeta>);

impl From<TensorMeta> for MetaOutput {
    #[inline]
    fn from(value: TensorMeta) -> Self {
        Self(vec![value])
    }
}

impl<const N: usize> From<[TensorMeta; N]> for MetaOutput {
    #[inline]
    fn from(value: [TensorMeta; N]) -> Self {
        Self(value.into())
    }
}

impl From<(TensorMeta, TensorMeta)> for MetaOutput {
    #[inline]
    fn from((x, y): (TensorMeta, TensorMeta)) -> Self {
        Self(vec![x, y])
    }
}

impl IntoIterator for MetaOutput {
    type Item = TensorMeta;
    type IntoIter = std::vec::IntoIter<TensorMeta>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
