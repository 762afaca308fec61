use derive_more::Display;
use half::{bf16, f16};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    #[display("bool")]
    Bool,
    #[display("uint8")]
    U8,
    #[display("int8")]
    I8,
    #[display("int16")]
    I16,
    #[display("int32")]
    I32,
    #[display("int64")]
    I64,
    #[display("float16")]
    F16,
    #[display("bfloat16")]
    BF16,
    #[display("float32")]
    F32,
    #[display("float64")]
    F64,
    #[display("complex32")]
    ComplexHalf,
    #[display("complex64")]
    ComplexFloat,
    #[display("complex128")]
    ComplexDouble,
}

impl DataType {
    /// Returns the size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            DataType::Bool => 1,
            DataType::U8 => 1,
            DataType::I8 => 1,
            DataType::I16 => 2,
            DataType::I32 => 4,
            DataType::I64 => 8,
            DataType::F16 => 2,
            DataType::BF16 => 2,
            DataType::F32 => 4,
            DataType::F64 => 8,
            DataType::ComplexHalf => 4,
            DataType::ComplexFloat => 8,
            DataType::ComplexDouble => 16,
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            DataType::F16 | DataType::BF16 | DataType::F32 | DataType::F64
        )
    }

    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            DataType::ComplexHalf | DataType::ComplexFloat | DataType::ComplexDouble
        )
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::U8 | DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64
        )
    }

    /// Maps a complex type to the real type of the same precision. Other types are returned as is.
    pub const fn to_real(self) -> Self {
        match self {
            DataType::ComplexHalf => DataType::F16,
            DataType::ComplexFloat => DataType::F32,
            DataType::ComplexDouble => DataType::F64,
            other => other,
        }
    }
}

/// Rust types that have a tensor [`DataType`] counterpart.
pub trait Scalar: Sized + Send + Sync + sealed::Sealed {
    const DATA_TYPE: DataType;
}

impl Scalar for bool {
    const DATA_TYPE: DataType = DataType::Bool;
}

impl Scalar for u8 {
    const DATA_TYPE: DataType = DataType::U8;
}

impl Scalar for i8 {
    const DATA_TYPE: DataType = DataType::I8;
}

impl Scalar for i16 {
    const DATA_TYPE: DataType = DataType::I16;
}

impl Scalar for i32 {
    const DATA_TYPE: DataType = DataType::I32;
}

impl Scalar for i64 {
    const DATA_TYPE: DataType = DataType::I64;
}

impl Scalar for f16 {
    const DATA_TYPE: DataType = DataType::F16;
}

impl Scalar for bf16 {
    const DATA_TYPE: DataType = DataType::BF16;
}

impl Scalar for f32 {
    const DATA_TYPE: DataType = DataType::F32;
}

impl Scalar for f64 {
    const DATA_TYPE: DataType = DataType::F64;
}

mod sealed {
    use half::{bf16, f16};

    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for u8 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f16 {}
    impl Sealed for bf16 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
