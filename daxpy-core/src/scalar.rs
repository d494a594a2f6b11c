use bytemuck::Pod;
use derive_more::Display;
use dry::macro_for;
use num_traits::{Float, FromPrimitive, NumAssign};
use paste::paste;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Debug},
    str::FromStr,
};

mod sealed {
    #[doc(hidden)]
    pub trait Sealed {}

    macro_rules! impl_sealed {
        ($($t:ty),+) => {
            $(
                impl Sealed for $t {}
            )+
        };
    }

    impl_sealed!(f32, f64);
}
use sealed::Sealed;

/// Numerical types supported by the kernels.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Display)]
pub enum ScalarType {
    F32 = 1,
    F64 = 2,
}

impl ScalarType {
    fn iter() -> impl Iterator<Item = Self> {
        use ScalarType::*;
        [F32, F64].into_iter()
    }
    /// Size of the type in bytes.
    pub fn size(&self) -> usize {
        use ScalarType::*;
        match self {
            F32 => 4,
            F64 => 8,
        }
    }
    /// Name of the type.
    ///
    /// Lowercase, ie "f32", "f64".
    pub fn name(&self) -> &'static str {
        use ScalarType::*;
        match self {
            F32 => "f32",
            F64 => "f64",
        }
    }
    /// Name of the variant.
    ///
    /// Uppercase, ie "F32", "F64".
    pub fn as_str(&self) -> &'static str {
        use ScalarType::*;
        match self {
            F32 => "F32",
            F64 => "F64",
        }
    }
}

/// Returned when parsing an unknown [`ScalarType`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown ScalarType {0:?}, expected one of f32, f64")]
pub struct UnknownScalarType(String);

impl FromStr for ScalarType {
    type Err = UnknownScalarType;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|x| x.as_str() == input || x.name() == input)
            .ok_or_else(|| UnknownScalarType(input.to_string()))
    }
}

impl Serialize for ScalarType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScalarType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;

        struct ScalarTypeVisitor;

        impl Visitor<'_> for ScalarTypeVisitor {
            type Value = ScalarType;
            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "a scalar type")
            }
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                ScalarType::from_str(v).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(ScalarTypeVisitor)
    }
}

/// Base trait for floating point element types.
pub trait Scalar:
    Default
    + Copy
    + 'static
    + Send
    + Sync
    + Float
    + FromPrimitive
    + NumAssign
    + Pod
    + Debug
    + fmt::Display
    + Sealed
{
    /// The [`ScalarType`] of the scalar.
    fn scalar_type() -> ScalarType;
    /// Converts an index to the nearest representable value.
    fn from_index(index: usize) -> Self;
    /// Converts from `f64`, rounding to the nearest representable value.
    fn from_f64_lossy(x: f64) -> Self;
    /// Widens to `f64`.
    fn into_f64(self) -> f64;
}

macro_for!($X in [f32, f64] {
    paste! {
        impl Scalar for $X {
            fn scalar_type() -> ScalarType {
                ScalarType::[<$X:upper>]
            }
            fn from_index(index: usize) -> Self {
                index as $X
            }
            fn from_f64_lossy(x: f64) -> Self {
                x as $X
            }
            fn into_f64(self) -> f64 {
                self as f64
            }
        }
    }
});
