//! Exchangeable value types and borrowed typed buffers.
//!
//! Callers hand the adapter flat buffers of one of three element types.
//! [`ValueSlice`] and [`ValueSliceMut`] carry such a buffer together with
//! its type so that the marshaling layer can check it against the catalog
//! before any data moves.

use std::fmt;

/// Element type of an exchangeable variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit signed integer (C `int`).
    Int32,
    /// 32-bit IEEE float (C `float`).
    Float32,
    /// 64-bit IEEE float (C `double`).
    Float64,
}

impl ValueType {
    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// The BMI type name reported by `get_var_type`.
    pub fn bmi_name(self) -> &'static str {
        match self {
            Self::Int32 => "int",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bmi_name())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A Rust scalar that maps onto one [`ValueType`].
///
/// Sealed: implemented for `i32`, `f32` and `f64` only.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + sealed::Sealed + 'static {
    /// The exchangeable type this scalar represents.
    const VALUE_TYPE: ValueType;

    /// Wrap a shared slice of this type.
    fn slice(values: &[Self]) -> ValueSlice<'_>;

    /// Wrap a mutable slice of this type.
    fn slice_mut(values: &mut [Self]) -> ValueSliceMut<'_>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn slice(values: &[Self]) -> ValueSlice<'_> {
                ValueSlice::$variant(values)
            }

            fn slice_mut(values: &mut [Self]) -> ValueSliceMut<'_> {
                ValueSliceMut::$variant(values)
            }
        }

        impl<'a> From<&'a [$t]> for ValueSlice<'a> {
            fn from(values: &'a [$t]) -> Self {
                ValueSlice::$variant(values)
            }
        }

        impl<'a> From<&'a mut [$t]> for ValueSliceMut<'a> {
            fn from(values: &'a mut [$t]) -> Self {
                ValueSliceMut::$variant(values)
            }
        }
    };
}

impl_element!(i32, Int32);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

/// A caller-owned source buffer, borrowed for one `set_value` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueSlice<'a> {
    /// `int` elements.
    Int32(&'a [i32]),
    /// `float` elements.
    Float32(&'a [f32]),
    /// `double` elements.
    Float64(&'a [f64]),
}

impl ValueSlice<'_> {
    /// Element type of the buffer.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A caller-owned destination buffer, borrowed for one `get_value` call.
#[derive(Debug, PartialEq)]
pub enum ValueSliceMut<'a> {
    /// `int` elements.
    Int32(&'a mut [i32]),
    /// `float` elements.
    Float32(&'a mut [f32]),
    /// `double` elements.
    Float64(&'a mut [f64]),
}

impl ValueSliceMut<'_> {
    /// Element type of the buffer.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reborrow with a shorter lifetime.
    pub fn reborrow(&mut self) -> ValueSliceMut<'_> {
        match self {
            Self::Int32(v) => ValueSliceMut::Int32(v),
            Self::Float32(v) => ValueSliceMut::Float32(v),
            Self::Float64(v) => ValueSliceMut::Float64(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itemsizes_match_c_types() {
        assert_eq!(ValueType::Int32.itemsize(), std::mem::size_of::<i32>());
        assert_eq!(ValueType::Float32.itemsize(), std::mem::size_of::<f32>());
        assert_eq!(ValueType::Float64.itemsize(), std::mem::size_of::<f64>());
    }

    #[test]
    fn bmi_names() {
        assert_eq!(ValueType::Int32.to_string(), "int");
        assert_eq!(ValueType::Float32.to_string(), "float");
        assert_eq!(ValueType::Float64.to_string(), "double");
    }

    #[test]
    fn element_wrapping_preserves_type() {
        let ints = [1i32, 2, 3];
        let slice = i32::slice(&ints);
        assert_eq!(slice.value_type(), ValueType::Int32);
        assert_eq!(slice.len(), 3);

        let mut doubles = [0.0f64; 2];
        let mut dest = f64::slice_mut(&mut doubles);
        assert_eq!(dest.value_type(), ValueType::Float64);
        assert_eq!(dest.reborrow().len(), 2);
        assert!(!dest.is_empty());
    }
}
