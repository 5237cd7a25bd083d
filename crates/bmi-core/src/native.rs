//! Borrowed views of engine-owned state arrays.
//!
//! The engine lends these to the adapter for the duration of a single
//! `get_value`/`set_value` call. Construction validates the layout against
//! the backing slice so that marshaling can index without further checks.

use crate::error::LayoutError;
use crate::layout::Layout;
use crate::value::ValueType;

/// Shared native storage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeData<'a> {
    /// `int` storage.
    Int32(&'a [i32]),
    /// Single-precision storage (Fortran `REAL`).
    Float32(&'a [f32]),
    /// Double-precision storage.
    Float64(&'a [f64]),
}

/// Mutable native storage.
#[derive(Debug, PartialEq)]
pub enum NativeDataMut<'a> {
    /// `int` storage.
    Int32(&'a mut [i32]),
    /// Single-precision storage.
    Float32(&'a mut [f32]),
    /// Double-precision storage.
    Float64(&'a mut [f64]),
}

impl NativeData<'_> {
    /// Element type of the storage.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
        }
    }

    /// Backing buffer length in elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Whether the backing buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NativeDataMut<'_> {
    /// Element type of the storage.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
        }
    }

    /// Backing buffer length in elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Whether the backing buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A read-only native array: storage plus the layout that flattens it.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeArray<'a> {
    data: NativeData<'a>,
    layout: Layout,
}

impl<'a> NativeArray<'a> {
    /// Pair `data` with `layout`, checking every element is in bounds.
    pub fn new(data: NativeData<'a>, layout: Layout) -> Result<Self, LayoutError> {
        layout.check_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// The whole buffer as a flat contiguous array.
    pub fn contiguous(data: NativeData<'a>) -> Self {
        let layout = Layout::contiguous(data.len());
        Self { data, layout }
    }

    /// Backing storage.
    pub fn data(&self) -> NativeData<'a> {
        self.data
    }

    /// Flattening layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Element type of the storage.
    pub fn value_type(&self) -> ValueType {
        self.data.value_type()
    }

    /// Number of canonical elements.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Whether the view addresses no elements.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}

/// A writable native array.
#[derive(Debug, PartialEq)]
pub struct NativeArrayMut<'a> {
    data: NativeDataMut<'a>,
    layout: Layout,
}

impl<'a> NativeArrayMut<'a> {
    /// Pair `data` with `layout`, checking every element is in bounds.
    ///
    /// The layout must not address any element twice; the marshaling
    /// layer writes elements independently.
    pub fn new(data: NativeDataMut<'a>, layout: Layout) -> Result<Self, LayoutError> {
        layout.check_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// The whole buffer as a flat contiguous array.
    pub fn contiguous(data: NativeDataMut<'a>) -> Self {
        let layout = Layout::contiguous(data.len());
        Self { data, layout }
    }

    /// Split into storage and layout for element-wise writes.
    pub fn parts(&mut self) -> (&mut NativeDataMut<'a>, &Layout) {
        (&mut self.data, &self.layout)
    }

    /// Flattening layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Element type of the storage.
    pub fn value_type(&self) -> ValueType {
        self.data.value_type()
    }

    /// Number of canonical elements.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Whether the view addresses no elements.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}
