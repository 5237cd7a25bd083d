//! Core types for the BMI coupling adapter.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the catalog, the wrapped engine and the
//! adapter: identifiers, exchangeable value types, variable descriptors,
//! native array layouts, the initialization descriptor and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod forcing;
pub mod id;
pub mod layout;
pub mod native;
pub mod value;
pub mod variable;

pub use config::{ConfigError, ConfigSource, ConfigValue, InitConfig};
pub use error::{EngineError, LayoutError};
pub use forcing::ForcingPair;
pub use id::{Communicator, GridId};
pub use layout::Layout;
pub use native::{NativeArray, NativeArrayMut, NativeData, NativeDataMut};
pub use value::{Element, ValueSlice, ValueSliceMut, ValueType};
pub use variable::{Binding, Location, VarRole, VariableDef, WritePolicy};
