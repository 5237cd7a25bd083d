//! Variable descriptors: the rows of the metadata catalog.

use std::fmt;

use crate::id::GridId;
use crate::value::ValueType;

/// Direction in which a variable is exchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarRole {
    /// Set by the orchestrator (`set_value`); may also be read back.
    Input,
    /// Produced by the engine; `set_value` is rejected.
    Output,
}

impl fmt::Display for VarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Where on its grid a variable's values live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// One value per grid node (or rectilinear cell).
    Node,
    /// One value per mesh face.
    Face,
    /// A single value with no spatial extent.
    Scalar,
}

impl Location {
    /// The BMI location name reported by `get_var_location`.
    pub fn bmi_name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Face => "face",
            Self::Scalar => "none",
        }
    }
}

/// How `set_value` combines caller data with engine storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WritePolicy {
    /// Overwrite the stored values.
    Replace,
    /// Add the caller's values to the stored values.
    ///
    /// Used for source terms fed by several couplers within one step,
    /// e.g. a precipitation forcing.
    Accumulate,
}

/// What backs a variable's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A state array owned by the wrapped engine.
    Engine,
    /// The adapter-owned communicator handle, settable before initialize.
    Communicator,
}

/// An exchangeable variable.
///
/// Names follow the CSDMS standard-name vocabulary and are unique within
/// a component. The descriptor is immutable once the catalog is built.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDef {
    /// Externally visible name.
    pub name: String,
    /// Exchange direction.
    pub role: VarRole,
    /// Element type seen by callers.
    pub value_type: ValueType,
    /// Unit string, e.g. `"m3 s-1"`.
    pub units: String,
    /// Grid the values are indexed against.
    pub grid: GridId,
    /// Placement on the grid.
    pub location: Location,
    /// Write combination rule.
    pub policy: WritePolicy,
    /// Storage owner.
    pub binding: Binding,
}

impl VariableDef {
    /// An engine-backed output on grid nodes.
    pub fn output(name: &str, value_type: ValueType, units: &str, grid: GridId) -> Self {
        Self {
            name: name.to_string(),
            role: VarRole::Output,
            value_type,
            units: units.to_string(),
            grid,
            location: Location::Node,
            policy: WritePolicy::Replace,
            binding: Binding::Engine,
        }
    }

    /// An engine-backed input on grid nodes with [`WritePolicy::Replace`].
    pub fn input(name: &str, value_type: ValueType, units: &str, grid: GridId) -> Self {
        Self {
            role: VarRole::Input,
            ..Self::output(name, value_type, units, grid)
        }
    }

    /// The scalar communicator handle variable.
    pub fn communicator(name: &str, grid: GridId) -> Self {
        Self {
            location: Location::Scalar,
            binding: Binding::Communicator,
            ..Self::input(name, ValueType::Int32, "1", grid)
        }
    }

    /// Switch to [`WritePolicy::Accumulate`].
    pub fn accumulating(mut self) -> Self {
        self.policy = WritePolicy::Accumulate;
        self
    }

    /// Override the grid location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        self.value_type.itemsize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles_and_policies() {
        let q = VariableDef::output(
            "channel_water__volume_flow_rate",
            ValueType::Float64,
            "m3 s-1",
            GridId(2),
        );
        assert_eq!(q.role, VarRole::Output);
        assert_eq!(q.policy, WritePolicy::Replace);
        assert_eq!(q.binding, Binding::Engine);

        let rain = VariableDef::input(
            "atmosphere_water__precipitation_leq-volume_flux",
            ValueType::Float64,
            "mm s-1",
            GridId(0),
        )
        .accumulating();
        assert_eq!(rain.role, VarRole::Input);
        assert_eq!(rain.policy, WritePolicy::Accumulate);

        let comm = VariableDef::communicator("bmi_mpi_comm_handle", GridId(4));
        assert_eq!(comm.value_type, ValueType::Int32);
        assert_eq!(comm.location, Location::Scalar);
        assert_eq!(comm.binding, Binding::Communicator);
        assert_eq!(comm.itemsize(), 4);
    }

    #[test]
    fn location_names() {
        assert_eq!(Location::Node.bmi_name(), "node");
        assert_eq!(Location::Face.bmi_name(), "face");
        assert_eq!(Location::Scalar.bmi_name(), "none");
    }
}
