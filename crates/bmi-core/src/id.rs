//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a grid within a component instance.
///
/// Grid ids are chosen by the wrapped engine and are not required to be
/// contiguous. The value crosses the FFI boundary as a C `int`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub i32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for GridId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Fortran handle of a message-passing communicator.
///
/// This is the integer form (`MPI_Comm_c2f`) that orchestrators such as
/// mpi4py hand across language boundaries. The adapter never interprets
/// it; it is forwarded verbatim to the engine at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Communicator(pub i32);

impl Communicator {
    /// Reported for the communicator variable when no communicator has
    /// been set and the runtime supplied none (serial sessions).
    pub const NONE: Communicator = Communicator(-1);
}

impl fmt::Display for Communicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comm#{}", self.0)
    }
}

impl From<i32> for Communicator {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
