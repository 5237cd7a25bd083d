//! Error types for grid construction and catalog queries.

use std::error::Error;
use std::fmt;

use bmi_core::GridId;

/// A grid query that only some topologies answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridCapability {
    /// `get_grid_shape`.
    Shape,
    /// `get_grid_spacing`.
    Spacing,
    /// `get_grid_origin`.
    Origin,
    /// `get_grid_x`.
    X,
    /// `get_grid_y`.
    Y,
    /// `get_grid_z`.
    Z,
    /// `get_grid_node_count`.
    NodeCount,
    /// `get_grid_edge_count`.
    EdgeCount,
    /// `get_grid_face_count`.
    FaceCount,
    /// `get_grid_edge_nodes`.
    EdgeNodes,
    /// `get_grid_face_nodes`.
    FaceNodes,
    /// `get_grid_nodes_per_face`.
    NodesPerFace,
}

impl fmt::Display for GridCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape => "shape",
            Self::Spacing => "spacing",
            Self::Origin => "origin",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::NodeCount => "node_count",
            Self::EdgeCount => "edge_count",
            Self::FaceCount => "face_count",
            Self::EdgeNodes => "edge_nodes",
            Self::FaceNodes => "face_nodes",
            Self::NodesPerFace => "nodes_per_face",
        };
        f.write_str(name)
    }
}

/// Invalid grid description.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// Rectilinear rank outside `1..=3`.
    RankOutOfRange {
        /// The requested rank.
        rank: usize,
    },
    /// Two per-axis or per-node arrays disagree in length.
    LengthMismatch {
        /// Which array.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A rectilinear axis has extent zero.
    EmptyAxis {
        /// The empty axis.
        axis: usize,
    },
    /// Rectilinear spacing is not finite and positive.
    InvalidSpacing {
        /// The offending axis.
        axis: usize,
        /// The offending value.
        value: f64,
    },
    /// A point set or mesh with no nodes.
    EmptyPointSet,
    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate {
        /// Which coordinate array.
        what: &'static str,
        /// Index within that array.
        index: usize,
    },
    /// Connectivity references a node that does not exist.
    NodeIndexOutOfRange {
        /// Which connectivity array.
        what: &'static str,
        /// The offending index.
        index: i32,
        /// Number of nodes.
        node_count: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankOutOfRange { rank } => write!(f, "rank {rank} not in 1..=3"),
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} entries, expected {expected}"),
            Self::EmptyAxis { axis } => write!(f, "axis {axis} has extent zero"),
            Self::InvalidSpacing { axis, value } => {
                write!(f, "spacing {value} on axis {axis} must be finite and positive")
            }
            Self::EmptyPointSet => write!(f, "grid has no nodes"),
            Self::NonFiniteCoordinate { what, index } => write!(f, "{what}[{index}] is not finite"),
            Self::NodeIndexOutOfRange {
                what,
                index,
                node_count,
            } => write!(f, "{what} references node {index} but grid has {node_count}"),
        }
    }
}

impl Error for GridError {}

/// Errors from catalog construction and queries.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogError {
    /// Two variables share a name.
    DuplicateVariable {
        /// The shared name.
        name: String,
    },
    /// A variable descriptor breaks a catalog rule.
    InvalidVariable {
        /// The variable.
        name: String,
        /// The broken rule.
        reason: String,
    },
    /// No variable has this name.
    UnknownVariable {
        /// The requested name.
        name: String,
    },
    /// No grid has this id.
    UnknownGrid {
        /// The requested id.
        grid: GridId,
    },
    /// Two grids share an id.
    DuplicateGrid {
        /// The shared id.
        grid: GridId,
    },
    /// A variable refers to a grid the engine did not report.
    MissingGrid {
        /// The variable.
        name: String,
        /// Its grid id.
        grid: GridId,
    },
    /// Grid metadata is not known until the engine is initialized.
    GridsNotReady,
    /// Grids were already installed for this session.
    GridsAlreadyInstalled,
    /// The query does not apply to this grid's topology.
    GridCapabilityUnsupported {
        /// The grid queried.
        grid: GridId,
        /// The inapplicable query.
        capability: GridCapability,
    },
    /// A grid description failed validation.
    InvalidGrid {
        /// The grid.
        grid: GridId,
        /// What was wrong.
        source: GridError,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateVariable { name } => write!(f, "duplicate variable '{name}'"),
            Self::InvalidVariable { name, reason } => {
                write!(f, "invalid variable '{name}': {reason}")
            }
            Self::UnknownVariable { name } => write!(f, "unknown variable '{name}'"),
            Self::UnknownGrid { grid } => write!(f, "unknown grid {grid}"),
            Self::DuplicateGrid { grid } => write!(f, "duplicate grid {grid}"),
            Self::MissingGrid { name, grid } => {
                write!(f, "variable '{name}' refers to missing grid {grid}")
            }
            Self::GridsNotReady => write!(f, "grid metadata unavailable before initialize"),
            Self::GridsAlreadyInstalled => write!(f, "grids already installed"),
            Self::GridCapabilityUnsupported { grid, capability } => {
                write!(f, "grid {grid} does not support {capability}")
            }
            Self::InvalidGrid { grid, source } => write!(f, "invalid grid {grid}: {source}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGrid { source, .. } => Some(source),
            _ => None,
        }
    }
}
