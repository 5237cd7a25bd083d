//! Validated grid descriptors.

use bmi_core::GridId;

use crate::error::{CatalogError, GridCapability, GridError};
use crate::topology::{validate_coordinates, GridKind, Mesh, Topology};

/// A grid a variable's values are indexed against.
///
/// Built through the topology-specific constructors, which enforce the
/// invariants of each topology. Immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    id: GridId,
    rank: usize,
    size: usize,
    topology: Topology,
}

impl Grid {
    /// A single-value grid: size 1, rank 1.
    pub fn scalar(id: GridId) -> Self {
        Self {
            id,
            rank: 1,
            size: 1,
            topology: Topology::Scalar,
        }
    }

    /// A regular lattice. `shape`, `spacing` and `origin` list the slowest
    /// varying axis first and must all have `rank` entries.
    pub fn uniform_rectilinear(
        id: GridId,
        shape: &[usize],
        spacing: &[f64],
        origin: &[f64],
    ) -> Result<Self, CatalogError> {
        let invalid = |source| CatalogError::InvalidGrid { grid: id, source };
        let rank = shape.len();
        if !(1..=3).contains(&rank) {
            return Err(invalid(GridError::RankOutOfRange { rank }));
        }
        for (what, len) in [("spacing", spacing.len()), ("origin", origin.len())] {
            if len != rank {
                return Err(invalid(GridError::LengthMismatch {
                    what,
                    expected: rank,
                    actual: len,
                }));
            }
        }
        if let Some(axis) = shape.iter().position(|&n| n == 0) {
            return Err(invalid(GridError::EmptyAxis { axis }));
        }
        if let Some(axis) = spacing.iter().position(|&d| !(d.is_finite() && d > 0.0)) {
            return Err(invalid(GridError::InvalidSpacing {
                axis,
                value: spacing[axis],
            }));
        }
        if let Some(index) = origin.iter().position(|v| !v.is_finite()) {
            return Err(invalid(GridError::NonFiniteCoordinate {
                what: "origin",
                index,
            }));
        }
        Ok(Self {
            id,
            rank,
            size: shape.iter().product(),
            topology: Topology::UniformRectilinear {
                shape: shape.into(),
                spacing: spacing.into(),
                origin: origin.into(),
            },
        })
    }

    /// Unconnected points. Rank is 2, or 3 when `z` is given.
    pub fn points(
        id: GridId,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Option<Vec<f64>>,
    ) -> Result<Self, CatalogError> {
        validate_coordinates(&x, &y, z.as_deref())
            .map_err(|source| CatalogError::InvalidGrid { grid: id, source })?;
        Ok(Self {
            id,
            rank: if z.is_some() { 3 } else { 2 },
            size: x.len(),
            topology: Topology::Points { x, y, z },
        })
    }

    /// An unstructured mesh. Size is the node count.
    pub fn unstructured(id: GridId, mesh: Mesh) -> Result<Self, CatalogError> {
        mesh.validate()
            .map_err(|source| CatalogError::InvalidGrid { grid: id, source })?;
        Ok(Self {
            id,
            rank: if mesh.z.is_some() { 3 } else { 2 },
            size: mesh.node_count(),
            topology: Topology::UnstructuredMesh(mesh),
        })
    }

    /// Grid id.
    pub fn id(&self) -> GridId {
        self.id
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Total addressable elements.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Topology discriminant.
    pub fn kind(&self) -> GridKind {
        self.topology.kind()
    }

    /// Topology-specific data.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Nodes per axis (rectilinear only).
    pub fn shape(&self) -> Result<&[usize], CatalogError> {
        match &self.topology {
            Topology::UniformRectilinear { shape, .. } => Ok(shape),
            _ => Err(self.unsupported(GridCapability::Shape)),
        }
    }

    /// Node spacing per axis (rectilinear only).
    pub fn spacing(&self) -> Result<&[f64], CatalogError> {
        match &self.topology {
            Topology::UniformRectilinear { spacing, .. } => Ok(spacing),
            _ => Err(self.unsupported(GridCapability::Spacing)),
        }
    }

    /// First-node coordinates per axis (rectilinear only).
    pub fn origin(&self) -> Result<&[f64], CatalogError> {
        match &self.topology {
            Topology::UniformRectilinear { origin, .. } => Ok(origin),
            _ => Err(self.unsupported(GridCapability::Origin)),
        }
    }

    /// Node x coordinates (points and meshes).
    pub fn x(&self) -> Result<&[f64], CatalogError> {
        match &self.topology {
            Topology::Points { x, .. } => Ok(x),
            Topology::UnstructuredMesh(mesh) => Ok(&mesh.x),
            _ => Err(self.unsupported(GridCapability::X)),
        }
    }

    /// Node y coordinates (points and meshes).
    pub fn y(&self) -> Result<&[f64], CatalogError> {
        match &self.topology {
            Topology::Points { y, .. } => Ok(y),
            Topology::UnstructuredMesh(mesh) => Ok(&mesh.y),
            _ => Err(self.unsupported(GridCapability::Y)),
        }
    }

    /// Node z coordinates (points and meshes that carry them).
    pub fn z(&self) -> Result<&[f64], CatalogError> {
        let z = match &self.topology {
            Topology::Points { z, .. } => z.as_deref(),
            Topology::UnstructuredMesh(mesh) => mesh.z.as_deref(),
            _ => None,
        };
        z.ok_or_else(|| self.unsupported(GridCapability::Z))
    }

    /// Node count (meshes only).
    pub fn node_count(&self) -> Result<usize, CatalogError> {
        self.mesh(GridCapability::NodeCount).map(Mesh::node_count)
    }

    /// Edge count (meshes only). Zero is a valid answer.
    pub fn edge_count(&self) -> Result<usize, CatalogError> {
        self.mesh(GridCapability::EdgeCount).map(Mesh::edge_count)
    }

    /// Face count (meshes only). Zero is a valid answer.
    pub fn face_count(&self) -> Result<usize, CatalogError> {
        self.mesh(GridCapability::FaceCount).map(Mesh::face_count)
    }

    /// Edge connectivity (meshes only).
    pub fn edge_nodes(&self) -> Result<&[i32], CatalogError> {
        self.mesh(GridCapability::EdgeNodes)
            .map(|m| m.edge_nodes.as_slice())
    }

    /// Face connectivity (meshes only).
    pub fn face_nodes(&self) -> Result<&[i32], CatalogError> {
        self.mesh(GridCapability::FaceNodes)
            .map(|m| m.face_nodes.as_slice())
    }

    /// Nodes per face (meshes only).
    pub fn nodes_per_face(&self) -> Result<&[i32], CatalogError> {
        self.mesh(GridCapability::NodesPerFace)
            .map(|m| m.nodes_per_face.as_slice())
    }

    fn mesh(&self, capability: GridCapability) -> Result<&Mesh, CatalogError> {
        match &self.topology {
            Topology::UnstructuredMesh(mesh) => Ok(mesh),
            _ => Err(self.unsupported(capability)),
        }
    }

    fn unsupported(&self, capability: GridCapability) -> CatalogError {
        CatalogError::GridCapabilityUnsupported {
            grid: self.id,
            capability,
        }
    }
}
