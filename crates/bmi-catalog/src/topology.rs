//! Grid topologies: the tagged union behind every [`Grid`](crate::Grid).

use smallvec::SmallVec;

use crate::error::GridError;

/// Topology discriminant, as reported by `get_grid_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridKind {
    /// A single value.
    Scalar,
    /// Unconnected points with explicit coordinates.
    Points,
    /// Nodes with explicit coordinates plus edge/face connectivity.
    UnstructuredMesh,
    /// Regular lattice described by shape, spacing and origin.
    UniformRectilinear,
}

impl GridKind {
    /// The BMI grid type name.
    pub fn bmi_name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Points => "points",
            Self::UnstructuredMesh => "unstructured",
            Self::UniformRectilinear => "uniform_rectilinear",
        }
    }
}

/// Node coordinates and connectivity of an unstructured mesh.
///
/// Connectivity uses zero-based node indices. `edge_nodes` holds two
/// entries per edge; `face_nodes` lists each face's nodes in turn, with
/// `nodes_per_face` giving how many belong to each face. A channel network
/// is a mesh with edges and no faces.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Node x coordinates.
    pub x: Vec<f64>,
    /// Node y coordinates.
    pub y: Vec<f64>,
    /// Node z coordinates, if the mesh is three-dimensional.
    pub z: Option<Vec<f64>>,
    /// Node pairs, two per edge.
    pub edge_nodes: Vec<i32>,
    /// Nodes of every face, concatenated.
    pub face_nodes: Vec<i32>,
    /// Node count of each face.
    pub nodes_per_face: Vec<i32>,
}

impl Mesh {
    /// Nodes only, no connectivity.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            z: None,
            edge_nodes: Vec::new(),
            face_nodes: Vec::new(),
            nodes_per_face: Vec::new(),
        }
    }

    /// Add z coordinates.
    pub fn with_z(mut self, z: Vec<f64>) -> Self {
        self.z = Some(z);
        self
    }

    /// Set edge connectivity.
    pub fn with_edges(mut self, edge_nodes: Vec<i32>) -> Self {
        self.edge_nodes = edge_nodes;
        self
    }

    /// Set face connectivity.
    pub fn with_faces(mut self, face_nodes: Vec<i32>, nodes_per_face: Vec<i32>) -> Self {
        self.face_nodes = face_nodes;
        self.nodes_per_face = nodes_per_face;
        self
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.x.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_nodes.len() / 2
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.nodes_per_face.len()
    }

    pub(crate) fn validate(&self) -> Result<(), GridError> {
        validate_coordinates(&self.x, &self.y, self.z.as_deref())?;
        let nodes = self.node_count();
        if self.edge_nodes.len() % 2 != 0 {
            return Err(GridError::LengthMismatch {
                what: "edge_nodes",
                expected: self.edge_nodes.len() + 1,
                actual: self.edge_nodes.len(),
            });
        }
        check_node_indices("edge_nodes", &self.edge_nodes, nodes)?;
        check_node_indices("face_nodes", &self.face_nodes, nodes)?;
        let declared: i64 = self.nodes_per_face.iter().map(|&n| i64::from(n)).sum();
        if self.nodes_per_face.iter().any(|&n| n < 3) || declared != self.face_nodes.len() as i64 {
            return Err(GridError::LengthMismatch {
                what: "face_nodes",
                expected: declared.max(0) as usize,
                actual: self.face_nodes.len(),
            });
        }
        Ok(())
    }
}

/// Topology-specific grid data.
#[derive(Clone, Debug, PartialEq)]
pub enum Topology {
    /// A single value.
    Scalar,
    /// Unconnected points.
    Points {
        /// Point x coordinates.
        x: Vec<f64>,
        /// Point y coordinates.
        y: Vec<f64>,
        /// Point z coordinates, if any.
        z: Option<Vec<f64>>,
    },
    /// Nodes plus connectivity.
    UnstructuredMesh(Mesh),
    /// Regular lattice. All three arrays have one entry per axis, slowest
    /// varying axis first (row-major, `[rows, cols]` in two dimensions).
    UniformRectilinear {
        /// Node count per axis.
        shape: SmallVec<[usize; 3]>,
        /// Node spacing per axis.
        spacing: SmallVec<[f64; 3]>,
        /// Coordinates of the first node per axis.
        origin: SmallVec<[f64; 3]>,
    },
}

impl Topology {
    /// The discriminant.
    pub fn kind(&self) -> GridKind {
        match self {
            Self::Scalar => GridKind::Scalar,
            Self::Points { .. } => GridKind::Points,
            Self::UnstructuredMesh(_) => GridKind::UnstructuredMesh,
            Self::UniformRectilinear { .. } => GridKind::UniformRectilinear,
        }
    }
}

pub(crate) fn validate_coordinates(
    x: &[f64],
    y: &[f64],
    z: Option<&[f64]>,
) -> Result<(), GridError> {
    if x.is_empty() {
        return Err(GridError::EmptyPointSet);
    }
    let n = x.len();
    if y.len() != n {
        return Err(GridError::LengthMismatch {
            what: "y",
            expected: n,
            actual: y.len(),
        });
    }
    if let Some(z) = z {
        if z.len() != n {
            return Err(GridError::LengthMismatch {
                what: "z",
                expected: n,
                actual: z.len(),
            });
        }
    }
    let axes = [("x", Some(x)), ("y", Some(y)), ("z", z)];
    for (what, coords) in axes {
        if let Some(index) = coords.and_then(|c| c.iter().position(|v| !v.is_finite())) {
            return Err(GridError::NonFiniteCoordinate { what, index });
        }
    }
    Ok(())
}

fn check_node_indices(
    what: &'static str,
    indices: &[i32],
    node_count: usize,
) -> Result<(), GridError> {
    match indices
        .iter()
        .find(|&&i| i < 0 || i as usize >= node_count)
    {
        Some(&index) => Err(GridError::NodeIndexOutOfRange {
            what,
            index,
            node_count,
        }),
        None => Ok(()),
    }
}
