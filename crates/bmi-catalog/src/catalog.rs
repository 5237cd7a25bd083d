//! The name-keyed variable table and the installed grid table.

use indexmap::IndexMap;

use bmi_core::{Binding, GridId, Location, ValueType, VarRole, VariableDef, WritePolicy};

use crate::error::CatalogError;
use crate::grid::Grid;
use crate::topology::GridKind;

/// Variables and grids of one component instance.
///
/// Iteration order is the order the engine declared its variables, so
/// index-correlated calls (`variable_names` then per-name queries) see a
/// stable sequence for the whole session.
#[derive(Clone, Debug)]
pub struct Catalog {
    variables: IndexMap<String, VariableDef>,
    grids: Option<IndexMap<GridId, Grid>>,
}

impl Catalog {
    /// Build the variable table.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateVariable`] for a repeated name.
    /// - [`CatalogError::InvalidVariable`] for an empty name, an
    ///   accumulating output, or a malformed or repeated communicator
    ///   variable (it must be a scalar `Int32` input).
    pub fn new(variables: Vec<VariableDef>) -> Result<Self, CatalogError> {
        let mut table = IndexMap::with_capacity(variables.len());
        let mut communicator: Option<String> = None;
        for var in variables {
            let invalid = |reason: &str| CatalogError::InvalidVariable {
                name: var.name.clone(),
                reason: reason.to_string(),
            };
            if var.name.trim().is_empty() {
                return Err(invalid("name is empty"));
            }
            if var.role == VarRole::Output && var.policy == WritePolicy::Accumulate {
                return Err(invalid("outputs cannot accumulate"));
            }
            if var.binding == Binding::Communicator {
                if communicator.is_some() {
                    return Err(invalid("only one communicator variable is allowed"));
                }
                if var.value_type != ValueType::Int32
                    || var.role != VarRole::Input
                    || var.location != Location::Scalar
                {
                    return Err(invalid("communicator must be a scalar Int32 input"));
                }
                communicator = Some(var.name.clone());
            }
            if table.contains_key(&var.name) {
                return Err(CatalogError::DuplicateVariable { name: var.name });
            }
            table.insert(var.name.clone(), var);
        }
        Ok(Self {
            variables: table,
            grids: None,
        })
    }

    /// Install the grids the engine reported at initialization.
    ///
    /// All-or-nothing: on error the catalog is unchanged.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::GridsAlreadyInstalled`] on a second call.
    /// - [`CatalogError::DuplicateGrid`] for a repeated id.
    /// - [`CatalogError::MissingGrid`] if a variable's grid is absent.
    /// - [`CatalogError::InvalidVariable`] if a scalar-located variable
    ///   sits on a non-scalar grid.
    pub fn install_grids(&mut self, grids: Vec<Grid>) -> Result<(), CatalogError> {
        if self.grids.is_some() {
            return Err(CatalogError::GridsAlreadyInstalled);
        }
        let mut table = IndexMap::with_capacity(grids.len());
        for grid in grids {
            let id = grid.id();
            if table.insert(id, grid).is_some() {
                return Err(CatalogError::DuplicateGrid { grid: id });
            }
        }
        for var in self.variables.values() {
            let grid = table.get(&var.grid).ok_or_else(|| CatalogError::MissingGrid {
                name: var.name.clone(),
                grid: var.grid,
            })?;
            if var.location == Location::Scalar && grid.kind() != GridKind::Scalar {
                return Err(CatalogError::InvalidVariable {
                    name: var.name.clone(),
                    reason: format!("scalar variable on {} grid", grid.kind().bmi_name()),
                });
            }
        }
        self.grids = Some(table);
        Ok(())
    }

    /// Whether grids have been installed.
    pub fn grids_ready(&self) -> bool {
        self.grids.is_some()
    }

    // ── variables ──────────────────────────────────────────────────

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Result<&VariableDef, CatalogError> {
        self.variables
            .get(name)
            .ok_or_else(|| CatalogError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &VariableDef> {
        self.variables.values()
    }

    /// Number of variables with `role`.
    pub fn variable_count(&self, role: VarRole) -> usize {
        self.variables.values().filter(|v| v.role == role).count()
    }

    /// Names of variables with `role`, in declaration order.
    pub fn variable_names(&self, role: VarRole) -> Vec<&str> {
        self.variables
            .values()
            .filter(|v| v.role == role)
            .map(|v| v.name.as_str())
            .collect()
    }

    /// The communicator variable, if the engine declares one.
    pub fn communicator_variable(&self) -> Option<&VariableDef> {
        self.variables
            .values()
            .find(|v| v.binding == Binding::Communicator)
    }

    /// Element type of `name`.
    pub fn var_type(&self, name: &str) -> Result<ValueType, CatalogError> {
        self.variable(name).map(|v| v.value_type)
    }

    /// Units of `name`.
    pub fn var_units(&self, name: &str) -> Result<&str, CatalogError> {
        self.variable(name).map(|v| v.units.as_str())
    }

    /// Grid of `name`.
    pub fn var_grid(&self, name: &str) -> Result<GridId, CatalogError> {
        self.variable(name).map(|v| v.grid)
    }

    /// Bytes per element of `name`.
    pub fn var_itemsize(&self, name: &str) -> Result<usize, CatalogError> {
        self.variable(name).map(VariableDef::itemsize)
    }

    /// Grid location of `name`.
    pub fn var_location(&self, name: &str) -> Result<Location, CatalogError> {
        self.variable(name).map(|v| v.location)
    }

    /// Element count of `name`: its grid's size. Requires grids.
    pub fn var_size(&self, name: &str) -> Result<usize, CatalogError> {
        let var = self.variable(name)?;
        Ok(self.grid(var.grid)?.size())
    }

    /// Total bytes of `name`: itemsize × grid size. Requires grids.
    pub fn var_nbytes(&self, name: &str) -> Result<usize, CatalogError> {
        let var = self.variable(name)?;
        Ok(var.itemsize() * self.grid(var.grid)?.size())
    }

    // ── grids ──────────────────────────────────────────────────────

    /// Look up an installed grid.
    pub fn grid(&self, id: GridId) -> Result<&Grid, CatalogError> {
        self.grids
            .as_ref()
            .ok_or(CatalogError::GridsNotReady)?
            .get(&id)
            .ok_or(CatalogError::UnknownGrid { grid: id })
    }

    /// Installed grid ids in reported order.
    pub fn grid_ids(&self) -> Result<Vec<GridId>, CatalogError> {
        let grids = self.grids.as_ref().ok_or(CatalogError::GridsNotReady)?;
        Ok(grids.keys().copied().collect())
    }

    /// Topology of grid `id`.
    pub fn grid_type(&self, id: GridId) -> Result<GridKind, CatalogError> {
        self.grid(id).map(Grid::kind)
    }

    /// Rank of grid `id`.
    pub fn grid_rank(&self, id: GridId) -> Result<usize, CatalogError> {
        self.grid(id).map(Grid::rank)
    }

    /// Size of grid `id`.
    pub fn grid_size(&self, id: GridId) -> Result<usize, CatalogError> {
        self.grid(id).map(Grid::size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridCapability;
    use crate::topology::Mesh;
    use proptest::prelude::*;

    fn vars() -> Vec<VariableDef> {
        vec![
            VariableDef::input(
                "atmosphere_water__precipitation_leq-volume_flux",
                ValueType::Float64,
                "mm s-1",
                GridId(0),
            )
            .accumulating(),
            VariableDef::output(
                "channel_water__volume_flow_rate",
                ValueType::Float64,
                "m3 s-1",
                GridId(2),
            ),
            VariableDef::output("land_surface_water__depth", ValueType::Float64, "m", GridId(0)),
            VariableDef::communicator("bmi_mpi_comm_handle", GridId(9)),
        ]
    }

    fn grids() -> Vec<Grid> {
        vec![
            Grid::uniform_rectilinear(GridId(0), &[3, 4], &[250.0, 250.0], &[0.0, 0.0]).unwrap(),
            Grid::unstructured(
                GridId(2),
                Mesh::new(vec![0.0, 1.0], vec![0.0, 1.0]).with_edges(vec![0, 1]),
            )
            .unwrap(),
            Grid::scalar(GridId(9)),
        ]
    }

    #[test]
    fn names_by_role_in_declaration_order() {
        let cat = Catalog::new(vars()).unwrap();
        assert_eq!(cat.variable_count(VarRole::Input), 2);
        assert_eq!(cat.variable_count(VarRole::Output), 2);
        assert_eq!(
            cat.variable_names(VarRole::Output),
            vec![
                "channel_water__volume_flow_rate",
                "land_surface_water__depth",
            ]
        );
        assert_eq!(
            cat.communicator_variable().map(|v| v.name.as_str()),
            Some("bmi_mpi_comm_handle")
        );
    }

    #[test]
    fn unknown_variable_is_exact() {
        let cat = Catalog::new(vars()).unwrap();
        assert_eq!(
            cat.var_type("not_a_real_variable"),
            Err(CatalogError::UnknownVariable {
                name: "not_a_real_variable".into()
            })
        );
        assert_eq!(cat.var_units("channel_water__volume_flow_rate"), Ok("m3 s-1"));
    }

    #[test]
    fn nbytes_requires_grids() {
        let mut cat = Catalog::new(vars()).unwrap();
        assert_eq!(
            cat.var_nbytes("land_surface_water__depth"),
            Err(CatalogError::GridsNotReady)
        );
        assert_eq!(cat.grid_type(GridId(0)), Err(CatalogError::GridsNotReady));

        cat.install_grids(grids()).unwrap();
        for var in vars() {
            let grid = cat.var_grid(&var.name).unwrap();
            assert_eq!(
                cat.var_nbytes(&var.name).unwrap(),
                cat.var_itemsize(&var.name).unwrap() * cat.grid_size(grid).unwrap()
            );
        }
        assert_eq!(cat.var_nbytes("land_surface_water__depth"), Ok(96));
    }

    #[test]
    fn unknown_grid_differs_from_unsupported_capability() {
        let mut cat = Catalog::new(vars()).unwrap();
        cat.install_grids(grids()).unwrap();
        assert_eq!(
            cat.grid(GridId(42)).map(|_| ()),
            Err(CatalogError::UnknownGrid { grid: GridId(42) })
        );
        assert_eq!(
            cat.grid(GridId(2)).unwrap().shape(),
            Err(CatalogError::GridCapabilityUnsupported {
                grid: GridId(2),
                capability: GridCapability::Shape
            })
        );
        assert_eq!(cat.grid_ids().unwrap(), vec![GridId(0), GridId(2), GridId(9)]);
    }

    #[test]
    fn install_is_all_or_nothing() {
        let mut cat = Catalog::new(vars()).unwrap();
        let mut partial = grids();
        partial.pop();
        assert_eq!(
            cat.install_grids(partial),
            Err(CatalogError::MissingGrid {
                name: "bmi_mpi_comm_handle".into(),
                grid: GridId(9)
            })
        );
        assert!(!cat.grids_ready());
        cat.install_grids(grids()).unwrap();
        assert_eq!(cat.install_grids(grids()), Err(CatalogError::GridsAlreadyInstalled));
    }

    #[test]
    fn duplicate_grid_rejected() {
        let mut cat = Catalog::new(vars()).unwrap();
        let mut dup = grids();
        dup.push(Grid::scalar(GridId(0)));
        assert_eq!(
            cat.install_grids(dup),
            Err(CatalogError::DuplicateGrid { grid: GridId(0) })
        );
    }

    #[test]
    fn communicator_on_non_scalar_grid_rejected() {
        let mut cat = Catalog::new(vec![VariableDef::communicator("comm", GridId(0))]).unwrap();
        match cat.install_grids(grids()) {
            Err(CatalogError::InvalidVariable { name, .. }) => assert_eq!(name, "comm"),
            other => panic!("expected InvalidVariable, got {other:?}"),
        }
    }

    #[test]
    fn construction_rules() {
        let mut dup = vars();
        dup.push(vars().remove(1));
        assert_eq!(
            Catalog::new(dup).map(|_| ()),
            Err(CatalogError::DuplicateVariable {
                name: "channel_water__volume_flow_rate".into()
            })
        );

        let accumulating_output =
            VariableDef::output("x", ValueType::Float64, "1", GridId(0)).accumulating();
        match Catalog::new(vec![accumulating_output]) {
            Err(CatalogError::InvalidVariable { name, .. }) => assert_eq!(name, "x"),
            other => panic!("expected InvalidVariable, got {other:?}"),
        }

        let mut float_comm = VariableDef::communicator("comm", GridId(9));
        float_comm.value_type = ValueType::Float64;
        assert!(matches!(
            Catalog::new(vec![float_comm]),
            Err(CatalogError::InvalidVariable { .. })
        ));

        let two_comms = vec![
            VariableDef::communicator("a", GridId(9)),
            VariableDef::communicator("b", GridId(9)),
        ];
        assert!(matches!(
            Catalog::new(two_comms),
            Err(CatalogError::InvalidVariable { .. })
        ));
    }

    proptest! {
        #[test]
        fn name_order_is_declaration_order(names in prop::collection::hash_set("[a-z_]{1,12}", 1..20)) {
            let names: Vec<String> = names.into_iter().collect();
            let defs = names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    if i % 2 == 0 {
                        VariableDef::input(n, ValueType::Float64, "1", GridId(0))
                    } else {
                        VariableDef::output(n, ValueType::Float32, "1", GridId(0))
                    }
                })
                .collect();
            let cat = Catalog::new(defs).unwrap();
            let expected_inputs: Vec<&str> = names.iter().step_by(2).map(String::as_str).collect();
            prop_assert_eq!(cat.variable_names(VarRole::Input), expected_inputs);
            prop_assert_eq!(cat.variable_names(VarRole::Input), cat.variable_names(VarRole::Input));
            prop_assert_eq!(
                cat.variable_count(VarRole::Input) + cat.variable_count(VarRole::Output),
                names.len()
            );
        }
    }
}
