//! Prescribed temperatures, heat fluxes and convective boundaries.
//!
//! Natural conditions ([`HeatFlux`], [`Convection`]) transform a [`GlobalSystem`] into a new
//! `GlobalSystem`. Prescribed temperatures consume the system and return a [`ConstrainedSystem`],
//! so natural conditions can not be applied after the temperatures have been imposed. Every
//! operation validates its input before it touches the system.
use crate::assembly::{ConstrainedSystem, GlobalSystem, LinearSystem};
use crate::connectivity::LocalEdge;
use crate::error::HeatError;
use crate::mesh::{TriangleMesh2d, VertexRelabeling};
use log::{debug, warn};
use nalgebra::{convert, RealField};
use nalgebra_sparse::{CsrMatrix, SparseEntry, SparseEntryMut};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Dirichlet condition: the temperature of a node is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescribedTemperature<T> {
    pub node: usize,
    pub temperature: T,
}

/// Neumann condition: a uniform heat flux `q` (power per unit length) enters through an element
/// edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatFlux<T> {
    pub element: usize,
    pub edge: LocalEdge,
    pub flux: T,
}

/// Robin condition: the edge exchanges heat with a fluid at `ambient_temperature` through the
/// film coefficient `h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convection<T> {
    pub element: usize,
    pub edge: LocalEdge,
    pub film_coefficient: T,
    pub ambient_temperature: T,
}

impl<T> PrescribedTemperature<T> {
    pub fn new(node: usize, temperature: T) -> Self {
        Self { node, temperature }
    }
}

impl<T> HeatFlux<T> {
    pub fn new(element: usize, edge: LocalEdge, flux: T) -> Self {
        Self { element, edge, flux }
    }

    /// Takes the edge as a 1-based id.
    pub fn try_new(element: usize, edge_id: usize, flux: T) -> Result<Self, HeatError> {
        Ok(Self::new(element, LocalEdge::from_id(edge_id)?, flux))
    }
}

impl<T> Convection<T> {
    pub fn new(element: usize, edge: LocalEdge, film_coefficient: T, ambient_temperature: T) -> Self {
        Self {
            element,
            edge,
            film_coefficient,
            ambient_temperature,
        }
    }

    /// Takes the edge as a 1-based id.
    pub fn try_new(element: usize, edge_id: usize, film_coefficient: T, ambient_temperature: T) -> Result<Self, HeatError> {
        Ok(Self::new(element, LocalEdge::from_id(edge_id)?, film_coefficient, ambient_temperature))
    }
}

/// A single boundary condition of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition<T> {
    Temperature(PrescribedTemperature<T>),
    HeatFlux(HeatFlux<T>),
    Convection(Convection<T>),
}

/// How prescribed temperatures are imposed.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirichletMethod {
    /// Exact elimination: the row and column of each constrained node are replaced by the
    /// identity and the load vector is corrected.
    #[default]
    Elimination,
    /// Adds `alpha` to the diagonal of each constrained node, followed by a second pass that
    /// adds `escalation` times the largest matrix entry.
    Penalty { alpha: f64, escalation: f64 },
}

impl DirichletMethod {
    pub fn penalty(alpha: f64) -> Self {
        DirichletMethod::Penalty {
            alpha,
            escalation: 1e4,
        }
    }
}

/// The boundary conditions of a conduction problem, grouped by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct BoundaryConditions<T> {
    pub temperature: Vec<PrescribedTemperature<T>>,
    pub heat_flux: Vec<HeatFlux<T>>,
    pub convection: Vec<Convection<T>>,
}

impl<T> Default for BoundaryConditions<T> {
    fn default() -> Self {
        Self {
            temperature: Vec::new(),
            heat_flux: Vec::new(),
            convection: Vec::new(),
        }
    }
}

impl<T> BoundaryConditions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: BoundaryCondition<T>) {
        match condition {
            BoundaryCondition::Temperature(bc) => self.temperature.push(bc),
            BoundaryCondition::HeatFlux(bc) => self.heat_flux.push(bc),
            BoundaryCondition::Convection(bc) => self.convection.push(bc),
        }
    }

    pub fn len(&self) -> usize {
        self.temperature.len() + self.heat_flux.len() + self.convection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> FromIterator<BoundaryCondition<T>> for BoundaryConditions<T> {
    fn from_iter<I: IntoIterator<Item = BoundaryCondition<T>>>(iter: I) -> Self {
        let mut conditions = Self::new();
        for condition in iter {
            conditions.push(condition);
        }
        conditions
    }
}

impl<T: RealField> BoundaryConditions<T> {
    /// Applies heat fluxes, then convection, then the prescribed temperatures.
    pub fn apply(
        &self,
        system: GlobalSystem<T>,
        mesh: &TriangleMesh2d<T>,
        method: &DirichletMethod,
    ) -> Result<ConstrainedSystem<T>, HeatError> {
        system
            .apply_heat_flux(mesh, &self.heat_flux)?
            .apply_convection(mesh, &self.convection)?
            .apply_dirichlet(&self.temperature, method)
    }

    /// Maps the nodes of the prescribed temperatures through a vertex relabeling.
    ///
    /// Element-based conditions are kept as they are.
    pub fn relabel(&self, relabeling: &VertexRelabeling) -> Result<Self, HeatError> {
        let temperature = self
            .temperature
            .iter()
            .map(|bc| {
                Ok(PrescribedTemperature::new(
                    relabeling.try_new_index(bc.node)?,
                    bc.temperature.clone(),
                ))
            })
            .collect::<Result<_, HeatError>>()?;
        Ok(Self {
            temperature,
            heat_flux: self.heat_flux.clone(),
            convection: self.convection.clone(),
        })
    }
}

/// Global nodes and length of an element edge.
fn edge_nodes_and_length<T: RealField>(
    mesh: &TriangleMesh2d<T>,
    element: usize,
    edge: LocalEdge,
) -> Result<([usize; 2], T), HeatError> {
    let out_of_bounds = || HeatError::element_out_of_bounds(element, mesh.num_cells());
    let connectivity = mesh.connectivity().get(element).ok_or_else(out_of_bounds)?;
    let cell = mesh.get_cell(element).ok_or_else(out_of_bounds)?;
    Ok((connectivity.edge(edge).0, cell.edge_length(edge)))
}

fn check_mesh_matches<T: RealField>(system: &GlobalSystem<T>, mesh: &TriangleMesh2d<T>) -> Result<(), HeatError> {
    if mesh.num_vertices() == system.num_nodes() {
        Ok(())
    } else {
        Err(HeatError::DimensionMismatch {
            what: "mesh vertices",
            expected: system.num_nodes(),
            actual: mesh.num_vertices(),
        })
    }
}

/// Positions in the value array of the stored diagonal entries of `nodes`.
fn diagonal_offsets<T>(
    matrix: &CsrMatrix<T>,
    nodes: impl IntoIterator<Item = usize>,
) -> Result<Vec<usize>, HeatError> {
    let (row_offsets, col_indices) = (matrix.row_offsets(), matrix.col_indices());
    nodes
        .into_iter()
        .map(|node| {
            let row = row_offsets[node]..row_offsets[node + 1];
            col_indices[row.clone()]
                .binary_search(&node)
                .map(|k| row.start + k)
                .map_err(|_| HeatError::MeshIntegrity(format!("no diagonal entry is stored for node {node}")))
        })
        .collect()
}

/// Collapses repeated nodes into a single entry at the position of their first occurrence,
/// keeping the last value.
fn deduplicate_temperatures<T: RealField>(
    temperatures: &[PrescribedTemperature<T>],
    num_nodes: usize,
) -> Result<Vec<PrescribedTemperature<T>>, HeatError> {
    let mut positions = BTreeMap::new();
    let mut unique: Vec<PrescribedTemperature<T>> = Vec::with_capacity(temperatures.len());
    for bc in temperatures {
        if bc.node >= num_nodes {
            return Err(HeatError::node_out_of_bounds(bc.node, num_nodes));
        }
        match positions.entry(bc.node) {
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(bc.clone());
            }
            Entry::Occupied(entry) => {
                warn!(
                    "Temperature of node {} is prescribed more than once, the last value wins",
                    bc.node
                );
                unique[*entry.get()].temperature = bc.temperature.clone();
            }
        }
    }
    Ok(unique)
}

impl<T: RealField> GlobalSystem<T> {
    /// Adds `q L / 2` to the load of both nodes of each edge.
    pub fn apply_heat_flux(mut self, mesh: &TriangleMesh2d<T>, fluxes: &[HeatFlux<T>]) -> Result<Self, HeatError> {
        check_mesh_matches(&self, mesh)?;
        let edges = fluxes
            .iter()
            .map(|bc| edge_nodes_and_length(mesh, bc.element, bc.edge))
            .collect::<Result<Vec<_>, _>>()?;

        let (_, rhs) = self.parts_mut();
        let two = T::one() + T::one();
        for (bc, ([a, b], length)) in fluxes.iter().zip(edges) {
            let nodal_flux = bc.flux.clone() * length / two.clone();
            rhs[a] += nodal_flux.clone();
            rhs[b] += nodal_flux;
        }
        debug!("Applied {} heat flux edges", fluxes.len());
        Ok(self)
    }

    /// Adds the convective edge matrix `(h L / 6) [[2, 1], [1, 2]]` to the conductance matrix and
    /// `h T∞ L / 2` to the load of both nodes of each edge.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn apply_convection(mut self, mesh: &TriangleMesh2d<T>, convection: &[Convection<T>]) -> Result<Self, HeatError> {
        check_mesh_matches(&self, mesh)?;
        let edges = convection
            .iter()
            .map(|bc| edge_nodes_and_length(mesh, bc.element, bc.edge))
            .collect::<Result<Vec<_>, _>>()?;
        for (bc, ([a, b], _)) in convection.iter().zip(&edges) {
            if !matches!(self.matrix().get_entry(*a, *b), Some(SparseEntry::NonZero(_))) {
                return Err(HeatError::MeshIntegrity(format!(
                    "edge ({a}, {b}) of element {} has no entry in the conductance matrix",
                    bc.element
                )));
            }
        }

        let (matrix, rhs) = self.parts_mut();
        for (bc, ([a, b], length)) in convection.iter().zip(edges) {
            let h = bc.film_coefficient.clone();
            let coupling = h.clone() * length.clone() / 6.0;
            for (i, j) in [(a, a), (a, b), (b, a), (b, b)] {
                if let Some(SparseEntryMut::NonZero(value)) = matrix.get_entry_mut(i, j) {
                    let factor = if i == j { 2.0 } else { 1.0 };
                    *value += factor * coupling.clone();
                }
            }
            let nodal_load = h * bc.ambient_temperature.clone() * length / 2.0;
            rhs[a] += nodal_load.clone();
            rhs[b] += nodal_load;
        }
        debug!("Applied {} convection edges", convection.len());
        Ok(self)
    }

    pub fn apply_dirichlet(
        self,
        temperatures: &[PrescribedTemperature<T>],
        method: &DirichletMethod,
    ) -> Result<ConstrainedSystem<T>, HeatError> {
        match *method {
            DirichletMethod::Elimination => self.apply_dirichlet_elimination(temperatures),
            DirichletMethod::Penalty { alpha, escalation } => {
                self.apply_dirichlet_penalty(temperatures, convert(alpha), convert(escalation))
            }
        }
    }

    /// Imposes prescribed temperatures exactly.
    ///
    /// Nodes are processed in the given order. For each node `n` with value `v`, the current
    /// column `n` times `v` is subtracted from the load vector, row and column `n` are zeroed,
    /// `K[n, n]` is set to one and `f[n]` to `v`. Columns are read from the current matrix, but a
    /// previously constrained node has a zero entry in every other column, so the result does not
    /// depend on the order of the nodes. The matrix stays symmetric.
    ///
    /// A node that appears several times is constrained once with its last value.
    pub fn apply_dirichlet_elimination(
        mut self,
        temperatures: &[PrescribedTemperature<T>],
    ) -> Result<ConstrainedSystem<T>, HeatError> {
        let temperatures = deduplicate_temperatures(temperatures, self.num_nodes())?;

        let (matrix, rhs) = self.parts_mut();
        for bc in &temperatures {
            let n = bc.node;
            let value = bc.temperature.clone();

            // Column n equals row n, since the matrix is symmetric
            let coupled: Vec<(usize, T)> = {
                let row = matrix.row(n);
                row.col_indices()
                    .iter()
                    .copied()
                    .zip(row.values().iter().cloned())
                    .filter(|(j, _)| *j != n)
                    .collect()
            };

            for (j, k_jn) in &coupled {
                rhs[*j] -= k_jn.clone() * value.clone();
            }

            {
                let mut row = matrix.row_mut(n);
                let (cols, values) = row.cols_and_values_mut();
                for (&col, entry) in cols.iter().zip(values) {
                    *entry = if col == n { T::one() } else { T::zero() };
                }
            }
            for (j, _) in &coupled {
                if let Some(SparseEntryMut::NonZero(entry)) = matrix.get_entry_mut(*j, n) {
                    *entry = T::zero();
                }
            }

            rhs[n] = value;
        }

        debug!("Eliminated {} prescribed temperatures", temperatures.len());
        let constrained_nodes = temperatures.iter().map(|bc| bc.node).collect();
        Ok(self.into_constrained(constrained_nodes))
    }

    /// Imposes prescribed temperatures approximately with a penalty.
    ///
    /// First `alpha` is added to `K[n, n]` and `alpha v` to `f[n]` for each node. Then
    /// `C = escalation max |K_ij|` is computed from the resulting matrix and `C` and `C v` are
    /// added in a second pass. The solution approaches `v` as `C` grows, at the cost of the
    /// conditioning of the matrix.
    pub fn apply_dirichlet_penalty(
        mut self,
        temperatures: &[PrescribedTemperature<T>],
        alpha: T,
        escalation: T,
    ) -> Result<ConstrainedSystem<T>, HeatError> {
        let temperatures = deduplicate_temperatures(temperatures, self.num_nodes())?;

        let diagonals = diagonal_offsets(self.matrix(), temperatures.iter().map(|bc| bc.node))?;

        let (matrix, rhs) = self.parts_mut();
        let values = matrix.values_mut();
        for (bc, &k) in temperatures.iter().zip(&diagonals) {
            values[k] += alpha.clone();
            rhs[bc.node] += alpha.clone() * bc.temperature.clone();
        }

        let max_entry = values
            .iter()
            .fold(T::zero(), |max, value| max.max(value.clone().abs()));
        let penalty = max_entry * escalation;
        for (bc, &k) in temperatures.iter().zip(&diagonals) {
            values[k] += penalty.clone();
            rhs[bc.node] += penalty.clone() * bc.temperature.clone();
        }

        debug!(
            "Applied penalty {:?} to {} prescribed temperatures",
            penalty,
            temperatures.len()
        );
        let constrained_nodes = temperatures.iter().map(|bc| bc.node).collect();
        Ok(self.into_constrained(constrained_nodes))
    }
}
