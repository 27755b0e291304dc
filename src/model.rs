//! Complete steady-state conduction problems: mesh, material, sources and boundary conditions.
use crate::assembly::boundary_conditions::{BoundaryConditions, DirichletMethod};
use crate::assembly::global::{assemble_conduction_system, AssemblyStrategy};
use crate::assembly::local::{Conductivity, HeatSource};
use crate::assembly::{GlobalSystem, LinearSystem};
use crate::error::HeatError;
use crate::mesh::TriangleMesh2d;
use crate::solve::{solve_system, SolverSettings};
use log::info;
use nalgebra::{DVector, RealField, Scalar};
use serde::{Deserialize, Serialize};

pub mod chimney;

/// Settings that control how a [`HeatConductionModel`] is solved.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub dirichlet: DirichletMethod,
    pub solver: SolverSettings,
    pub assembly: AssemblyStrategy,
}

impl AnalysisSettings {
    pub fn with_dirichlet_method(self, dirichlet: DirichletMethod) -> Self {
        Self { dirichlet, ..self }
    }

    pub fn with_solver_settings(self, solver: SolverSettings) -> Self {
        Self { solver, ..self }
    }

    pub fn with_assembly_strategy(self, assembly: AssemblyStrategy) -> Self {
        Self { assembly, ..self }
    }
}

/// Nodal temperatures of a solved model, indexed by mesh vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureField<T: Scalar> {
    values: DVector<T>,
}

impl<T: Scalar> TemperatureField<T> {
    pub fn from_values(values: DVector<T>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &DVector<T> {
        &self.values
    }

    pub fn into_values(self) -> DVector<T> {
        self.values
    }

    pub fn get(&self, node: usize) -> Option<&T> {
        self.values.get(node)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: RealField> TemperatureField<T> {
    pub fn min(&self) -> Option<T> {
        self.values.iter().cloned().reduce(|a, b| a.min(b))
    }

    pub fn max(&self) -> Option<T> {
        self.values.iter().cloned().reduce(|a, b| a.max(b))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct HeatConductionModel<T: Scalar> {
    mesh: TriangleMesh2d<T>,
    conductivity: Conductivity<T>,
    heat_source: Option<HeatSource<T>>,
    boundary_conditions: BoundaryConditions<T>,
}

impl<T: Scalar> HeatConductionModel<T> {
    pub fn new(mesh: TriangleMesh2d<T>, conductivity: Conductivity<T>) -> Self {
        Self {
            mesh,
            conductivity,
            heat_source: None,
            boundary_conditions: BoundaryConditions::default(),
        }
    }

    pub fn with_heat_source(self, heat_source: HeatSource<T>) -> Self {
        Self {
            heat_source: Some(heat_source),
            ..self
        }
    }

    pub fn with_boundary_conditions(self, boundary_conditions: BoundaryConditions<T>) -> Self {
        Self {
            boundary_conditions,
            ..self
        }
    }

    pub fn mesh(&self) -> &TriangleMesh2d<T> {
        &self.mesh
    }

    pub fn conductivity(&self) -> &Conductivity<T> {
        &self.conductivity
    }

    pub fn heat_source(&self) -> Option<&HeatSource<T>> {
        self.heat_source.as_ref()
    }

    pub fn boundary_conditions(&self) -> &BoundaryConditions<T> {
        &self.boundary_conditions
    }
}

impl<T: RealField> HeatConductionModel<T> {
    /// Assembles the conductance matrix and load vector without boundary conditions.
    pub fn assemble(&self, strategy: AssemblyStrategy) -> Result<GlobalSystem<T>, HeatError> {
        assemble_conduction_system(&self.mesh, &self.conductivity, self.heat_source.as_ref(), strategy)
    }

    /// Assembles, applies the boundary conditions and solves for the nodal temperatures.
    pub fn solve(&self, settings: &AnalysisSettings) -> Result<TemperatureField<T>, HeatError> {
        let system = self.assemble(settings.assembly)?;
        info!(
            "Assembled conduction system: {} nodes, {} elements, {} stored entries",
            system.num_nodes(),
            self.mesh.num_cells(),
            system.matrix().nnz()
        );

        let constrained = self
            .boundary_conditions
            .apply(system, &self.mesh, &settings.dirichlet)?;
        info!(
            "Applied boundary conditions: {} temperatures, {} heat fluxes, {} convection edges",
            self.boundary_conditions.temperature.len(),
            self.boundary_conditions.heat_flux.len(),
            self.boundary_conditions.convection.len()
        );

        let field = TemperatureField::from_values(solve_system(constrained, &settings.solver)?);
        if let (Some(min), Some(max)) = (field.min(), field.max()) {
            info!("Solved temperature field: min {:?}, max {:?}", min, max);
        }
        Ok(field)
    }
}
