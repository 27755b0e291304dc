//! Cross-section of a rectangular chimney wall with a rectangular flue.
//!
//! The flue wall is held at a fixed hot temperature and the top of the wall at a fixed cold
//! temperature. Heat is convected away on the right side, while the bottom has a zero heat flux
//! and the left side is insulated.
use crate::assembly::boundary_conditions::{BoundaryConditions, Convection, HeatFlux, PrescribedTemperature};
use crate::assembly::local::Conductivity;
use crate::error::HeatError;
use crate::geometry::AxisAlignedBoundingBox2d;
use crate::mesh::boundary::{BoundaryEdgeGroups, BoundarySide, ClassificationTolerance};
use crate::mesh::procedural::create_rectangular_tri_mesh_with_hole_2d;
use crate::mesh::TriangleMesh2d;
use crate::model::HeatConductionModel;
use log::{debug, info};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimneyParameters {
    pub width: f64,
    pub height: f64,
    /// Lower left corner of the flue.
    pub hole_min: [f64; 2],
    /// Upper right corner of the flue.
    pub hole_max: [f64; 2],
    pub num_cells_x: usize,
    pub num_cells_y: usize,
    pub conductivity: f64,
    /// Temperature of the flue wall.
    pub inner_temperature: f64,
    /// Temperature of the top of the chimney.
    pub top_temperature: f64,
    /// Film coefficient on the right side.
    pub film_coefficient: f64,
    pub ambient_temperature: f64,
    pub tolerance: ClassificationTolerance,
}

impl Default for ChimneyParameters {
    fn default() -> Self {
        Self {
            width: 0.8,
            height: 0.6,
            hole_min: [0.2, 0.2],
            hole_max: [0.6, 0.4],
            num_cells_x: 20,
            num_cells_y: 15,
            conductivity: 1.5,
            inner_temperature: 100.0,
            top_temperature: 30.0,
            film_coefficient: 50.0,
            ambient_temperature: 25.0,
            tolerance: ClassificationTolerance::default(),
        }
    }
}

/// The compacted chimney mesh together with its classified boundary edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ChimneyMesh {
    pub mesh: TriangleMesh2d<f64>,
    pub boundary: BoundaryEdgeGroups,
}

impl ChimneyParameters {
    fn hole(&self) -> Result<AxisAlignedBoundingBox2d<f64>, HeatError> {
        let [x_min, y_min] = self.hole_min;
        let [x_max, y_max] = self.hole_max;
        if !(x_min <= x_max && y_min <= y_max) {
            return Err(HeatError::MeshIntegrity(format!(
                "hole corners {:?} and {:?} are not ordered",
                self.hole_min, self.hole_max
            )));
        }
        Ok(AxisAlignedBoundingBox2d::new(
            Vector2::new(x_min, y_min),
            Vector2::new(x_max, y_max),
        ))
    }

    /// Generates the grid, removes the flue cells, classifies the boundary edges and renumbers
    /// the vertices so that every vertex is used.
    pub fn build_mesh(&self) -> Result<ChimneyMesh, HeatError> {
        let hole = self.hole()?;
        let mesh = create_rectangular_tri_mesh_with_hole_2d(
            self.width,
            self.height,
            self.num_cells_x,
            self.num_cells_y,
            Some(&hole),
        );
        let edges = mesh.find_boundary_edges()?;
        let groups = BoundaryEdgeGroups::classify(&mesh, &edges, &self.tolerance)?;

        let (mesh, relabeling) = mesh.compact()?;
        let boundary = groups.relabel(&relabeling)?;
        debug!(
            "Chimney mesh: removed {} unused vertices",
            relabeling.num_old() - relabeling.num_kept()
        );
        Ok(ChimneyMesh { mesh, boundary })
    }

    /// The flue wall and the top receive prescribed temperatures, the bottom a zero heat flux
    /// and the right side convection. The left side has no boundary condition.
    pub fn boundary_conditions(&self, boundary: &BoundaryEdgeGroups) -> BoundaryConditions<f64> {
        let inner = boundary
            .nodes(BoundarySide::Inner)
            .into_iter()
            .map(|node| PrescribedTemperature::new(node, self.inner_temperature));
        let top = boundary
            .nodes(BoundarySide::Top)
            .into_iter()
            .map(|node| PrescribedTemperature::new(node, self.top_temperature));

        BoundaryConditions {
            temperature: inner.chain(top).collect(),
            heat_flux: boundary
                .edges(BoundarySide::Bottom)
                .iter()
                .map(|edge| HeatFlux::new(edge.element, edge.local_edge, 0.0))
                .collect(),
            convection: boundary
                .edges(BoundarySide::Right)
                .iter()
                .map(|edge| {
                    Convection::new(
                        edge.element,
                        edge.local_edge,
                        self.film_coefficient,
                        self.ambient_temperature,
                    )
                })
                .collect(),
        }
    }

    pub fn build_model(&self) -> Result<HeatConductionModel<f64>, HeatError> {
        let ChimneyMesh { mesh, boundary } = self.build_mesh()?;
        let boundary_conditions = self.boundary_conditions(&boundary);
        info!(
            "Chimney model: {} nodes, {} elements, {} boundary edges",
            mesh.num_vertices(),
            mesh.num_cells(),
            boundary.num_edges()
        );
        Ok(HeatConductionModel::new(mesh, Conductivity::Uniform(self.conductivity))
            .with_boundary_conditions(boundary_conditions))
    }
}
