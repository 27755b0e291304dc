//! Element-local quantities: conductance matrices and heat source vectors.
use crate::connectivity::Connectivity;
use crate::element::Tri3d2Element;
use crate::error::HeatError;
use crate::mesh::{Mesh2d, TriangleMesh2d};
use nalgebra::{try_convert, DMatrixViewMut, DVectorViewMut, RealField, Scalar};
use serde::{Deserialize, Serialize};

pub trait ElementConnectivityAssembler {
    fn num_elements(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

impl<T, C> ElementConnectivityAssembler for Mesh2d<T, C>
where
    T: Scalar,
    C: Connectivity,
{
    fn num_elements(&self) -> usize {
        self.connectivity().len()
    }

    fn num_nodes(&self) -> usize {
        self.vertices().len()
    }

    fn element_node_count(&self, element_index: usize) -> usize {
        self.connectivity()[element_index].vertex_indices().len()
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(self.connectivity()[element_index].vertex_indices());
    }
}

pub trait ElementMatrixAssembler<T: Scalar>: ElementConnectivityAssembler {
    fn assemble_element_matrix_into(&self, element_index: usize, output: DMatrixViewMut<T>) -> Result<(), HeatError>;
}

pub trait ElementVectorAssembler<T: Scalar>: ElementConnectivityAssembler {
    fn assemble_element_vector_into(&self, element_index: usize, output: DVectorViewMut<T>) -> Result<(), HeatError>;
}

/// Thermal conductivity of the elements of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conductivity<T> {
    Uniform(T),
    PerElement(Vec<T>),
}

impl<T: RealField> Conductivity<T> {
    pub fn value(&self, element_index: usize) -> Option<T> {
        match self {
            Conductivity::Uniform(k) => Some(k.clone()),
            Conductivity::PerElement(values) => values.get(element_index).cloned(),
        }
    }

    /// Checks that there is one finite, positive value per element.
    pub fn validate(&self, num_elements: usize) -> Result<(), HeatError> {
        match self {
            Conductivity::Uniform(k) => check_conductivity(0, k),
            Conductivity::PerElement(values) => {
                if values.len() != num_elements {
                    return Err(HeatError::DimensionMismatch {
                        what: "conductivity values",
                        expected: num_elements,
                        actual: values.len(),
                    });
                }
                values
                    .iter()
                    .enumerate()
                    .try_for_each(|(element, k)| check_conductivity(element, k))
            }
        }
    }
}

fn check_conductivity<T: RealField>(element: usize, k: &T) -> Result<(), HeatError> {
    if k.is_finite() && *k > T::zero() {
        Ok(())
    } else {
        Err(HeatError::InvalidConductivity {
            element,
            value: try_convert(k.clone()).unwrap_or(f64::NAN),
        })
    }
}

/// Volumetric heat generation rate (power per unit area in 2D).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatSource<T> {
    Uniform(T),
    PerElement(Vec<T>),
}

impl<T: RealField> HeatSource<T> {
    pub fn value(&self, element_index: usize) -> Option<T> {
        match self {
            HeatSource::Uniform(q) => Some(q.clone()),
            HeatSource::PerElement(values) => values.get(element_index).cloned(),
        }
    }

    pub fn validate(&self, num_elements: usize) -> Result<(), HeatError> {
        match self {
            HeatSource::Uniform(_) => Ok(()),
            HeatSource::PerElement(values) if values.len() == num_elements => Ok(()),
            HeatSource::PerElement(values) => Err(HeatError::DimensionMismatch {
                what: "heat source values",
                expected: num_elements,
                actual: values.len(),
            }),
        }
    }
}

/// Computes element conductance matrices `K_e = k |A| BᵀB` of a triangle mesh.
#[derive(Debug, Clone, Copy)]
pub struct ElementConductionAssembler<'a, T: Scalar> {
    mesh: &'a TriangleMesh2d<T>,
    conductivity: &'a Conductivity<T>,
}

impl<'a, T: RealField> ElementConductionAssembler<'a, T> {
    /// Fails if the conductivity does not fit the mesh.
    pub fn try_new(mesh: &'a TriangleMesh2d<T>, conductivity: &'a Conductivity<T>) -> Result<Self, HeatError> {
        conductivity.validate(mesh.num_cells())?;
        Ok(Self { mesh, conductivity })
    }

    fn element(&self, element_index: usize) -> Result<Tri3d2Element<T>, HeatError> {
        self.mesh
            .get_cell(element_index)
            .ok_or_else(|| HeatError::element_out_of_bounds(element_index, self.mesh.num_cells()))
    }
}

impl<'a, T: RealField> ElementConnectivityAssembler for ElementConductionAssembler<'a, T> {
    fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    fn element_node_count(&self, element_index: usize) -> usize {
        self.mesh.element_node_count(element_index)
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        self.mesh.populate_element_nodes(output, element_index)
    }
}

impl<'a, T: RealField> ElementMatrixAssembler<T> for ElementConductionAssembler<'a, T> {
    fn assemble_element_matrix_into(&self, element_index: usize, mut output: DMatrixViewMut<T>) -> Result<(), HeatError> {
        let k = self
            .conductivity
            .value(element_index)
            .ok_or_else(|| HeatError::element_out_of_bounds(element_index, self.mesh.num_cells()))?;
        let element_matrix = self
            .element(element_index)?
            .stiffness_matrix(k)
            .map_err(|err| err.in_element(element_index))?;
        output.copy_from(&element_matrix);
        Ok(())
    }
}

/// Computes the consistent nodal loads `Q |A| / 3` of a distributed heat source.
#[derive(Debug, Clone, Copy)]
pub struct ElementSourceAssembler<'a, T: Scalar> {
    mesh: &'a TriangleMesh2d<T>,
    source: &'a HeatSource<T>,
}

impl<'a, T: RealField> ElementSourceAssembler<'a, T> {
    pub fn try_new(mesh: &'a TriangleMesh2d<T>, source: &'a HeatSource<T>) -> Result<Self, HeatError> {
        source.validate(mesh.num_cells())?;
        Ok(Self { mesh, source })
    }
}

impl<'a, T: RealField> ElementConnectivityAssembler for ElementSourceAssembler<'a, T> {
    fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    fn element_node_count(&self, element_index: usize) -> usize {
        self.mesh.element_node_count(element_index)
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        self.mesh.populate_element_nodes(output, element_index)
    }
}

impl<'a, T: RealField> ElementVectorAssembler<T> for ElementSourceAssembler<'a, T> {
    fn assemble_element_vector_into(&self, element_index: usize, mut output: DVectorViewMut<T>) -> Result<(), HeatError> {
        let num_cells = self.mesh.num_cells();
        let q = self
            .source
            .value(element_index)
            .ok_or_else(|| HeatError::element_out_of_bounds(element_index, num_cells))?;
        let element_vector = self
            .mesh
            .get_cell(element_index)
            .ok_or_else(|| HeatError::element_out_of_bounds(element_index, num_cells))?
            .source_vector(q)
            .map_err(|err| err.in_element(element_index))?;
        output.copy_from(&element_vector);
        Ok(())
    }
}
