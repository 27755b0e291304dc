use crate::assembly::local::{
    Conductivity, ElementConductionAssembler, ElementMatrixAssembler, ElementSourceAssembler,
    ElementVectorAssembler, HeatSource,
};
use crate::assembly::GlobalSystem;
use crate::error::HeatError;
use crate::mesh::TriangleMesh2d;
use log::debug;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, RealField, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::marker::PhantomData;

/// An assembler for CSR matrices.
///
/// Element matrices are scattered into a triplet (COO) buffer, which is converted to CSR once all
/// elements have been visited. Duplicate triplets are summed in the conversion. Every diagonal
/// entry is stored explicitly, even for nodes that no element references.
#[derive(Debug, Clone)]
pub struct CsrAssembler<T: Scalar> {
    // Buffers that prevent unnecessary allocations when assembling multiple matrices with the
    // same assembler
    workspace: RefCell<CsrAssemblerWorkspace<T>>,
}

impl<T: Scalar> Default for CsrAssembler<T> {
    fn default() -> Self {
        Self {
            workspace: RefCell::new(CsrAssemblerWorkspace::default()),
        }
    }
}

#[derive(Debug, Clone)]
struct CsrAssemblerWorkspace<T: Scalar> {
    element_global_nodes: Vec<usize>,
    element_matrix: DMatrix<T>,
}

impl<T: Scalar> Default for CsrAssemblerWorkspace<T> {
    fn default() -> Self {
        Self {
            element_global_nodes: Vec::new(),
            element_matrix: DMatrix::from_row_slice(0, 0, &[]),
        }
    }
}

impl<T: RealField> CsrAssemblerWorkspace<T> {
    /// Computes the matrix and the global nodes of one element into the workspace buffers.
    fn compute_element(
        &mut self,
        element_assembler: &dyn ElementMatrixAssembler<T>,
        element_index: usize,
    ) -> Result<(), HeatError> {
        let node_count = element_assembler.element_node_count(element_index);
        self.element_global_nodes.resize(node_count, 0);
        self.element_matrix
            .resize_mut(node_count, node_count, T::zero());
        self.element_matrix.fill(T::zero());

        element_assembler.populate_element_nodes(&mut self.element_global_nodes, element_index);
        let num_nodes = element_assembler.num_nodes();
        if let Some(&node) = self
            .element_global_nodes
            .iter()
            .find(|&&node| node >= num_nodes)
        {
            return Err(HeatError::node_out_of_bounds(node, num_nodes));
        }

        let matrix_view = DMatrixViewMut::from(&mut self.element_matrix);
        element_assembler.assemble_element_matrix_into(element_index, matrix_view)
    }
}

fn push_element_matrix<T: RealField>(coo: &mut CooMatrix<T>, global_nodes: &[usize], element_matrix: &DMatrix<T>) {
    for (local_row, &global_row) in global_nodes.iter().enumerate() {
        for (local_col, &global_col) in global_nodes.iter().enumerate() {
            coo.push(global_row, global_col, element_matrix[(local_row, local_col)].clone());
        }
    }
}

fn coo_with_diagonal<T: RealField>(num_nodes: usize) -> CooMatrix<T> {
    let mut coo = CooMatrix::new(num_nodes, num_nodes);
    for i in 0..num_nodes {
        coo.push(i, i, T::zero());
    }
    coo
}

impl<T: RealField> CsrAssembler<T> {
    pub fn assemble(&self, element_assembler: &dyn ElementMatrixAssembler<T>) -> Result<CsrMatrix<T>, HeatError> {
        let ws = &mut *self.workspace.borrow_mut();
        let num_nodes = element_assembler.num_nodes();
        let mut coo = coo_with_diagonal(num_nodes);

        for i in 0..element_assembler.num_elements() {
            ws.compute_element(element_assembler, i)?;
            push_element_matrix(&mut coo, &ws.element_global_nodes, &ws.element_matrix);
        }

        debug!(
            "Assembled {} elements into {} triplets over {} nodes",
            element_assembler.num_elements(),
            coo.nnz(),
            num_nodes
        );
        Ok(CsrMatrix::from(&coo))
    }
}

/// A parallel assembler for CSR matrices.
///
/// Element matrices are computed in parallel and collected in element order. The triplets are
/// then pushed serially, so the result is identical to the one of [`CsrAssembler`].
#[derive(Debug, Clone)]
pub struct CsrParAssembler<T: Scalar> {
    marker: PhantomData<T>,
}

impl<T: Scalar> Default for CsrParAssembler<T> {
    fn default() -> Self {
        Self { marker: PhantomData }
    }
}

impl<T: RealField> CsrParAssembler<T> {
    pub fn assemble(
        &self,
        element_assembler: &(dyn Sync + ElementMatrixAssembler<T>),
    ) -> Result<CsrMatrix<T>, HeatError> {
        let num_nodes = element_assembler.num_nodes();
        let element_matrices = (0..element_assembler.num_elements())
            .into_par_iter()
            .with_min_len(64)
            .map_init(CsrAssemblerWorkspace::default, |ws, i| -> Result<_, HeatError> {
                ws.compute_element(element_assembler, i)?;
                Ok((ws.element_global_nodes.clone(), ws.element_matrix.clone()))
            })
            .collect::<Result<Vec<_>, HeatError>>()?;

        let mut coo = coo_with_diagonal(num_nodes);
        for (global_nodes, element_matrix) in &element_matrices {
            push_element_matrix(&mut coo, global_nodes, element_matrix);
        }

        debug!(
            "Assembled {} elements in parallel into {} triplets over {} nodes",
            element_matrices.len(),
            coo.nnz(),
            num_nodes
        );
        Ok(CsrMatrix::from(&coo))
    }
}

/// Assembles a global vector by adding up element vectors.
pub fn assemble_vector<T: RealField>(element_assembler: &dyn ElementVectorAssembler<T>) -> Result<DVector<T>, HeatError> {
    let num_nodes = element_assembler.num_nodes();
    let mut output = DVector::zeros(num_nodes);
    let mut element_nodes = Vec::new();
    let mut element_vector = DVector::zeros(0);

    for i in 0..element_assembler.num_elements() {
        let node_count = element_assembler.element_node_count(i);
        element_nodes.resize(node_count, 0);
        element_vector.resize_vertically_mut(node_count, T::zero());
        element_vector.fill(T::zero());

        element_assembler.populate_element_nodes(&mut element_nodes, i);
        element_assembler.assemble_element_vector_into(i, DVectorViewMut::from(&mut element_vector))?;

        for (local, &global) in element_nodes.iter().enumerate() {
            let entry = output
                .get_mut(global)
                .ok_or_else(|| HeatError::node_out_of_bounds(global, num_nodes))?;
            *entry += element_vector[local].clone();
        }
    }
    Ok(output)
}

/// Whether element matrices are computed on the calling thread or on the rayon thread pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStrategy {
    Serial,
    #[default]
    Parallel,
}

/// Assembles the conductance matrix and the load vector of a triangle mesh.
///
/// The load vector is zero unless a heat source is given.
pub fn assemble_conduction_system<T: RealField>(
    mesh: &TriangleMesh2d<T>,
    conductivity: &Conductivity<T>,
    source: Option<&HeatSource<T>>,
    strategy: AssemblyStrategy,
) -> Result<GlobalSystem<T>, HeatError> {
    let element_assembler = ElementConductionAssembler::try_new(mesh, conductivity)?;
    let matrix = match strategy {
        AssemblyStrategy::Serial => CsrAssembler::default().assemble(&element_assembler)?,
        AssemblyStrategy::Parallel => CsrParAssembler::default().assemble(&element_assembler)?,
    };

    let rhs = match source {
        Some(source) => assemble_vector(&ElementSourceAssembler::try_new(mesh, source)?)?,
        None => DVector::zeros(mesh.num_vertices()),
    };

    debug!(
        "Conduction system: {} nodes, {} stored entries",
        matrix.nrows(),
        matrix.nnz()
    );
    Ok(GlobalSystem::from_parts_unchecked(matrix, rhs))
}
