//! Error types for the heat conduction pipeline.
use thiserror::Error;

/// Errors raised by the element kernel, mesh processing, assembly, boundary conditions and the
/// linear solver.
///
/// Every variant is fatal for the analysis run in which it occurs. Operations that mutate a
/// global system validate all of their input before the first mutation, so an `Err` never
/// leaves a partially modified system behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeatError {
    /// The triangle has zero area (collinear or coincident vertices).
    #[error("degenerate triangle{}: signed area {area:e}", element_suffix(.element))]
    DegenerateElement { element: Option<usize>, area: f64 },

    /// A local edge id outside `{1, 2, 3}`.
    #[error("invalid local edge id {0}, expected one of 1, 2, 3")]
    InvalidEdgeId(usize),

    #[error("mesh integrity violation: {0}")]
    MeshIntegrity(String),

    /// The linear system could not be factored.
    #[error("singular system: {0}")]
    SingularSystem(String),

    #[error("invalid conductivity {value} for element {element}, must be finite and positive")]
    InvalidConductivity { element: usize, value: f64 },

    #[error("dimension mismatch: expected {expected} {what}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("matrix is not symmetric: entry ({row}, {col}) differs from its transpose")]
    AsymmetricMatrix { row: usize, col: usize },
}

impl HeatError {
    /// Attaches an element index to a [`HeatError::DegenerateElement`] raised by the element
    /// kernel. Other variants are returned unchanged.
    pub fn in_element(self, index: usize) -> Self {
        match self {
            HeatError::DegenerateElement { area, .. } => HeatError::DegenerateElement {
                element: Some(index),
                area,
            },
            other => other,
        }
    }

    pub(crate) fn vertex_out_of_bounds(cell: usize, vertex: usize, num_vertices: usize) -> Self {
        HeatError::MeshIntegrity(format!(
            "cell {cell} references vertex {vertex}, but the mesh only has {num_vertices} vertices"
        ))
    }

    pub(crate) fn element_out_of_bounds(element: usize, num_elements: usize) -> Self {
        HeatError::MeshIntegrity(format!(
            "element {element} referenced, but the mesh only has {num_elements} elements"
        ))
    }

    pub(crate) fn node_out_of_bounds(node: usize, num_nodes: usize) -> Self {
        HeatError::MeshIntegrity(format!(
            "node {node} referenced, but the system only has {num_nodes} nodes"
        ))
    }
}

fn element_suffix(element: &Option<usize>) -> String {
    element
        .map(|index| format!(" (element {index})"))
        .unwrap_or_default()
}
