use crate::connectivity::{CellConnectivity, Connectivity, ConnectivityMut, Quad4d2Connectivity, Tri3d2Connectivity};
use crate::error::HeatError;
use crate::geometry::AxisAlignedBoundingBox2d;
use log::debug;
use nalgebra::{Point2, RealField, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod boundary;
pub mod procedural;

/// Index-based data structure for conforming planar meshes (i.e. no hanging nodes).
///
/// Every vertex index referenced by the connectivity is guaranteed to be in bounds when the
/// mesh is built through [`try_from_vertices_and_connectivity`](Self::try_from_vertices_and_connectivity)
/// or any of the procedural generators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound(
    serialize = "T: Serialize, C: Serialize",
    deserialize = "T: Deserialize<'de>, C: Deserialize<'de>"
))]
pub struct Mesh2d<T: Scalar, C> {
    vertices: Vec<Point2<T>>,
    connectivity: Vec<C>,
}

pub type TriangleMesh2d<T> = Mesh2d<T, Tri3d2Connectivity>;
pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;

/// Ownership of each distinct face of a mesh.
///
/// Keys are the sorted vertex indices of a face, values list every `(cell index, local face index)`
/// that references the face. A `BTreeMap` keeps the iteration order deterministic.
pub type FaceOwners = BTreeMap<Vec<usize>, Vec<(usize, usize)>>;

impl<T: Scalar, C> Mesh2d<T, C> {
    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[C] {
        &self.connectivity
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len()
    }

    /// Construct a mesh without checking the connectivity.
    ///
    /// Only for generators that produce indices in bounds by construction.
    pub(crate) fn from_vertices_and_connectivity_unchecked(vertices: Vec<Point2<T>>, connectivity: Vec<C>) -> Self {
        Self { vertices, connectivity }
    }

    pub fn into_parts(self) -> (Vec<Point2<T>>, Vec<C>) {
        (self.vertices, self.connectivity)
    }
}

impl<T: Scalar, C: Connectivity> Mesh2d<T, C> {
    /// Construct a mesh from vertices and connectivity.
    ///
    /// Fails with [`HeatError::MeshIntegrity`] if any cell references a vertex index out of bounds.
    pub fn try_from_vertices_and_connectivity(
        vertices: Vec<Point2<T>>,
        connectivity: Vec<C>,
    ) -> Result<Self, HeatError> {
        for (cell_index, cell) in connectivity.iter().enumerate() {
            if let Some(&vertex) = cell
                .vertex_indices()
                .iter()
                .find(|&&vertex| vertex >= vertices.len())
            {
                return Err(HeatError::vertex_out_of_bounds(cell_index, vertex, vertices.len()));
            }
        }
        Ok(Self { vertices, connectivity })
    }

    /// Maps every face to the cells that contain it.
    pub fn find_face_owners(&self) -> FaceOwners {
        let mut owners = FaceOwners::new();
        for (cell_index, cell) in self.connectivity.iter().enumerate() {
            for local_index in 0..cell.num_faces() {
                if let Some(face) = cell.get_face_connectivity(local_index) {
                    let mut key = face.vertex_indices().to_vec();
                    key.sort_unstable();
                    owners
                        .entry(key)
                        .or_default()
                        .push((cell_index, local_index));
                }
            }
        }
        owners
    }

    /// Finds faces which are connected to exactly one cell, along with the connected cell
    /// index and the local index of the face within that cell.
    ///
    /// Faces are returned in the order of their sorted vertex indices. A face shared by more
    /// than two cells means that the mesh is not a manifold, which is reported as
    /// [`HeatError::MeshIntegrity`].
    pub fn find_boundary_faces(&self) -> Result<Vec<(C::FaceConnectivity, usize, usize)>, HeatError> {
        let owners = self.find_face_owners();
        let mut boundary_faces = Vec::new();
        for (vertices, face_owners) in &owners {
            match face_owners.as_slice() {
                &[(cell_index, local_index)] => {
                    // The key was produced from exactly this face, so it exists
                    if let Some(face) = self.connectivity[cell_index].get_face_connectivity(local_index) {
                        boundary_faces.push((face, cell_index, local_index));
                    }
                }
                [_, _] => {}
                _ => {
                    return Err(HeatError::MeshIntegrity(format!(
                        "face with vertices {vertices:?} is shared by {} cells",
                        face_owners.len()
                    )))
                }
            }
        }
        debug!(
            "Found {} boundary faces among {} distinct faces",
            boundary_faces.len(),
            owners.len()
        );
        Ok(boundary_faces)
    }

    /// Returns a sorted list of vertices that belong to at least one boundary face.
    pub fn find_boundary_vertices(&self) -> Result<Vec<usize>, HeatError> {
        let mut indices = Vec::new();
        for (face, _, _) in self.find_boundary_faces()? {
            indices.extend_from_slice(face.vertex_indices());
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }
}

impl<T, C> Mesh2d<T, C>
where
    T: Scalar,
    C: CellConnectivity<T>,
{
    pub fn get_cell(&self, index: usize) -> Option<C::Cell> {
        self.connectivity()
            .get(index)
            .and_then(|conn| conn.cell(self.vertices()))
    }

    pub fn cell_iter<'a>(&'a self) -> impl 'a + Iterator<Item = C::Cell> {
        self.connectivity().iter().map(move |connectivity| {
            connectivity
                .cell(&self.vertices)
                .expect("Mesh2d is not allowed to contain cells with indices out of bounds.")
        })
    }
}

impl<T: RealField, C> Mesh2d<T, C> {
    /// The smallest axis-aligned box containing all vertices, or `None` for a mesh without
    /// vertices.
    pub fn bounding_box(&self) -> Option<AxisAlignedBoundingBox2d<T>> {
        AxisAlignedBoundingBox2d::from_points(&self.vertices)
    }
}

/// Dense, order-preserving map from old to new vertex indices, produced when unreferenced
/// vertices are removed from a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRelabeling {
    old_to_new: Vec<Option<usize>>,
    num_kept: usize,
}

impl VertexRelabeling {
    /// Builds the relabeling that keeps exactly the vertices marked `true`, in their original
    /// order.
    pub fn from_keep_table(keep: &[bool]) -> Self {
        let mut next_label = 0;
        let old_to_new = keep
            .iter()
            .map(|&keep| {
                keep.then(|| {
                    next_label += 1;
                    next_label - 1
                })
            })
            .collect();
        Self {
            old_to_new,
            num_kept: next_label,
        }
    }

    /// The new index of an old vertex, or `None` if the vertex was removed or out of range.
    pub fn new_index(&self, old_index: usize) -> Option<usize> {
        self.old_to_new.get(old_index).copied().flatten()
    }

    /// Like [`new_index`](Self::new_index), but reports a removed vertex as an error.
    pub fn try_new_index(&self, old_index: usize) -> Result<usize, HeatError> {
        self.new_index(old_index).ok_or_else(|| {
            HeatError::MeshIntegrity(format!("vertex {old_index} does not survive the relabeling"))
        })
    }

    pub fn num_old(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn num_kept(&self) -> usize {
        self.num_kept
    }

    /// The old indices of the kept vertices, in new order.
    pub fn kept_old_indices(&self) -> Vec<usize> {
        self.old_to_new
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.map(|_| old))
            .collect()
    }
}

impl<T, C> Mesh2d<T, C>
where
    T: Scalar,
    C: ConnectivityMut,
{
    /// Returns a new mesh in which only the desired cells are kept, in the given order. Vertices
    /// that are no longer referenced are removed and the remaining vertices are relabeled
    /// without changing their relative order.
    pub fn keep_cells(&self, cell_indices: &[usize]) -> Result<(Self, VertexRelabeling), HeatError> {
        let mut keep = vec![false; self.vertices.len()];
        for &cell_index in cell_indices {
            let cell = self
                .connectivity
                .get(cell_index)
                .ok_or_else(|| HeatError::element_out_of_bounds(cell_index, self.connectivity.len()))?;
            for &vertex_index in cell.vertex_indices() {
                keep[vertex_index] = true;
            }
        }

        let relabeling = VertexRelabeling::from_keep_table(&keep);

        let mut relabeled_cells = Vec::with_capacity(cell_indices.len());
        for &cell_index in cell_indices {
            let mut cell = self.connectivity[cell_index].clone();
            for index in cell.vertex_indices_mut() {
                *index = relabeling.try_new_index(*index)?;
            }
            relabeled_cells.push(cell);
        }

        let relabeled_vertices = relabeling
            .kept_old_indices()
            .into_iter()
            .map(|index| self.vertices[index].clone())
            .collect();

        debug!(
            "Kept {} of {} cells and {} of {} vertices",
            cell_indices.len(),
            self.connectivity.len(),
            relabeling.num_kept(),
            self.vertices.len()
        );

        let mesh = Self::from_vertices_and_connectivity_unchecked(relabeled_vertices, relabeled_cells);
        Ok((mesh, relabeling))
    }

    /// Removes vertices that no cell references and renumbers the rest to `0..N`.
    ///
    /// Cells keep their indices and order.
    pub fn compact(&self) -> Result<(Self, VertexRelabeling), HeatError> {
        let all_cells: Vec<_> = (0..self.connectivity.len()).collect();
        self.keep_cells(&all_cells)
    }
}

impl<T: Scalar> QuadMesh2d<T> {
    /// Splits every quad `[n1, n2, n3, n4]` into the triangles `(n1, n2, n4)` and `(n2, n3, n4)`.
    ///
    /// Triangle `2i` and `2i + 1` stem from quad `i`.
    pub fn split_into_triangles(self) -> TriangleMesh2d<T> {
        let triangles = self
            .connectivity
            .iter()
            .flat_map(|quad| quad.split_into_triangles())
            .collect();
        TriangleMesh2d::from_vertices_and_connectivity_unchecked(self.vertices, triangles)
    }
}
