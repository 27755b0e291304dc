use crate::element::Tri3d2Element;
use crate::error::HeatError;
use crate::geometry::LineSegment2d;
use nalgebra::{Point2, Scalar};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::ops::{Deref, DerefMut};

pub trait Connectivity: Clone {
    type FaceConnectivity: Connectivity;

    fn num_faces(&self) -> usize;
    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity>;

    fn vertex_indices(&self) -> &[usize];
}

impl Connectivity for () {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        const EMPTY_SLICE: &[usize] = &[];
        EMPTY_SLICE
    }
}

pub trait ConnectivityMut: Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize];
}

/// Connectivity that can be turned into a geometric cell given the mesh vertices.
pub trait CellConnectivity<T: Scalar>: Connectivity {
    type Cell;

    /// Returns `None` if any vertex index is out of bounds.
    fn cell(&self, vertices: &[Point2<T>]) -> Option<Self::Cell>;
}

/// One of the three edges of a linear triangle.
///
/// Edges carry the 1-based ids used by boundary condition descriptions. Each edge maps to an
/// ordered pair of local vertex indices:
///
/// ```text
/// 2
/// |`\
/// |  `\
/// 3    2
/// |      `\
/// |        `\
/// 0----1-----1
/// ```
///
/// (vertices at the corners, edge ids along the sides)
///
/// | edge     | id | local vertices |
/// |----------|----|----------------|
/// | `First`  | 1  | (0, 1)         |
/// | `Second` | 2  | (1, 2)         |
/// | `Third`  | 3  | (2, 0)         |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum LocalEdge {
    First,
    Second,
    Third,
}

impl LocalEdge {
    pub const ALL: [LocalEdge; 3] = [LocalEdge::First, LocalEdge::Second, LocalEdge::Third];

    /// Parses a 1-based edge id.
    pub fn from_id(id: usize) -> Result<Self, HeatError> {
        match id {
            1 => Ok(LocalEdge::First),
            2 => Ok(LocalEdge::Second),
            3 => Ok(LocalEdge::Third),
            _ => Err(HeatError::InvalidEdgeId(id)),
        }
    }

    /// The 1-based edge id.
    pub fn id(&self) -> usize {
        self.index() + 1
    }

    /// The 0-based position of the edge among the faces of a triangle.
    pub fn index(&self) -> usize {
        match self {
            LocalEdge::First => 0,
            LocalEdge::Second => 1,
            LocalEdge::Third => 2,
        }
    }

    pub fn local_vertices(&self) -> [usize; 2] {
        match self {
            LocalEdge::First => [0, 1],
            LocalEdge::Second => [1, 2],
            LocalEdge::Third => [2, 0],
        }
    }
}

impl TryFrom<usize> for LocalEdge {
    type Error = HeatError;

    fn try_from(id: usize) -> Result<Self, Self::Error> {
        LocalEdge::from_id(id)
    }
}

impl From<LocalEdge> for usize {
    fn from(edge: LocalEdge) -> Self {
        edge.id()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment2d2Connectivity(pub [usize; 2]);

impl Connectivity for Segment2d2Connectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Segment2d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl<T> CellConnectivity<T> for Segment2d2Connectivity
where
    T: Scalar,
{
    type Cell = LineSegment2d<T>;

    fn cell(&self, vertices: &[Point2<T>]) -> Option<Self::Cell> {
        let a = vertices.get(self.0[0]).cloned()?;
        let b = vertices.get(self.0[1]).cloned()?;
        Some(LineSegment2d::new(a, b))
    }
}

/// Connectivity for a two-dimensional Quad4 cell.
///
/// Only used as an intermediate representation for structured grids before they are split into
/// triangles.
///
/// ```text
/// 3_________2
/// |         |
/// |         |
/// |         |
/// 0_________1
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Quad4d2Connectivity {
    /// Splits the quad along the diagonal `1-3` into the triangles `(0, 1, 3)` and `(1, 2, 3)`.
    pub fn split_into_triangles(&self) -> [Tri3d2Connectivity; 2] {
        let [n0, n1, n2, n3] = self.0;
        [Tri3d2Connectivity([n0, n1, n3]), Tri3d2Connectivity([n1, n2, n3])]
    }
}

impl Deref for Quad4d2Connectivity {
    type Target = [usize; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Quad4d2Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Connectivity for Quad4d2Connectivity {
    type FaceConnectivity = Segment2d2Connectivity;

    fn num_faces(&self) -> usize {
        4
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let idx = &self.0;
        if index < 4 {
            Some(Segment2d2Connectivity([idx[index], idx[(index + 1) % 4]]))
        } else {
            None
        }
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Quad4d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

/// Connectivity for a two-dimensional Tri3 element.
///
/// Face `i` is the edge [`LocalEdge::ALL[i]`](LocalEdge::ALL).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

impl Tri3d2Connectivity {
    /// The global vertex indices of the given local edge, in local order.
    pub fn edge(&self, edge: LocalEdge) -> Segment2d2Connectivity {
        let [a, b] = edge.local_vertices();
        Segment2d2Connectivity([self.0[a], self.0[b]])
    }
}

impl Connectivity for Tri3d2Connectivity {
    type FaceConnectivity = Segment2d2Connectivity;

    fn num_faces(&self) -> usize {
        3
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        LocalEdge::ALL.get(index).map(|&edge| self.edge(edge))
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Tri3d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl<T> CellConnectivity<T> for Tri3d2Connectivity
where
    T: Scalar,
{
    type Cell = Tri3d2Element<T>;

    fn cell(&self, vertices: &[Point2<T>]) -> Option<Self::Cell> {
        Some(Tri3d2Element::from_vertices([
            vertices.get(self.0[0]).cloned()?,
            vertices.get(self.0[1]).cloned()?,
            vertices.get(self.0[2]).cloned()?,
        ]))
    }
}

impl Deref for Tri3d2Connectivity {
    type Target = [usize; 3];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Tri3d2Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
