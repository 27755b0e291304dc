//! Extraction and geometric classification of the boundary edges of triangle meshes.
use crate::connectivity::LocalEdge;
use crate::error::HeatError;
use crate::geometry::AxisAlignedBoundingBox2d;
use crate::mesh::{TriangleMesh2d, VertexRelabeling};
use itertools::Itertools;
use log::debug;
use nalgebra::{convert, RealField, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An edge that belongs to exactly one triangle of a mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoundaryEdge {
    /// Global vertex indices, sorted in ascending order.
    pub vertices: [usize; 2],
    /// Index of the owning element.
    pub element: usize,
    pub local_edge: LocalEdge,
}

impl BoundaryEdge {
    pub fn new(a: usize, b: usize, element: usize, local_edge: LocalEdge) -> Self {
        Self {
            vertices: [a.min(b), a.max(b)],
            element,
            local_edge,
        }
    }

    pub fn relabel(&self, relabeling: &VertexRelabeling) -> Result<Self, HeatError> {
        let [a, b] = self.vertices;
        Ok(Self::new(
            relabeling.try_new_index(a)?,
            relabeling.try_new_index(b)?,
            self.element,
            self.local_edge,
        ))
    }
}

impl<T: Scalar> TriangleMesh2d<T> {
    /// All edges owned by exactly one triangle, ordered by their vertex indices.
    pub fn find_boundary_edges(&self) -> Result<Vec<BoundaryEdge>, HeatError> {
        self.find_boundary_faces()?
            .into_iter()
            .map(|(segment, element, local_index)| {
                let [a, b] = segment.0;
                Ok(BoundaryEdge::new(a, b, element, LocalEdge::from_id(local_index + 1)?))
            })
            .collect()
    }
}

/// The part of the domain boundary an edge lies on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundarySide {
    /// `y = min y`
    Bottom,
    /// `x = max x`
    Right,
    /// `y = max y`
    Top,
    /// `x = min x`
    Left,
    /// Anything else, such as the perimeter of a hole.
    Inner,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 5] = [
        BoundarySide::Bottom,
        BoundarySide::Right,
        BoundarySide::Top,
        BoundarySide::Left,
        BoundarySide::Inner,
    ];

    fn index(&self) -> usize {
        match self {
            BoundarySide::Bottom => 0,
            BoundarySide::Right => 1,
            BoundarySide::Top => 2,
            BoundarySide::Left => 3,
            BoundarySide::Inner => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BoundarySide::Bottom => "bottom",
            BoundarySide::Right => "right",
            BoundarySide::Top => "top",
            BoundarySide::Left => "left",
            BoundarySide::Inner => "inner",
        }
    }
}

impl fmt::Display for BoundarySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Absolute tolerance used to decide whether a coordinate lies on one of the sides of the
/// bounding box.
///
/// The tolerance is absolute, so it must be chosen relative to the size of the domain.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationTolerance {
    pub absolute: f64,
}

impl Default for ClassificationTolerance {
    fn default() -> Self {
        Self { absolute: 1e-10 }
    }
}

impl ClassificationTolerance {
    pub fn new(absolute: f64) -> Self {
        Self { absolute }
    }
}

/// Boundary edges partitioned by [`BoundarySide`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEdgeGroups {
    groups: [Vec<BoundaryEdge>; 5],
}

impl BoundaryEdgeGroups {
    /// Classifies each edge against the bounding box of the mesh.
    ///
    /// An edge belongs to a side if both of its endpoints are closer than the tolerance to the
    /// corresponding line of the bounding box. The sides are tried in the order of
    /// [`BoundarySide::ALL`], so an edge lands in exactly one group.
    pub fn classify<T: RealField>(
        mesh: &TriangleMesh2d<T>,
        edges: &[BoundaryEdge],
        tolerance: &ClassificationTolerance,
    ) -> Result<Self, HeatError> {
        let mut groups = Self::default();
        let Some(bounds) = mesh.bounding_box() else {
            return if edges.is_empty() {
                Ok(groups)
            } else {
                Err(HeatError::MeshIntegrity("boundary edges given for a mesh without vertices".to_string()))
            };
        };
        let tolerance: T = convert(tolerance.absolute);

        for edge in edges {
            let [a, b] = edge.vertices;
            let num_vertices = mesh.num_vertices();
            let (pa, pb) = match (mesh.vertices().get(a), mesh.vertices().get(b)) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => return Err(HeatError::node_out_of_bounds(a.max(b), num_vertices)),
            };
            let xs = [pa.x.clone(), pb.x.clone()];
            let ys = [pa.y.clone(), pb.y.clone()];
            let side = classify_segment(&bounds, xs, ys, &tolerance);
            groups.groups[side.index()].push(*edge);
        }

        debug!(
            "Classified {} boundary edges: {}",
            edges.len(),
            BoundarySide::ALL
                .iter()
                .map(|side| format!("{side}={}", groups.edges(*side).len()))
                .join(", ")
        );
        Ok(groups)
    }

    pub fn edges(&self, side: BoundarySide) -> &[BoundaryEdge] {
        &self.groups[side.index()]
    }

    /// Sorted, de-duplicated vertex indices touched by the edges of one side.
    pub fn nodes(&self, side: BoundarySide) -> Vec<usize> {
        self.edges(side)
            .iter()
            .flat_map(|edge| edge.vertices)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (BoundarySide, &[BoundaryEdge])> {
        BoundarySide::ALL
            .into_iter()
            .map(move |side| (side, self.edges(side)))
    }

    pub fn num_edges(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Relabels the vertices of every edge. Element indices are left untouched, which is
    /// correct for relabelings produced by [`Mesh2d::compact`](crate::mesh::Mesh2d::compact).
    pub fn relabel(&self, relabeling: &VertexRelabeling) -> Result<Self, HeatError> {
        let mut relabeled = Self::default();
        for (side, edges) in self.iter() {
            relabeled.groups[side.index()] = edges
                .iter()
                .map(|edge| edge.relabel(relabeling))
                .collect::<Result<_, _>>()?;
        }
        Ok(relabeled)
    }
}

fn classify_segment<T: RealField>(
    bounds: &AxisAlignedBoundingBox2d<T>,
    xs: [T; 2],
    ys: [T; 2],
    tolerance: &T,
) -> BoundarySide {
    let on_line = |coords: &[T; 2], value: &T| {
        coords
            .iter()
            .all(|coord| (coord.clone() - value.clone()).abs() < *tolerance)
    };
    let (min, max) = (bounds.min(), bounds.max());
    if on_line(&ys, &min.y) {
        BoundarySide::Bottom
    } else if on_line(&xs, &max.x) {
        BoundarySide::Right
    } else if on_line(&ys, &max.y) {
        BoundarySide::Top
    } else if on_line(&xs, &min.x) {
        BoundarySide::Left
    } else {
        BoundarySide::Inner
    }
}
