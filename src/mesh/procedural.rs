//! Basic procedural mesh generation routines.
use crate::connectivity::Quad4d2Connectivity;
use crate::geometry::AxisAlignedBoundingBox2d;
use crate::mesh::{QuadMesh2d, TriangleMesh2d};
use log::debug;
use nalgebra::{Point2, RealField};
use numeric_literals::replace_float_literals;

pub fn create_unit_square_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> TriangleMesh2d<T>
where
    T: RealField,
{
    create_rectangular_uniform_quad_mesh_2d(T::one(), T::one(), cells_per_dim, cells_per_dim).split_into_triangles()
}

/// Generates a uniform quad grid covering `[0, width] x [0, height]` with `num_cells_x` by
/// `num_cells_y` cells.
pub fn create_rectangular_uniform_quad_mesh_2d<T>(
    width: T,
    height: T,
    num_cells_x: usize,
    num_cells_y: usize,
) -> QuadMesh2d<T>
where
    T: RealField,
{
    create_rectangular_quad_mesh_with_hole_2d(width, height, num_cells_x, num_cells_y, None)
}

/// Generates a uniform quad grid covering `[0, width] x [0, height]`, leaving out every cell
/// whose center lies strictly inside `hole`.
///
/// Vertex `(i, j)` sits at `(i dx, j dy)` and has index `j (num_cells_x + 1) + i`. All grid
/// vertices are kept, including the ones that no cell references any longer; use
/// [`Mesh2d::compact`](crate::mesh::Mesh2d::compact) to remove them. Cell `(i, j)` has the
/// connectivity `[(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)]` and cells are ordered row by
/// row from the bottom.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn create_rectangular_quad_mesh_with_hole_2d<T>(
    width: T,
    height: T,
    num_cells_x: usize,
    num_cells_y: usize,
    hole: Option<&AxisAlignedBoundingBox2d<T>>,
) -> QuadMesh2d<T>
where
    T: RealField,
{
    if num_cells_x == 0 || num_cells_y == 0 {
        return QuadMesh2d::from_vertices_and_connectivity_unchecked(Vec::new(), Vec::new());
    }

    let to_t = |n: usize| T::from_usize(n).expect("Must be able to fit usize in T");
    let dx = width / to_t(num_cells_x);
    let dy = height / to_t(num_cells_y);
    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;

    let to_global_vertex_index = |i, j| num_vertices_x * j + i;

    let mut vertices = Vec::with_capacity(num_vertices_x * num_vertices_y);
    for j in 0..num_vertices_y {
        for i in 0..num_vertices_x {
            vertices.push(Point2::new(to_t(i) * dx.clone(), to_t(j) * dy.clone()));
        }
    }

    let mut cells = Vec::with_capacity(num_cells_x * num_cells_y);
    let mut num_skipped = 0;
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            let center = Point2::new((to_t(i) + 0.5) * dx.clone(), (to_t(j) + 0.5) * dy.clone());
            if hole.map_or(false, |hole| hole.contains_point(&center)) {
                num_skipped += 1;
                continue;
            }
            cells.push(Quad4d2Connectivity([
                to_global_vertex_index(i, j),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i + 1, j + 1),
                to_global_vertex_index(i, j + 1),
            ]));
        }
    }

    debug!(
        "Generated {}x{} grid with {} cells ({} skipped inside hole)",
        num_cells_x,
        num_cells_y,
        cells.len(),
        num_skipped
    );

    QuadMesh2d::from_vertices_and_connectivity_unchecked(vertices, cells)
}

/// Triangulated version of [`create_rectangular_quad_mesh_with_hole_2d`].
///
/// Each surviving cell contributes two triangles, so the mesh has
/// `2 (num_cells_x num_cells_y - skipped cells)` elements.
pub fn create_rectangular_tri_mesh_with_hole_2d<T>(
    width: T,
    height: T,
    num_cells_x: usize,
    num_cells_y: usize,
    hole: Option<&AxisAlignedBoundingBox2d<T>>,
) -> TriangleMesh2d<T>
where
    T: RealField,
{
    create_rectangular_quad_mesh_with_hole_2d(width, height, num_cells_x, num_cells_y, hole).split_into_triangles()
}
