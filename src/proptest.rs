use crate::element::Tri3d2Element;
use crate::geometry::AxisAlignedBoundingBox2d;
use crate::mesh::procedural::create_rectangular_tri_mesh_with_hole_2d;
use crate::mesh::TriangleMesh2d;
use ::proptest::prelude::*;
use nalgebra::{Point2, Vector2};

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Pick a reasonably small range to pick coordinates from,
    // otherwise we can easily get floating point numbers that are
    // so ridiculously large as to break anything we might want to do with them
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

/// Triangles whose area is not small compared to the square of their longest edge.
pub fn nondegenerate_triangle_strategy() -> impl Strategy<Value = Tri3d2Element<f64>> {
    [point2(), point2(), point2()]
        .prop_map(Tri3d2Element::from_vertices)
        .prop_filter("triangle must be well shaped", |element| {
            let longest = (0..3)
                .map(|i| {
                    let [a, b] = [element.vertices()[i], element.vertices()[(i + 1) % 3]];
                    (b - a).norm()
                })
                .fold(0.0, f64::max);
            element.area() > 1e-2 * longest * longest
        })
}

impl Arbitrary for Tri3d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        nondegenerate_triangle_strategy().boxed()
    }
}

/// Parameters of a rectangular grid with an optional rectangular hole.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWithHole {
    pub width: f64,
    pub height: f64,
    pub num_cells_x: usize,
    pub num_cells_y: usize,
    pub hole: Option<AxisAlignedBoundingBox2d<f64>>,
}

impl GridWithHole {
    pub fn build(&self) -> TriangleMesh2d<f64> {
        create_rectangular_tri_mesh_with_hole_2d(
            self.width,
            self.height,
            self.num_cells_x,
            self.num_cells_y,
            self.hole.as_ref(),
        )
    }
}

/// Grids with at most `max_cells_per_dim` cells per direction. The hole, if any, lies inside the
/// rectangle, with corners given as fractions of the rectangle extents.
pub fn grid_with_hole_strategy(max_cells_per_dim: usize) -> impl Strategy<Value = GridWithHole> {
    let extent = 0.1..10.0;
    let fraction = 0.0..1.0;
    (
        extent.clone(),
        extent,
        1..=max_cells_per_dim,
        1..=max_cells_per_dim,
        prop::option::of([fraction.clone(), fraction.clone(), fraction.clone(), fraction]),
    )
        .prop_map(|(width, height, num_cells_x, num_cells_y, hole)| {
            let hole = hole.map(|[x0, x1, y0, y1]: [f64; 4]| {
                AxisAlignedBoundingBox2d::new(
                    Vector2::new(width * x0.min(x1), height * y0.min(y1)),
                    Vector2::new(width * x0.max(x1), height * y0.max(y1)),
                )
            });
            GridWithHole {
                width,
                height,
                num_cells_x,
                num_cells_y,
                hole,
            }
        })
}
