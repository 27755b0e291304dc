//! Linear triangle element and the element-local conduction kernel.
use crate::connectivity::LocalEdge;
use crate::error::HeatError;
use crate::geometry::LineSegment2d;
use nalgebra::{try_convert, Matrix2x3, Matrix3, Point2, RealField, Scalar, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// A linear (three-node) triangle in the plane.
///
/// The basis functions are the barycentric coordinates of the triangle, so their gradients are
/// constant over the element. Vertex order determines the sign of [`signed_area`](Self::signed_area),
/// but none of the element quantities depend on the orientation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tri3d2Element<T: Scalar> {
    vertices: [Point2<T>; 3],
}

impl<T: Scalar> Tri3d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 3] {
        &self.vertices
    }

    pub fn edge(&self, edge: LocalEdge) -> LineSegment2d<T> {
        let [a, b] = edge.local_vertices();
        LineSegment2d::new(self.vertices[a].clone(), self.vertices[b].clone())
    }
}

impl<T: RealField> Tri3d2Element<T> {
    /// Signed area, positive for counter-clockwise vertex order.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn signed_area(&self) -> T {
        let [a, b, c] = &self.vertices;
        let ab = b - a;
        let ac = c - a;
        0.5 * ab.perp(&ac)
    }

    pub fn area(&self) -> T {
        self.signed_area().abs()
    }

    pub fn edge_length(&self, edge: LocalEdge) -> T {
        self.edge(edge).length()
    }

    /// Returns the signed area, or an error if the triangle is degenerate.
    ///
    /// The area is compared against the product of two edge lengths, so that the test is
    /// independent of the scale of the coordinates. Only areas that vanish up to rounding are
    /// rejected.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn try_signed_area(&self) -> Result<T, HeatError> {
        let area = self.signed_area();
        let [a, b, c] = &self.vertices;
        let scale = (b - a).norm() * (c - a).norm();
        let tolerance = 4.0 * T::default_epsilon() * scale;
        if !area.is_finite() || area.clone().abs() <= tolerance {
            Err(HeatError::DegenerateElement {
                element: None,
                area: try_convert(area).unwrap_or(f64::NAN),
            })
        } else {
            Ok(area)
        }
    }

    /// The constant gradient operator `B` (2x3), whose column `i` is the gradient of the basis
    /// function of local node `i`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradient_operator(&self) -> Result<Matrix2x3<T>, HeatError> {
        let area = self.try_signed_area()?;
        let [p1, p2, p3] = &self.vertices;
        // Column i is the edge opposite to node i rotated by -90 degrees, i.e. (y_j - y_k, x_k - x_j)
        let opposite_edges = [p3 - p2, p1 - p3, p2 - p1];
        let b = Matrix2x3::from_fn(|row, col| {
            let edge = &opposite_edges[col];
            if row == 0 {
                -edge.y.clone()
            } else {
                edge.x.clone()
            }
        });
        Ok(b / (2.0 * area))
    }

    /// Element conductance matrix `K_e = k |A| BᵀB`.
    ///
    /// The result is symmetric and every row sums to zero, so a constant temperature field
    /// produces no nodal heat flow.
    pub fn stiffness_matrix(&self, conductivity: T) -> Result<Matrix3<T>, HeatError> {
        let b = self.gradient_operator()?;
        Ok(b.transpose() * b * (conductivity * self.area()))
    }

    /// Consistent load vector of a uniform volumetric heat source `q`: each node receives
    /// `q |A| / 3`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn source_vector(&self, q: T) -> Result<Vector3<T>, HeatError> {
        let area = self.try_signed_area()?.abs();
        Ok(Vector3::repeat(q * area / 3.0))
    }
}
