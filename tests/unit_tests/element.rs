use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_matrix_eq};
use nalgebra::{Matrix2x3, Matrix3, Point2, Vector2, Vector3};
use proptest::prelude::*;
use semfe::connectivity::LocalEdge;
use semfe::element::Tri3d2Element;
use semfe::error::HeatError;
use util::assert_approx_matrix_eq;

fn reference_triangle() -> Tri3d2Element<f64> {
    Tri3d2Element::from_vertices([Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)])
}

#[test]
fn tri3d2_area_and_edge_lengths() {
    let element = reference_triangle();
    assert_scalar_eq!(element.signed_area(), 0.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(element.area(), 0.5, comp = abs, tol = 1e-14);

    assert_scalar_eq!(element.edge_length(LocalEdge::First), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(element.edge_length(LocalEdge::Second), 2.0f64.sqrt(), comp = abs, tol = 1e-14);
    assert_scalar_eq!(element.edge_length(LocalEdge::Third), 1.0, comp = abs, tol = 1e-14);

    // Reversing the orientation flips the sign of the area only
    let [a, b, c] = *element.vertices();
    let clockwise = Tri3d2Element::from_vertices([a, c, b]);
    assert_scalar_eq!(clockwise.signed_area(), -0.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(clockwise.area(), 0.5, comp = abs, tol = 1e-14);
}

#[test]
fn tri3d2_gradient_operator_reference_triangle() {
    let b = reference_triangle().gradient_operator().unwrap();
    #[rustfmt::skip]
    let expected = Matrix2x3::new(
        -1.0, 1.0, 0.0,
        -1.0, 0.0, 1.0,
    );
    assert_matrix_eq!(b, expected, comp = abs, tol = 1e-14);
}

#[test]
fn tri3d2_stiffness_matrix_reference_triangle() {
    let element = reference_triangle();
    let k = element.stiffness_matrix(1.0).unwrap();

    #[rustfmt::skip]
    let expected = Matrix3::new(
         1.0, -0.5, -0.5,
        -0.5,  0.5,  0.0,
        -0.5,  0.0,  0.5,
    );
    assert_approx_matrix_eq!(k, expected, abstol = 1e-14);

    // Conductivity scales the matrix linearly
    let k3 = element.stiffness_matrix(3.0).unwrap();
    assert_approx_matrix_eq!(k3, expected * 3.0, abstol = 1e-13);
}

#[test]
fn tri3d2_stiffness_matrix_does_not_depend_on_orientation() {
    let element = reference_triangle();
    let [a, b, c] = *element.vertices();
    let clockwise = Tri3d2Element::from_vertices([a, c, b]);

    let k = element.stiffness_matrix(2.0).unwrap();
    let k_cw = clockwise.stiffness_matrix(2.0).unwrap();

    // Swapping local nodes 1 and 2 permutes rows and columns accordingly
    let permutation = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0);
    assert_approx_matrix_eq!(k_cw, permutation * k * permutation, abstol = 1e-14);
    assert!(k_cw.diagonal().iter().all(|&k_ii| k_ii > 0.0));
}

#[test]
fn tri3d2_source_vector_distributes_evenly() {
    let element = Tri3d2Element::from_vertices([Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 3.0)]);
    let f = element.source_vector(6.0).unwrap();
    // Area 3, so each node receives 6 * 3 / 3
    assert_matrix_eq!(f, Vector3::repeat(6.0), comp = abs, tol = 1e-13);
}

#[test]
fn tri3d2_degenerate_triangles_are_rejected() {
    let collinear =
        Tri3d2Element::from_vertices([Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)]);
    assert!(matches!(
        collinear.stiffness_matrix(1.0),
        Err(HeatError::DegenerateElement { element: None, .. })
    ));
    assert!(collinear.source_vector(1.0).is_err());

    let coincident =
        Tri3d2Element::from_vertices([Point2::new(1.0, 1.0), Point2::new(1.0, 1.0), Point2::new(0.0, 3.0)]);
    assert!(coincident.gradient_operator().is_err());

    let error = collinear.try_signed_area().unwrap_err().in_element(7);
    assert!(matches!(error, HeatError::DegenerateElement { element: Some(7), .. }));
}

#[test]
fn tri3d2_tiny_but_valid_triangles_are_accepted() {
    let scale = 1e-6;
    let element = Tri3d2Element::from_vertices([
        Point2::new(0.0, 0.0),
        Point2::new(scale, 0.0),
        Point2::new(0.0, scale),
    ]);
    // The conductance matrix is invariant under uniform scaling in 2D
    let k = element.stiffness_matrix(1.0).unwrap();
    let k_ref = reference_triangle().stiffness_matrix(1.0).unwrap();
    assert_approx_matrix_eq!(k, k_ref, abstol = 1e-9);
}

proptest! {
    #[test]
    fn tri3d2_stiffness_matrix_is_symmetric_with_zero_row_sums(element in any::<Tri3d2Element<f64>>(), k in 0.1..10.0) {
        let matrix = element.stiffness_matrix(k).unwrap();
        let scale = matrix.amax();
        prop_assert_matrix_eq!(matrix, matrix.transpose(), comp = abs, tol = 1e-12 * scale);

        let row_sums = matrix * Vector3::repeat(1.0);
        prop_assert_matrix_eq!(row_sums, Vector3::<f64>::zeros(), comp = abs, tol = 1e-10 * scale);
    }

    #[test]
    fn tri3d2_stiffness_matrix_is_positive_semidefinite(
        element in any::<Tri3d2Element<f64>>(),
        u in [-10.0..10.0, -10.0..10.0, -10.0..10.0]
    ) {
        let matrix = element.stiffness_matrix(1.0).unwrap();
        let u = Vector3::from(u);
        let energy = u.dot(&(matrix * u));
        prop_assert!(energy >= -1e-10 * matrix.amax() * u.norm_squared());
    }

    #[test]
    fn tri3d2_gradients_reproduce_linear_fields(
        element in any::<Tri3d2Element<f64>>(),
        (a, gx, gy) in (-5.0..5.0f64, -5.0..5.0f64, -5.0..5.0f64)
    ) {
        // Nodal values of the field a + gx x + gy y
        let values = Vector3::from_iterator(element.vertices().iter().map(|p| a + gx * p.x + gy * p.y));
        let gradient: Vector2<f64> = element.gradient_operator().unwrap() * values;
        prop_assert!((gradient.x - gx).abs() <= 1e-8 * (1.0 + gx.abs()));
        prop_assert!((gradient.y - gy).abs() <= 1e-8 * (1.0 + gy.abs()));
    }
}
