use nalgebra::{DVector, RealField};
use nalgebra_sparse::CsrMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Sum of the stored values of each row.
pub fn csr_row_sums<T: RealField>(matrix: &CsrMatrix<T>) -> DVector<T> {
    DVector::from_iterator(
        matrix.nrows(),
        matrix
            .row_iter()
            .map(|row| row.values().iter().cloned().fold(T::zero(), |a, b| a + b)),
    )
}

/// Largest absolute difference between `A` and `Aᵀ`.
pub fn csr_asymmetry(matrix: &CsrMatrix<f64>) -> f64 {
    matrix
        .triplet_iter()
        .map(|(i, j, v_ij)| {
            let v_ji = matrix
                .get_entry(j, i)
                .map(|entry| entry.into_value())
                .unwrap_or(0.0);
            (v_ij - v_ji).abs()
        })
        .fold(0.0, f64::max)
}

/// Checks that two vectors agree entrywise to within `tol`, printing both on failure.
pub fn assert_vectors_close(actual: &DVector<f64>, expected: &DVector<f64>, tol: f64) {
    assert_eq!(actual.len(), expected.len(), "vector lengths differ");
    let max_absdiff = (actual - expected).abs().max();
    if max_absdiff > tol {
        println!("abstol: {:e}", tol);
        println!("actual: {}", actual);
        println!("expected: {}", expected);
    }
    assert!(max_absdiff <= tol, "max abs diff {:e} exceeds {:e}", max_absdiff, tol);
}
