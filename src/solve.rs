//! Direct solvers for assembled conduction systems.
use crate::assembly::LinearSystem;
use crate::error::HeatError;
use log::debug;
use nalgebra::{convert, DMatrix, DVector, RealField};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolver {
    /// Sparse Cholesky factorization. Requires a symmetric positive definite matrix, which every
    /// properly constrained conduction system is.
    #[default]
    SparseCholesky,
    /// Dense LU factorization with partial pivoting. Only suitable for small systems.
    DenseLu,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub solver: LinearSolver,
    /// Smallest admissible ratio between a pivot of the factorization and the largest magnitude in
    /// its column of the unfactored matrix.
    pub pivot_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            solver: LinearSolver::default(),
            pivot_tolerance: 1e-12,
        }
    }
}

impl SolverSettings {
    pub fn with_solver(self, solver: LinearSolver) -> Self {
        Self { solver, ..self }
    }

    pub fn with_pivot_tolerance(self, pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance, ..self }
    }
}

/// Solves `K u = f` and returns the nodal temperatures.
///
/// # Errors
///
/// [`HeatError::SingularSystem`] if the factorization fails, a pivot is small relative to the
/// largest entry of its column, or the solution is not finite. This happens in particular for parts of the
/// mesh without any prescribed temperature or convective boundary.
pub fn solve_system<T, S>(system: S, settings: &SolverSettings) -> Result<DVector<T>, HeatError>
where
    T: RealField,
    S: LinearSystem<T>,
{
    let (matrix, rhs) = system.into_parts();
    if rhs.is_empty() {
        return Ok(rhs);
    }
    let tolerance: T = convert(settings.pivot_tolerance);

    let solution = match settings.solver {
        LinearSolver::SparseCholesky => solve_sparse_cholesky(&matrix, &rhs, tolerance)?,
        LinearSolver::DenseLu => solve_dense_lu(&matrix, &rhs, tolerance)?,
    };

    if solution.iter().any(|value| !value.is_finite()) {
        return Err(HeatError::SingularSystem("solution contains non-finite values".to_string()));
    }
    debug!("Solved system with {} unknowns using {:?}", rhs.len(), settings.solver);
    Ok(solution)
}

/// Largest magnitude in each column of `matrix`.
fn column_scales<T: RealField>(matrix: &CsrMatrix<T>) -> Vec<T> {
    let mut scales = vec![T::zero(); matrix.ncols()];
    for (_, j, value) in matrix.triplet_iter() {
        scales[j] = scales[j].clone().max(value.clone().abs());
    }
    scales
}

/// Checks every pivot against the scale of its own column in the unfactored matrix.
fn check_pivots<T: RealField>(pivots: impl Iterator<Item = T>, scales: &[T], tolerance: T) -> Result<(), HeatError> {
    for (column, (pivot, scale)) in pivots.zip(scales).enumerate() {
        let pivot = pivot.abs();
        if !(pivot > tolerance.clone() * scale.clone()) {
            return Err(HeatError::SingularSystem(format!(
                "pivot {pivot:?} of column {column} is negligible compared to the column scale {scale:?}"
            )));
        }
    }
    Ok(())
}

fn solve_sparse_cholesky<T: RealField>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    tolerance: T,
) -> Result<DVector<T>, HeatError> {
    let csc = CscMatrix::from(matrix);
    let cholesky = CscCholesky::factor(&csc)
        .map_err(|err| HeatError::SingularSystem(format!("Cholesky factorization failed: {err}")))?;

    // The pivots of the factorization K = L Lᵀ are the squared diagonal entries of L
    let mut pivots = vec![T::zero(); matrix.nrows()];
    for (i, j, l_ij) in cholesky.l().triplet_iter() {
        if i == j {
            pivots[j] = l_ij.clone() * l_ij.clone();
        }
    }
    check_pivots(pivots.into_iter(), &column_scales(matrix), tolerance)?;

    let u = cholesky.solve(rhs);
    Ok(u.column(0).into_owned())
}

fn solve_dense_lu<T: RealField>(matrix: &CsrMatrix<T>, rhs: &DVector<T>, tolerance: T) -> Result<DVector<T>, HeatError> {
    let lu = DMatrix::from(matrix).lu();
    // Partial pivoting permutes rows only, so pivot j still belongs to column j
    check_pivots(lu.u().diagonal().iter().cloned(), &column_scales(matrix), tolerance)?;
    lu.solve(rhs)
        .ok_or_else(|| HeatError::SingularSystem("LU factorization has a zero pivot".to_string()))
}
