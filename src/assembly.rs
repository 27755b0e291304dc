//! Global conduction systems and their assembly.
//!
//! A [`GlobalSystem`] holds the conductance matrix `K` and the load vector `f` of a mesh. Natural
//! boundary conditions (heat flux and convection) transform a `GlobalSystem` into another
//! `GlobalSystem`, while prescribed temperatures turn it into a [`ConstrainedSystem`]. Only the
//! latter two can be handed to the [linear solver](crate::solve).
use crate::error::HeatError;
use nalgebra::{DVector, RealField, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix, SparseEntry};

pub mod boundary_conditions;
pub mod global;
pub mod local;

/// A square sparse system `K u = f`.
pub trait LinearSystem<T: Scalar> {
    fn matrix(&self) -> &CsrMatrix<T>;

    fn rhs(&self) -> &DVector<T>;

    fn num_nodes(&self) -> usize {
        self.rhs().len()
    }

    fn into_parts(self) -> (CsrMatrix<T>, DVector<T>);
}

/// Conductance matrix and load vector before any prescribed temperature has been imposed.
///
/// The matrix is square, matches the length of the load vector, is symmetric and stores every
/// diagonal entry explicitly (possibly as zero). Boundary conditions rely on the explicit
/// diagonal to modify the matrix without changing its sparsity pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem<T: Scalar> {
    matrix: CsrMatrix<T>,
    rhs: DVector<T>,
}

/// A system in which prescribed temperatures have been imposed.
///
/// It no longer accepts natural boundary conditions, since they would have to be applied before
/// the temperatures are prescribed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedSystem<T: Scalar> {
    matrix: CsrMatrix<T>,
    rhs: DVector<T>,
    constrained_nodes: Vec<usize>,
}

impl<T: Scalar> GlobalSystem<T> {
    pub(crate) fn from_parts_unchecked(matrix: CsrMatrix<T>, rhs: DVector<T>) -> Self {
        debug_assert_eq!(matrix.nrows(), rhs.len());
        Self { matrix, rhs }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut CsrMatrix<T>, &mut DVector<T>) {
        (&mut self.matrix, &mut self.rhs)
    }

    pub(crate) fn into_constrained(self, constrained_nodes: Vec<usize>) -> ConstrainedSystem<T> {
        ConstrainedSystem {
            matrix: self.matrix,
            rhs: self.rhs,
            constrained_nodes,
        }
    }
}

impl<T: RealField> GlobalSystem<T> {
    /// Builds a system from a user-supplied matrix and load vector.
    ///
    /// Missing diagonal entries are inserted as explicit zeros.
    ///
    /// # Errors
    ///
    /// - [`HeatError::DimensionMismatch`] if the matrix is not square or the vector length does
    ///   not match.
    /// - [`HeatError::AsymmetricMatrix`] if an entry differs from its transposed counterpart.
    pub fn from_parts(matrix: CsrMatrix<T>, rhs: DVector<T>) -> Result<Self, HeatError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(HeatError::DimensionMismatch {
                what: "matrix columns",
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        if rhs.len() != matrix.nrows() {
            return Err(HeatError::DimensionMismatch {
                what: "right-hand side entries",
                expected: matrix.nrows(),
                actual: rhs.len(),
            });
        }

        for (row, col, value) in matrix.triplet_iter() {
            let transposed = match matrix.get_entry(col, row) {
                Some(SparseEntry::NonZero(transposed)) => transposed.clone(),
                _ => T::zero(),
            };
            if transposed != *value {
                return Err(HeatError::AsymmetricMatrix { row, col });
            }
        }

        let has_full_diagonal = (0..matrix.nrows())
            .all(|i| matches!(matrix.get_entry(i, i), Some(SparseEntry::NonZero(_))));
        let matrix = if has_full_diagonal {
            matrix
        } else {
            let mut coo = CooMatrix::from(&matrix);
            for i in 0..matrix.nrows() {
                coo.push(i, i, T::zero());
            }
            CsrMatrix::from(&coo)
        };

        Ok(Self { matrix, rhs })
    }
}

impl<T: Scalar> LinearSystem<T> for GlobalSystem<T> {
    fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    fn into_parts(self) -> (CsrMatrix<T>, DVector<T>) {
        (self.matrix, self.rhs)
    }
}

impl<T: Scalar> ConstrainedSystem<T> {
    /// The nodes with a prescribed temperature, in the order they were imposed.
    pub fn constrained_nodes(&self) -> &[usize] {
        &self.constrained_nodes
    }
}

impl<T: Scalar> LinearSystem<T> for ConstrainedSystem<T> {
    fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    fn into_parts(self) -> (CsrMatrix<T>, DVector<T>) {
        (self.matrix, self.rhs)
    }
}
