//! Steady-state heat conduction on planar linear triangle meshes.
//!
//! The typical pipeline generates or loads a [`mesh::TriangleMesh2d`], assembles the global
//! conductance system with [`assembly::global::assemble_conduction_system`], applies
//! [`assembly::boundary_conditions::BoundaryConditions`] and solves with [`solve::solve_system`].
//! [`model::HeatConductionModel`] bundles these steps.
pub mod assembly;
pub mod connectivity;
pub mod element;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod model;
pub mod solve;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate vtkio;
