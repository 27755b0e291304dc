//! Problems with known solutions on the unit square.
use matrixcompare::assert_matrix_eq;
use nalgebra::{DVector, Point2};
use semfe::assembly::boundary_conditions::{
    BoundaryConditions, Convection, DirichletMethod, HeatFlux, PrescribedTemperature,
};
use semfe::assembly::global::AssemblyStrategy;
use semfe::assembly::local::{Conductivity, HeatSource};
use semfe::connectivity::Tri3d2Connectivity;
use semfe::mesh::boundary::{BoundaryEdgeGroups, BoundarySide, ClassificationTolerance};
use semfe::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use semfe::mesh::TriangleMesh2d;
use semfe::model::{AnalysisSettings, HeatConductionModel};
use semfe::solve::{LinearSolver, SolverSettings};

const CELLS_PER_DIM: usize = 8;

fn unit_square() -> (TriangleMesh2d<f64>, BoundaryEdgeGroups) {
    let mesh = create_unit_square_uniform_tri_mesh_2d(CELLS_PER_DIM);
    let edges = mesh.find_boundary_edges().unwrap();
    let groups = BoundaryEdgeGroups::classify(&mesh, &edges, &ClassificationTolerance::default()).unwrap();
    (mesh, groups)
}

fn temperatures(groups: &BoundaryEdgeGroups, side: BoundarySide, value: f64) -> Vec<PrescribedTemperature<f64>> {
    groups
        .nodes(side)
        .into_iter()
        .map(|node| PrescribedTemperature::new(node, value))
        .collect()
}

fn nodal_values(mesh: &TriangleMesh2d<f64>, f: impl Fn(&Point2<f64>) -> f64) -> DVector<f64> {
    DVector::from_iterator(mesh.num_vertices(), mesh.vertices().iter().map(f))
}

#[test]
fn linear_field_between_prescribed_sides() {
    let (mesh, groups) = unit_square();
    let mut temperature = temperatures(&groups, BoundarySide::Left, 10.0);
    temperature.extend(temperatures(&groups, BoundarySide::Right, 30.0));
    let boundary_conditions = BoundaryConditions {
        temperature,
        ..BoundaryConditions::default()
    };
    let model =
        HeatConductionModel::new(mesh, Conductivity::Uniform(1.5)).with_boundary_conditions(boundary_conditions);
    let expected = nodal_values(model.mesh(), |p| 10.0 + 20.0 * p.x);

    for solver in [LinearSolver::SparseCholesky, LinearSolver::DenseLu] {
        let settings = AnalysisSettings::default().with_solver_settings(SolverSettings::default().with_solver(solver));
        let field = model.solve(&settings).unwrap();
        assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-10);
    }

    let settings = AnalysisSettings::default().with_dirichlet_method(DirichletMethod::penalty(1e3));
    let field = model.solve(&settings).unwrap();
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-4);
}

#[test]
fn prescribed_flux_gives_linear_field() {
    // k dT/dx = q at x = 1 and T = 0 at x = 0, so T = q x / k
    let (mesh, groups) = unit_square();
    let heat_flux = groups
        .edges(BoundarySide::Right)
        .iter()
        .map(|edge| HeatFlux::new(edge.element, edge.local_edge, 1.0))
        .collect();
    let boundary_conditions = BoundaryConditions {
        temperature: temperatures(&groups, BoundarySide::Left, 0.0),
        heat_flux,
        convection: Vec::new(),
    };
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(2.0)).with_boundary_conditions(boundary_conditions);
    let field = model.solve(&AnalysisSettings::default()).unwrap();

    let expected = nodal_values(model.mesh(), |p| p.x / 2.0);
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-10);
}

#[test]
fn convection_gives_linear_field() {
    // k dT/dx = h (T_inf - T) at x = 1 and T = 0 at x = 0, so T = h T_inf x / (k + h)
    let (mesh, groups) = unit_square();
    let convection = groups
        .edges(BoundarySide::Right)
        .iter()
        .map(|edge| Convection::new(edge.element, edge.local_edge, 3.0, 8.0))
        .collect();
    let boundary_conditions = BoundaryConditions {
        temperature: temperatures(&groups, BoundarySide::Left, 0.0),
        heat_flux: Vec::new(),
        convection,
    };
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(1.0)).with_boundary_conditions(boundary_conditions);
    let field = model.solve(&AnalysisSettings::default()).unwrap();

    let expected = nodal_values(model.mesh(), |p| 6.0 * p.x);
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-10);
}

#[test]
fn two_materials_in_series() {
    // k = 1 for x < 1/2 and k = 3 for x > 1/2, with T(0) = 0 and T(1) = 1. Continuity of the flux
    // gives slopes 3/2 and 1/2
    let (mesh, groups) = unit_square();
    let conductivity = mesh
        .cell_iter()
        .map(|element| {
            let centroid_x = element.vertices().iter().map(|v| v.x).sum::<f64>() / 3.0;
            if centroid_x < 0.5 {
                1.0
            } else {
                3.0
            }
        })
        .collect();
    let mut temperature = temperatures(&groups, BoundarySide::Left, 0.0);
    temperature.extend(temperatures(&groups, BoundarySide::Right, 1.0));
    let model = HeatConductionModel::new(mesh, Conductivity::PerElement(conductivity)).with_boundary_conditions(
        BoundaryConditions {
            temperature,
            ..BoundaryConditions::default()
        },
    );
    let field = model.solve(&AnalysisSettings::default()).unwrap();

    let expected = nodal_values(model.mesh(), |p| {
        if p.x <= 0.5 {
            1.5 * p.x
        } else {
            0.75 + 0.5 * (p.x - 0.5)
        }
    });
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-10);
}

#[test]
fn uniform_heat_source_between_cold_sides() {
    // -k T'' = Q with T(0) = T(1) = 0 gives T = Q x (1 - x) / (2 k). On the structured mesh the
    // discrete equations reduce to the three-point stencil, which is exact at the nodes
    let (mesh, groups) = unit_square();
    let mut temperature = temperatures(&groups, BoundarySide::Left, 0.0);
    temperature.extend(temperatures(&groups, BoundarySide::Right, 0.0));
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(1.0))
        .with_heat_source(HeatSource::Uniform(8.0))
        .with_boundary_conditions(BoundaryConditions {
            temperature,
            ..BoundaryConditions::default()
        });
    let field = model.solve(&AnalysisSettings::default()).unwrap();

    let expected = nodal_values(model.mesh(), |p| 4.0 * p.x * (1.0 - p.x));
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-10);
    assert!(field.min().unwrap() >= -1e-12);
}

#[test]
fn single_triangle_with_one_prescribed_node() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.5, 1.5)];
    let mesh = TriangleMesh2d::try_from_vertices_and_connectivity(vertices, vec![Tri3d2Connectivity([0, 1, 2])])
        .unwrap();
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(4.0)).with_boundary_conditions(
        BoundaryConditions {
            temperature: vec![PrescribedTemperature::new(1, 5.0)],
            ..BoundaryConditions::default()
        },
    );

    for strategy in [AssemblyStrategy::Serial, AssemblyStrategy::Parallel] {
        let settings = AnalysisSettings::default().with_assembly_strategy(strategy);
        let field = model.solve(&settings).unwrap();
        assert_matrix_eq!(field.values().clone(), DVector::repeat(3, 5.0), comp = abs, tol = 1e-12);
    }
}

#[test]
fn two_triangle_square_with_hot_right_side() {
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let cells = vec![Tri3d2Connectivity([0, 1, 2]), Tri3d2Connectivity([0, 2, 3])];
    let mesh = TriangleMesh2d::try_from_vertices_and_connectivity(vertices, cells).unwrap();
    let temperature = vec![
        PrescribedTemperature::new(0, 0.0),
        PrescribedTemperature::new(3, 0.0),
        PrescribedTemperature::new(1, 1.0),
        PrescribedTemperature::new(2, 1.0),
    ];
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(1.0)).with_boundary_conditions(
        BoundaryConditions {
            temperature,
            ..BoundaryConditions::default()
        },
    );

    let field = model.solve(&AnalysisSettings::default()).unwrap();
    let expected = nodal_values(model.mesh(), |p| p.x);
    assert_matrix_eq!(field.values().clone(), expected, comp = abs, tol = 1e-12);
}

#[test]
fn fully_constrained_triangle() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let mesh = TriangleMesh2d::try_from_vertices_and_connectivity(vertices, vec![Tri3d2Connectivity([0, 1, 2])])
        .unwrap();
    let temperature = (0..3).map(|node| PrescribedTemperature::new(node, 5.0)).collect();
    let model = HeatConductionModel::new(mesh, Conductivity::Uniform(2.0)).with_boundary_conditions(
        BoundaryConditions {
            temperature,
            ..BoundaryConditions::default()
        },
    );

    for method in [DirichletMethod::Elimination, DirichletMethod::penalty(1e3)] {
        let field = model
            .solve(&AnalysisSettings::default().with_dirichlet_method(method))
            .unwrap();
        assert_matrix_eq!(field.values().clone(), DVector::repeat(3, 5.0), comp = abs, tol = 1e-9);
    }
}
