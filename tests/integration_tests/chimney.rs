use crate::integration_tests::data_output_path;
use semfe::assembly::boundary_conditions::DirichletMethod;
use semfe::assembly::global::AssemblyStrategy;
use semfe::assembly::LinearSystem;
use semfe::io::csv::write_temperature_csv_file;
use semfe::io::semfe::{write_semfe_file, SemfeInput};
use semfe::io::vtk::TriangleMeshDataSetBuilder;
use semfe::mesh::boundary::BoundarySide;
use semfe::model::chimney::{ChimneyMesh, ChimneyParameters};
use semfe::model::AnalysisSettings;
use std::fs;
use util::assert_vectors_close;

#[test]
fn chimney_mesh_and_boundary_conditions() {
    let params = ChimneyParameters::default();
    let ChimneyMesh { mesh, boundary } = params.build_mesh().unwrap();

    // 21 x 16 grid vertices minus the 9 x 4 vertices inside the flue
    assert_eq!(mesh.num_vertices(), 336 - 36);
    assert_eq!(mesh.num_cells(), 2 * (300 - 50));
    assert_eq!(boundary.num_edges(), 70 + 30);

    let conditions = params.boundary_conditions(&boundary);
    assert_eq!(conditions.temperature.len(), 30 + 21);
    assert_eq!(conditions.heat_flux.len(), 20);
    assert_eq!(conditions.convection.len(), 15);
    assert!(conditions.heat_flux.iter().all(|bc| bc.flux == 0.0));

    // Every vertex of the compacted mesh is used by some element
    let mut referenced = vec![false; mesh.num_vertices()];
    for cell in mesh.connectivity() {
        for &v in &cell.0 {
            referenced[v] = true;
        }
    }
    assert!(referenced.into_iter().all(|used| used));

    // Boundary nodes refer to the compacted vertices
    for node in boundary.nodes(BoundarySide::Top) {
        assert!((mesh.vertices()[node].y - params.height).abs() < 1e-12);
    }
}

#[test]
fn chimney_temperature_field() {
    let params = ChimneyParameters::default();
    let model = params.build_model().unwrap();
    let field = model.solve(&AnalysisSettings::default()).unwrap();
    assert_eq!(field.len(), model.mesh().num_vertices());

    let ChimneyMesh { boundary, .. } = params.build_mesh().unwrap();
    for node in boundary.nodes(BoundarySide::Inner) {
        assert!((field.values()[node] - params.inner_temperature).abs() < 1e-12);
    }
    for node in boundary.nodes(BoundarySide::Top) {
        assert!((field.values()[node] - params.top_temperature).abs() < 1e-12);
    }

    // The mesh consists of right triangles, so the discrete maximum principle holds
    let min = field.min().unwrap();
    let max = field.max().unwrap();
    assert!(min >= params.ambient_temperature - 1e-9, "min {min}");
    assert!(max <= params.inner_temperature + 1e-9, "max {max}");

    // The convective right side is cooler than the flue, but warmer than the air
    for node in boundary.nodes(BoundarySide::Right) {
        let t = field.values()[node];
        assert!(t > params.ambient_temperature && t < params.inner_temperature);
    }
}

#[test]
fn chimney_solution_does_not_depend_on_assembly_or_solver() {
    let model = ChimneyParameters::default().build_model().unwrap();
    let serial = model.assemble(AssemblyStrategy::Serial).unwrap();
    let parallel = model.assemble(AssemblyStrategy::Parallel).unwrap();
    assert_eq!(serial.matrix(), parallel.matrix());

    let reference = model.solve(&AnalysisSettings::default()).unwrap();
    let penalty = model
        .solve(&AnalysisSettings::default().with_dirichlet_method(DirichletMethod::penalty(1e3)))
        .unwrap();
    assert_vectors_close(penalty.values(), reference.values(), 1e-3);

    let stiff_penalty = model
        .solve(&AnalysisSettings::default().with_dirichlet_method(DirichletMethod::penalty(1e10)))
        .unwrap();
    assert_vectors_close(stiff_penalty.values(), reference.values(), 1e-6);
}

#[test]
fn chimney_outputs_are_written() {
    let output_dir = data_output_path().join("chimney");
    fs::create_dir_all(&output_dir).unwrap();

    let model = ChimneyParameters::default().build_model().unwrap();
    let field = model.solve(&AnalysisSettings::default()).unwrap();

    let semfe_path = output_dir.join("chimney.semfe");
    write_semfe_file(&semfe_path, &model, "Brick").unwrap();
    let document = fs::read_to_string(&semfe_path).unwrap();
    assert!(document.starts_with(r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#));
    assert_eq!(document.matches("<node id=").count(), model.mesh().num_vertices());
    assert_eq!(document.matches("<elem id=").count(), model.mesh().num_cells());
    assert_eq!(document.matches("<conv elem=").count(), 15);

    let input = SemfeInput::from_model(&model, "Brick").unwrap();
    assert_eq!(input.into_model().unwrap(), model);

    let csv_path = output_dir.join("temperature.csv");
    write_temperature_csv_file(&csv_path, model.mesh(), &field).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), model.mesh().num_vertices() + 1);

    TriangleMeshDataSetBuilder::from_mesh(model.mesh())
        .with_temperature(&field)
        .try_export(output_dir.join("temperature_field.vtk"))
        .expect("Export failure is a test failure");
}
