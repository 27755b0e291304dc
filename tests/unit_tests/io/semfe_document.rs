use crate::unit_square_two_triangles;
use semfe::assembly::boundary_conditions::{BoundaryConditions, Convection, HeatFlux, PrescribedTemperature};
use semfe::assembly::local::{Conductivity, HeatSource};
use semfe::connectivity::{LocalEdge, Tri3d2Connectivity};
use semfe::error::HeatError;
use semfe::io::semfe::{
    load_model, write_semfe, SemfeBoundaryConditions, SemfeConvection, SemfeElement, SemfeFlux, SemfeInput,
    SemfeMaterial, SemfeNode, SemfeReader, SemfeTemperature,
};
use semfe::model::HeatConductionModel;
use std::path::Path;

fn two_triangle_model() -> HeatConductionModel<f64> {
    let boundary_conditions = BoundaryConditions {
        temperature: vec![PrescribedTemperature::new(0, 100.0), PrescribedTemperature::new(3, 30.0)],
        heat_flux: vec![HeatFlux::new(0, LocalEdge::First, 0.0)],
        convection: vec![Convection::new(0, LocalEdge::Second, 50.0, 25.0)],
    };
    HeatConductionModel::new(unit_square_two_triangles(), Conductivity::Uniform(1.5))
        .with_boundary_conditions(boundary_conditions)
}

const TWO_TRIANGLE_DOCUMENT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<SEMFE_spec>
  <Module type="heat conduction"/>

  <Materials>
    <Material id="1" name="Brick">
      <conductivity>1.5</conductivity>
    </Material>
  </Materials>

  <Geometry>
    <Nodes>
      <node id="1" x="0.0" y="0.0" z="0.0"/>
      <node id="2" x="1.0" y="0.0" z="0.0"/>
      <node id="3" x="1.0" y="1.0" z="0.0"/>
      <node id="4" x="0.0" y="1.0" z="0.0"/>
    </Nodes>

    <Elements type="tri3" name="mesh">
      <elem id="1">1 2 3</elem>
      <elem id="2">1 3 4</elem>
    </Elements>
  </Geometry>

  <BoundaryConditions>
    <Boundary>
      <temperature node="1" value="100.0"/>
      <temperature node="4" value="30.0"/>
    </Boundary>

    <HeatFlux>
      <flux elem="1" edge="1" value="0.0"/>
    </HeatFlux>

    <Convection>
      <conv elem="1" edge="2" h="50.0" Tinf="25.0"/>
    </Convection>
  </BoundaryConditions>

  <Step name="step1" type="steady-state">
    <HeatSource>
    </HeatSource>
  </Step>
</SEMFE_spec>
"#;

#[test]
fn write_two_triangle_document() {
    let input = SemfeInput::from_model(&two_triangle_model(), "Brick").unwrap();
    let mut output = Vec::new();
    write_semfe(&mut output, &input).unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), TWO_TRIANGLE_DOCUMENT);
}

#[test]
fn document_converts_back_to_the_same_model() {
    let model = two_triangle_model();
    let input = SemfeInput::from_model(&model, "Brick").unwrap();
    assert_eq!(input.elements[1].nodes, [1, 3, 4]);
    assert_eq!(input.boundary_conditions.convection[0].edge, 2);
    assert_eq!(input.into_model().unwrap(), model);
}

#[test]
fn from_model_requires_uniform_conductivity() {
    let model = HeatConductionModel::new(unit_square_two_triangles(), Conductivity::PerElement(vec![1.0, 2.0]));
    assert!(SemfeInput::from_model(&model, "Brick").is_err());

    // A heat source is dropped, not rejected
    let model = two_triangle_model().with_heat_source(HeatSource::Uniform(1.0));
    assert!(SemfeInput::from_model(&model, "Brick").is_ok());
}

fn minimal_input() -> SemfeInput {
    SemfeInput {
        materials: vec![SemfeMaterial {
            id: 1,
            name: "Brick".to_string(),
            conductivity: 2.0,
        }],
        // Ids need not be sorted
        nodes: vec![
            SemfeNode { id: 3, x: 0.0, y: 1.0, z: 0.0 },
            SemfeNode { id: 1, x: 0.0, y: 0.0, z: 0.0 },
            SemfeNode { id: 2, x: 1.0, y: 0.0, z: 0.0 },
        ],
        elements: vec![SemfeElement { id: 1, nodes: [1, 2, 3] }],
        boundary_conditions: SemfeBoundaryConditions {
            temperature: vec![SemfeTemperature { node: 3, value: 5.0 }],
            heat_flux: vec![SemfeFlux { elem: 1, edge: 1, value: 2.0 }],
            convection: vec![SemfeConvection {
                elem: 1,
                edge: 3,
                h: 1.0,
                t_inf: 20.0,
            }],
        },
    }
}

#[test]
fn into_model_converts_ids_to_indices() {
    let model = minimal_input().into_model().unwrap();
    assert_eq!(model.conductivity(), &Conductivity::Uniform(2.0));
    assert_eq!(model.mesh().vertices()[2], nalgebra::Point2::new(0.0, 1.0));
    assert_eq!(model.mesh().connectivity(), &[Tri3d2Connectivity([0, 1, 2])]);

    let bcs = model.boundary_conditions();
    assert_eq!(bcs.temperature, vec![PrescribedTemperature::new(2, 5.0)]);
    assert_eq!(bcs.heat_flux, vec![HeatFlux::new(0, LocalEdge::First, 2.0)]);
    assert_eq!(bcs.convection, vec![Convection::new(0, LocalEdge::Third, 1.0, 20.0)]);
}

#[test]
fn into_model_rejects_invalid_references() {
    let mut input = minimal_input();
    input.elements[0].nodes = [1, 2, 4];
    assert!(matches!(input.into_model(), Err(HeatError::MeshIntegrity(_))));

    let mut input = minimal_input();
    input.nodes[0].id = 2;
    assert!(matches!(input.into_model(), Err(HeatError::MeshIntegrity(_))));

    let mut input = minimal_input();
    input.boundary_conditions.heat_flux[0].edge = 4;
    assert!(matches!(input.into_model(), Err(HeatError::InvalidEdgeId(4))));

    let mut input = minimal_input();
    input.boundary_conditions.convection[0].elem = 2;
    assert!(matches!(input.into_model(), Err(HeatError::MeshIntegrity(_))));

    let mut input = minimal_input();
    input.boundary_conditions.temperature[0].node = 0;
    assert!(matches!(input.into_model(), Err(HeatError::MeshIntegrity(_))));

    let mut input = minimal_input();
    input.materials.clear();
    assert!(matches!(input.into_model(), Err(HeatError::DimensionMismatch { .. })));
}

struct InMemoryReader {
    input: SemfeInput,
}

impl SemfeReader for InMemoryReader {
    fn read_semfe(&self, path: &Path) -> eyre::Result<SemfeInput> {
        if path == Path::new("chimney.semfe") {
            Ok(self.input.clone())
        } else {
            Err(eyre::eyre!("no such document"))
        }
    }
}

#[test]
fn load_model_reads_and_converts() {
    let reader = InMemoryReader { input: minimal_input() };
    let model = load_model(&reader, "chimney.semfe").unwrap();
    assert_eq!(model.mesh().num_cells(), 1);

    let error = load_model(&reader, "missing.semfe").unwrap_err();
    assert!(format!("{error:#}").contains("missing.semfe"));

    let mut invalid = minimal_input();
    invalid.elements[0].nodes = [1, 2, 7];
    let reader = InMemoryReader { input: invalid };
    let error = load_model(&reader, "chimney.semfe").unwrap_err();
    assert!(error.downcast_ref::<HeatError>().is_some());
}
