//! The SEMFE problem description document.
//!
//! A document lists one material, the mesh nodes and `tri3` elements and three groups of boundary
//! conditions: `temperature` (per node), `heat_flux` and `convection` (per element edge). All ids
//! in the document are 1-based. [`SemfeInput`] is the raw content of a document and converts to
//! and from the 0-based [`HeatConductionModel`].
//!
//! Parsing the document is left to an implementation of [`SemfeReader`].
use crate::assembly::boundary_conditions::{BoundaryConditions, Convection, HeatFlux, PrescribedTemperature};
use crate::assembly::local::Conductivity;
use crate::connectivity::Tri3d2Connectivity;
use crate::error::HeatError;
use crate::io::format_float;
use crate::mesh::TriangleMesh2d;
use crate::model::HeatConductionModel;
use eyre::{eyre, WrapErr};
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeMaterial {
    pub id: usize,
    pub name: String,
    pub conductivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeNode {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Ignored by the planar solver.
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeElement {
    pub id: usize,
    pub nodes: [usize; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeTemperature {
    pub node: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeFlux {
    pub elem: usize,
    pub edge: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeConvection {
    pub elem: usize,
    pub edge: usize,
    pub h: f64,
    #[serde(rename = "Tinf")]
    pub t_inf: f64,
}

/// Boundary condition groups, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemfeBoundaryConditions {
    pub temperature: Vec<SemfeTemperature>,
    pub heat_flux: Vec<SemfeFlux>,
    pub convection: Vec<SemfeConvection>,
}

/// Raw content of a SEMFE document, with 1-based ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemfeInput {
    pub materials: Vec<SemfeMaterial>,
    pub nodes: Vec<SemfeNode>,
    pub elements: Vec<SemfeElement>,
    #[serde(default)]
    pub boundary_conditions: SemfeBoundaryConditions,
}

/// Parses SEMFE documents.
pub trait SemfeReader {
    fn read_semfe(&self, path: &Path) -> eyre::Result<SemfeInput>;
}

/// Reads a document with the given reader and converts it to a model.
pub fn load_model<R, P>(reader: &R, path: P) -> eyre::Result<HeatConductionModel<f64>>
where
    R: SemfeReader + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let input = reader
        .read_semfe(path)
        .wrap_err_with(|| format!("failed to read SEMFE document {}", path.display()))?;
    input
        .into_model()
        .wrap_err_with(|| format!("invalid SEMFE document {}", path.display()))
}

/// Converts a 1-based id into a 0-based index below `count`.
fn zero_based(id: usize, count: usize, what: &str) -> Result<usize, HeatError> {
    if id == 0 || id > count {
        Err(HeatError::MeshIntegrity(format!("{what} id {id} is outside of 1..={count}")))
    } else {
        Ok(id - 1)
    }
}

/// Orders items by their 1-based id and checks that the ids are exactly `1..=n`.
fn ordered_by_id<'a, I>(items: &'a [I], id: impl Fn(&I) -> usize, what: &str) -> Result<Vec<&'a I>, HeatError> {
    let mut slots: Vec<Option<&I>> = vec![None; items.len()];
    for item in items {
        let index = zero_based(id(item), items.len(), what)?;
        if slots[index].replace(item).is_some() {
            return Err(HeatError::MeshIntegrity(format!("duplicate {what} id {}", id(item))));
        }
    }
    // Every slot is filled, since there are as many distinct ids in range as slots
    Ok(slots.into_iter().flatten().collect())
}

impl SemfeInput {
    /// The conductivity of the (single) material.
    pub fn conductivity(&self) -> Result<f64, HeatError> {
        match self.materials.as_slice() {
            [] => Err(HeatError::DimensionMismatch {
                what: "materials",
                expected: 1,
                actual: 0,
            }),
            [material, rest @ ..] => {
                if !rest.is_empty() {
                    warn!(
                        "Document defines {} materials, using '{}' for all elements",
                        self.materials.len(),
                        material.name
                    );
                }
                Ok(material.conductivity)
            }
        }
    }

    /// Converts the document to a 0-based model.
    ///
    /// Node and element ids must be exactly `1..=n` (in any order). Every referenced node,
    /// element and edge id is checked.
    pub fn into_model(self) -> Result<HeatConductionModel<f64>, HeatError> {
        let conductivity = self.conductivity()?;

        let vertices = ordered_by_id(&self.nodes, |node| node.id, "node")?
            .into_iter()
            .map(|node| Point2::new(node.x, node.y))
            .collect::<Vec<_>>();
        let num_nodes = vertices.len();

        let connectivity = ordered_by_id(&self.elements, |element| element.id, "element")?
            .into_iter()
            .map(|element| {
                let [a, b, c] = element.nodes;
                Ok(Tri3d2Connectivity([
                    zero_based(a, num_nodes, "node")?,
                    zero_based(b, num_nodes, "node")?,
                    zero_based(c, num_nodes, "node")?,
                ]))
            })
            .collect::<Result<Vec<_>, HeatError>>()?;
        let num_elements = connectivity.len();
        let mesh = TriangleMesh2d::try_from_vertices_and_connectivity(vertices, connectivity)?;

        let groups = &self.boundary_conditions;
        let boundary_conditions = BoundaryConditions {
            temperature: groups
                .temperature
                .iter()
                .map(|bc| Ok(PrescribedTemperature::new(zero_based(bc.node, num_nodes, "node")?, bc.value)))
                .collect::<Result<_, HeatError>>()?,
            heat_flux: groups
                .heat_flux
                .iter()
                .map(|bc| HeatFlux::try_new(zero_based(bc.elem, num_elements, "element")?, bc.edge, bc.value))
                .collect::<Result<_, HeatError>>()?,
            convection: groups
                .convection
                .iter()
                .map(|bc| {
                    Convection::try_new(zero_based(bc.elem, num_elements, "element")?, bc.edge, bc.h, bc.t_inf)
                })
                .collect::<Result<_, HeatError>>()?,
        };

        debug!(
            "Converted SEMFE document: {} nodes, {} elements, {} boundary conditions",
            num_nodes,
            num_elements,
            boundary_conditions.len()
        );
        Ok(HeatConductionModel::new(mesh, Conductivity::Uniform(conductivity)).with_boundary_conditions(boundary_conditions))
    }

    /// Describes a model with 1-based ids.
    ///
    /// The document format has a single material, so the conductivity must be uniform. A heat
    /// source is not part of the document and is dropped with a warning.
    pub fn from_model(model: &HeatConductionModel<f64>, material_name: &str) -> eyre::Result<Self> {
        let conductivity = match model.conductivity() {
            Conductivity::Uniform(k) => *k,
            Conductivity::PerElement(_) => {
                return Err(eyre!("SEMFE documents only support a uniform conductivity"));
            }
        };
        if model.heat_source().is_some() {
            warn!("Heat source is not written to the SEMFE document");
        }

        let mesh = model.mesh();
        let bcs = model.boundary_conditions();
        Ok(Self {
            materials: vec![SemfeMaterial {
                id: 1,
                name: material_name.to_string(),
                conductivity,
            }],
            nodes: mesh
                .vertices()
                .iter()
                .enumerate()
                .map(|(i, p)| SemfeNode {
                    id: i + 1,
                    x: p.x,
                    y: p.y,
                    z: 0.0,
                })
                .collect(),
            elements: mesh
                .connectivity()
                .iter()
                .enumerate()
                .map(|(i, Tri3d2Connectivity([a, b, c]))| SemfeElement {
                    id: i + 1,
                    nodes: [a + 1, b + 1, c + 1],
                })
                .collect(),
            boundary_conditions: SemfeBoundaryConditions {
                temperature: bcs
                    .temperature
                    .iter()
                    .map(|bc| SemfeTemperature {
                        node: bc.node + 1,
                        value: bc.temperature,
                    })
                    .collect(),
                heat_flux: bcs
                    .heat_flux
                    .iter()
                    .map(|bc| SemfeFlux {
                        elem: bc.element + 1,
                        edge: bc.edge.id(),
                        value: bc.flux,
                    })
                    .collect(),
                convection: bcs
                    .convection
                    .iter()
                    .map(|bc| SemfeConvection {
                        elem: bc.element + 1,
                        edge: bc.edge.id(),
                        h: bc.film_coefficient,
                        t_inf: bc.ambient_temperature,
                    })
                    .collect(),
            },
        })
    }
}

/// Writes the document in its XML layout.
pub fn write_semfe<W: Write>(mut writer: W, input: &SemfeInput) -> eyre::Result<()> {
    let w = &mut writer;
    writeln!(w, r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#)?;
    writeln!(w, "<SEMFE_spec>")?;
    writeln!(w, r#"  <Module type="heat conduction"/>"#)?;
    writeln!(w)?;

    writeln!(w, "  <Materials>")?;
    for material in &input.materials {
        writeln!(w, r#"    <Material id="{}" name="{}">"#, material.id, escape_attribute(&material.name))?;
        writeln!(w, "      <conductivity>{}</conductivity>", format_float(material.conductivity))?;
        writeln!(w, "    </Material>")?;
    }
    writeln!(w, "  </Materials>")?;
    writeln!(w)?;

    writeln!(w, "  <Geometry>")?;
    writeln!(w, "    <Nodes>")?;
    for node in &input.nodes {
        writeln!(
            w,
            r#"      <node id="{}" x="{}" y="{}" z="{}"/>"#,
            node.id,
            format_float(node.x),
            format_float(node.y),
            format_float(node.z)
        )?;
    }
    writeln!(w, "    </Nodes>")?;
    writeln!(w)?;
    writeln!(w, r#"    <Elements type="tri3" name="mesh">"#)?;
    for element in &input.elements {
        writeln!(w, r#"      <elem id="{}">{}</elem>"#, element.id, element.nodes.iter().join(" "))?;
    }
    writeln!(w, "    </Elements>")?;
    writeln!(w, "  </Geometry>")?;
    writeln!(w)?;

    let groups = &input.boundary_conditions;
    writeln!(w, "  <BoundaryConditions>")?;
    writeln!(w, "    <Boundary>")?;
    for bc in &groups.temperature {
        writeln!(w, r#"      <temperature node="{}" value="{}"/>"#, bc.node, format_float(bc.value))?;
    }
    writeln!(w, "    </Boundary>")?;
    writeln!(w)?;
    writeln!(w, "    <HeatFlux>")?;
    for bc in &groups.heat_flux {
        writeln!(
            w,
            r#"      <flux elem="{}" edge="{}" value="{}"/>"#,
            bc.elem,
            bc.edge,
            format_float(bc.value)
        )?;
    }
    writeln!(w, "    </HeatFlux>")?;
    writeln!(w)?;
    writeln!(w, "    <Convection>")?;
    for bc in &groups.convection {
        writeln!(
            w,
            r#"      <conv elem="{}" edge="{}" h="{}" Tinf="{}"/>"#,
            bc.elem,
            bc.edge,
            format_float(bc.h),
            format_float(bc.t_inf)
        )?;
    }
    writeln!(w, "    </Convection>")?;
    writeln!(w, "  </BoundaryConditions>")?;
    writeln!(w)?;

    writeln!(w, r#"  <Step name="step1" type="steady-state">"#)?;
    writeln!(w, "    <HeatSource>")?;
    writeln!(w, "    </HeatSource>")?;
    writeln!(w, "  </Step>")?;
    writeln!(w, "</SEMFE_spec>")?;
    writer.flush()?;
    Ok(())
}

/// Writes the document describing `model` to a file.
pub fn write_semfe_file(
    path: impl AsRef<Path>,
    model: &HeatConductionModel<f64>,
    material_name: &str,
) -> eyre::Result<()> {
    let path = path.as_ref();
    let input = SemfeInput::from_model(model, material_name)?;
    let file = File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
    write_semfe(BufWriter::new(file), &input).wrap_err_with(|| format!("failed to write {}", path.display()))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
