use crate::mesh::TriangleMesh2d;
use crate::model::TemperatureField;
use eyre::{eyre, WrapErr};
use std::convert::TryFrom;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType, IOBuffer, Piece,
    UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

/// Builds a legacy VTK unstructured grid from a triangle mesh and nodal scalar fields.
pub struct TriangleMeshDataSetBuilder<'a> {
    mesh: &'a TriangleMesh2d<f64>,
    point_scalars: Vec<(String, Vec<f64>)>,
    cell_scalars: Vec<(String, Vec<f64>)>,

    // Only used for exporting directly to file
    title: Option<String>,
}

impl<'a> TriangleMeshDataSetBuilder<'a> {
    pub fn from_mesh(mesh: &'a TriangleMesh2d<f64>) -> Self {
        Self {
            mesh,
            point_scalars: Vec::new(),
            cell_scalars: Vec::new(),
            title: None,
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Attaches one scalar per mesh vertex.
    pub fn with_point_scalars(mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        self.point_scalars.push((name.into(), values.into()));
        self
    }

    /// Attaches one scalar per triangle.
    pub fn with_cell_scalars(mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        self.cell_scalars.push((name.into(), values.into()));
        self
    }

    /// Attaches the nodal temperatures under the name `temperature`.
    pub fn with_temperature(self, field: &TemperatureField<f64>) -> Self {
        self.with_point_scalars("temperature", field.values().as_slice())
    }

    pub fn try_build(&self) -> eyre::Result<DataSet> {
        let points: Vec<f64> = self
            .mesh
            .vertices()
            .iter()
            .flat_map(|v| [v.x, v.y, 0.0])
            .collect();

        // Vertices is laid out as follows: N, i_1, i_2, ... i_N,
        // so for triangles this becomes 3 followed by the three vertex indices
        let mut vertices = Vec::with_capacity(4 * self.mesh.num_cells());
        for cell in self.mesh.connectivity() {
            vertices.push(3);
            for &idx in &cell.0 {
                vertices.push(u32::try_from(idx).wrap_err("vertex index does not fit in VTK connectivity")?);
            }
        }
        let num_cells = u32::try_from(self.mesh.num_cells()).wrap_err("too many cells for VTK")?;

        let point = scalar_attributes(&self.point_scalars, self.mesh.num_vertices(), "point")?;
        let cell = scalar_attributes(&self.cell_scalars, self.mesh.num_cells(), "cell")?;

        let piece = UnstructuredGridPiece {
            points: points.into(),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy { num_cells, vertices },
                types: vec![CellType::Triangle; self.mesh.num_cells()],
            },
            data: Attributes { point, cell },
        };

        Ok(DataSet::UnstructuredGrid {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        })
    }

    /// Convenience function for directly exporting the dataset to a file.
    pub fn try_export(&self, filename: impl AsRef<Path>) -> eyre::Result<()> {
        let filepath = filename.as_ref();
        let fallback_title = filepath
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let dataset = self.try_build()?;
        Vtk {
            version: Version { major: 4, minor: 1 },
            // If we don't have a title then just make the filepath the title
            title: self.title.clone().unwrap_or(fallback_title),
            byte_order: ByteOrder::BigEndian,
            data: dataset,
            file_path: None,
        }
        .export(filepath)
        .map_err(|err| eyre!("failed to export VTK file {}: {:?}", filepath.display(), err))
    }
}

fn scalar_attributes(fields: &[(String, Vec<f64>)], expected_len: usize, location: &str) -> eyre::Result<Vec<Attribute>> {
    fields
        .iter()
        .map(|(name, values)| {
            if values.len() != expected_len {
                return Err(eyre!(
                    "{location} attribute '{name}' has {} values, expected {expected_len}",
                    values.len()
                ));
            }
            Ok(Attribute::DataArray(DataArray {
                name: name.clone(),
                elem: ElementType::Scalars {
                    num_comp: 1,
                    lookup_table: None,
                },
                data: IOBuffer::from(values.clone()),
            }))
        })
        .collect()
}
