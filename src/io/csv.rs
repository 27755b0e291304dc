//! Tabular output of nodal temperatures.
use crate::io::format_float;
use crate::mesh::TriangleMesh2d;
use crate::model::TemperatureField;
use eyre::{eyre, WrapErr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one row `node,x,y,temperature` per vertex, with 1-based node ids.
pub fn write_temperature_csv<W: Write>(
    mut writer: W,
    mesh: &TriangleMesh2d<f64>,
    field: &TemperatureField<f64>,
) -> eyre::Result<()> {
    if field.len() != mesh.num_vertices() {
        return Err(eyre!(
            "temperature field has {} values but the mesh has {} vertices",
            field.len(),
            mesh.num_vertices()
        ));
    }

    writeln!(writer, "node,x,y,temperature")?;
    for (i, (vertex, temperature)) in mesh.vertices().iter().zip(field.values().iter()).enumerate() {
        writeln!(
            writer,
            "{},{},{},{}",
            i + 1,
            format_float(vertex.x),
            format_float(vertex.y),
            format_float(*temperature)
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_temperature_csv_file(
    path: impl AsRef<Path>,
    mesh: &TriangleMesh2d<f64>,
    field: &TemperatureField<f64>,
) -> eyre::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
    write_temperature_csv(BufWriter::new(file), mesh, field)
        .wrap_err_with(|| format!("failed to write {}", path.display()))
}
