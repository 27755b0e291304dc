//! Solves the chimney cross-section and writes the model, the nodal temperatures and a VTK file.
//!
//! Usage: `cargo run --release --example chimney -- [parameters.json] [output-dir]`
use eyre::{eyre, WrapErr};
use semfe::io::csv::write_temperature_csv_file;
use semfe::io::semfe::write_semfe_file;
use semfe::io::vtk::TriangleMeshDataSetBuilder;
use semfe::model::chimney::ChimneyParameters;
use semfe::model::AnalysisSettings;
use std::env;
use std::fs;
use std::path::PathBuf;

fn read_parameters(path: Option<&String>) -> eyre::Result<ChimneyParameters> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).wrap_err_with(|| format!("failed to read parameter file {path}"))?;
            serde_json::from_str(&json).wrap_err_with(|| format!("invalid parameter file {path}"))
        }
        None => Ok(ChimneyParameters::default()),
    }
}

fn main() -> eyre::Result<()> {
    // Override with RUST_LOG, e.g. RUST_LOG=semfe=debug
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("semfe=info".parse()?)
        .add_directive("chimney=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let params = read_parameters(args.first())?;
    let output_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("data/chimney"));
    fs::create_dir_all(&output_dir)
        .wrap_err_with(|| format!("failed to create output directory {}", output_dir.display()))?;

    let model = params.build_model()?;
    let field = model.solve(&AnalysisSettings::default())?;
    let (min, max) = field
        .min()
        .zip(field.max())
        .ok_or_else(|| eyre!("the chimney mesh has no nodes"))?;
    log::info!("Temperature range: [{min:.3}, {max:.3}]");

    write_semfe_file(output_dir.join("chimney.semfe"), &model, "Brick")?;
    write_temperature_csv_file(output_dir.join("temperature.csv"), model.mesh(), &field)?;
    TriangleMeshDataSetBuilder::from_mesh(model.mesh())
        .with_title("Chimney temperature")
        .with_temperature(&field)
        .try_export(output_dir.join("temperature_field.vtk"))?;

    println!("Wrote results to {}", output_dir.display());
    Ok(())
}
