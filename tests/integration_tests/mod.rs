use std::path::PathBuf;

mod chimney;
mod conduction;

fn data_output_path() -> PathBuf {
    PathBuf::from("data/integration_tests/")
}
