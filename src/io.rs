//! Reading and writing problem descriptions and results.
pub mod csv;
pub mod semfe;
pub mod vtk;

/// Formats a float the way the document format expects: integral values keep a trailing `.0`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
