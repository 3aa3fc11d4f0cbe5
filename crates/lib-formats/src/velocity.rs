//! Layered velocity model (`.mod`) reader.
//!
//! Rows are `thickness vs vp density [qs qp]` from the surface down; the last
//! row is the halfspace.

use crate::error::ParseError;
use crate::table::parse_rows;
use lib_types::structure::{VelocityModel, MIN_COLUMNS};
use ndarray::Array2;
use std::path::Path;

/// Parse a velocity model from a string.
pub fn parse_velocity_model(content: &str) -> Result<VelocityModel, ParseError> {
    let rows = parse_rows(content)?;
    let first = rows
        .first()
        .ok_or_else(|| ParseError::invalid_format("velocity model", "no layers"))?;
    let ncols = first.values.len();

    if ncols < MIN_COLUMNS {
        return Err(ParseError::syntax(
            first.line,
            1,
            format!("expected at least {} columns, found {}", MIN_COLUMNS, ncols),
        ));
    }

    let mut flat = Vec::with_capacity(rows.len() * ncols);
    for row in &rows {
        if row.values.len() != ncols {
            return Err(ParseError::syntax(
                row.line,
                1,
                format!("expected {} columns like the first layer, found {}", ncols, row.values.len()),
            ));
        }
        flat.extend_from_slice(&row.values);
    }

    let layers = Array2::from_shape_vec((rows.len(), ncols), flat)
        .map_err(|e| ParseError::invalid_format("velocity model", e.to_string()))?;

    VelocityModel::new(layers)
        .ok_or_else(|| ParseError::invalid_format("velocity model", "too few columns"))
}

/// Read and parse a velocity model file.
pub fn read_velocity_model(path: &Path) -> Result<VelocityModel, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_velocity_model(&content)
}
