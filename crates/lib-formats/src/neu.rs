//! Static offset (`.neu`) records: north, east and up, one value per row.

use crate::error::ParseError;
use crate::table::parse_rows;
use lib_types::fault::StaticOffset;
use std::fmt::Write as _;
use std::path::Path;

/// Parse a static offset record.
pub fn parse_neu(content: &str) -> Result<StaticOffset, ParseError> {
    let values: Vec<f64> = parse_rows(content)?
        .into_iter()
        .flat_map(|row| row.values)
        .collect();

    match values.as_slice() {
        [north, east, up] => Ok(StaticOffset {
            east: *east,
            north: *north,
            up: *up,
        }),
        other => Err(ParseError::invalid_format(
            "static offset",
            format!("expected 3 values (north, east, up), found {}", other.len()),
        )),
    }
}

/// Render a static offset as three rows in north, east, up order.
pub fn format_neu(offset: &StaticOffset) -> String {
    let mut out = String::new();
    for value in [offset.north, offset.east, offset.up] {
        let _ = writeln!(out, "{:.18e}", value);
    }
    out
}

/// Read a static offset file.
pub fn read_neu(path: &Path) -> Result<StaticOffset, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_neu(&content)
}

/// Write a static offset file.
pub fn write_neu(path: &Path, offset: &StaticOffset) -> Result<(), ParseError> {
    std::fs::write(path, format_neu(offset))?;
    Ok(())
}
