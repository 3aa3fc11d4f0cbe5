//! Rupture model (`.rupt`) reader.
//!
//! One row per subfault time window:
//!
//! ```text
//! # id  lon  lat  depth  strike  dip  shape  rise  ss  ds  length  width  rupt_time  [rigidity]
//! 1  -72.9  -36.1  18.5  17.0  15.0  0.5  8.0  0.0  4.3  12000  10000  14.2  3.0e10
//! ```
//!
//! Depth is in km, slips in m, length and width in m, times in s.

use crate::error::ParseError;
use crate::table::{parse_rows, Row};
use lib_types::fault::{RuptureModel, Subfault};
use lib_types::units::{Degrees, Kilometers, Meters, Pascals, Seconds};
use std::path::Path;

/// Columns every rupture row must carry.
pub const RUPTURE_COLUMNS: usize = 13;

/// Names of the required columns, in file order.
const COLUMN_NAMES: [&str; RUPTURE_COLUMNS] = [
    "id",
    "longitude",
    "latitude",
    "depth",
    "strike",
    "dip",
    "stf_shape",
    "rise_time",
    "strike_slip",
    "dip_slip",
    "length",
    "width",
    "rupture_time",
];

/// Parse a rupture model from a string.
pub fn parse_rupture(content: &str) -> Result<RuptureModel, ParseError> {
    let subfaults = parse_rows(content)?
        .iter()
        .map(row_to_subfault)
        .collect::<Result<Vec<_>, _>>()?;

    if subfaults.is_empty() {
        return Err(ParseError::invalid_format("rupture", "no subfault rows"));
    }

    let model = RuptureModel::new(subfaults);
    tracing::debug!(
        "Parsed rupture model: {} rows, {} unique subfaults",
        model.len(),
        model.unique_ids()
    );

    Ok(model)
}

/// Read and parse a rupture model file.
pub fn read_rupture(path: &Path) -> Result<RuptureModel, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_rupture(&content)
}

fn row_to_subfault(row: &Row) -> Result<Subfault, ParseError> {
    let v = &row.values;
    if v.len() < RUPTURE_COLUMNS {
        return Err(ParseError::syntax(
            row.line,
            1,
            format!(
                "expected at least {} columns, found {} (missing '{}')",
                RUPTURE_COLUMNS,
                v.len(),
                COLUMN_NAMES[v.len()]
            ),
        ));
    }

    let id = v[0];
    if !(id >= 0.0 && id.fract() == 0.0 && id <= u32::MAX as f64) {
        return Err(ParseError::invalid_value(
            "id",
            format!("line {}: '{}' is not a subfault number", row.line, id),
        ));
    }

    let rigidity = v.get(RUPTURE_COLUMNS).copied().filter(|&mu| mu > 0.0).map(Pascals);

    Ok(Subfault {
        id: id as u32,
        longitude: v[1],
        latitude: v[2],
        depth: Kilometers(v[3]),
        strike: Degrees(v[4]),
        dip: Degrees(v[5]),
        stf_shape: v[6],
        rise_time: Seconds(v[7]),
        strike_slip: Meters(v[8]),
        dip_slip: Meters(v[9]),
        length: Meters(v[10]),
        width: Meters(v[11]),
        rupture_time: Seconds(v[12]),
        rigidity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
# No.  lon  lat  z  strike  dip  shape  rise  ss  ds  length  width  rupt_time  rigidity
1 -72.90 -36.10 18.5000 17.0 15.0 0.5 8.0 0.25 4.30 12000 10000 14.20 3.0e10
2 -72.95 -36.20 22.0000 17.0 15.0 0.5 8.0 0.00 0.00 12000 10000 16.00

1 -72.90 -36.10 18.5000 17.0 15.0 0.5 8.0 0.75 1.70 12000 10000 22.20 3.0e10
";

    #[test]
    fn test_parse_sample() {
        let model = parse_rupture(SAMPLE).unwrap();

        assert_eq!(model.len(), 3);
        assert_eq!(model.unique_ids(), 2);

        let first = &model.subfaults[0];
        assert_eq!(first.id, 1);
        assert!((first.depth.0 - 18.5).abs() < 1e-12);
        assert!((first.dip_slip.0 - 4.3).abs() < 1e-12);
        assert!((first.rupture_time.0 - 14.2).abs() < 1e-12);
        assert_eq!(first.stf_shape, 0.5);
        assert_eq!(first.rise_time, Seconds(8.0));
        assert_eq!(first.rigidity, Some(Pascals(3.0e10)));
        assert!((first.area() - 1.2e8).abs() < 1e-3);

        assert_eq!(model.subfaults[1].rigidity, None);
    }

    #[test]
    fn test_time_windows_sum_per_id() {
        let model = parse_rupture(SAMPLE).unwrap();
        let totals = model.aggregate_by_id();

        assert_eq!(totals[0].id, 1);
        assert!((totals[0].strike_slip.0 - 1.0).abs() < 1e-12);
        assert!((totals[0].dip_slip.0 - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_row_reports_line() {
        let content = "1 0 0 10 0 45 1 1 1 1 1000 1000 0\n2 0 0 10 0 45 1 1 1 1 1000\n";
        match parse_rupture(content) {
            Err(ParseError::Syntax { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("width"), "{}", message);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_fractional_id() {
        let content = "1.5 0 0 10 0 45 1 1 1 1 1000 1000 0\n";
        assert!(matches!(parse_rupture(content), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(matches!(
            parse_rupture("# nothing here\n\n"),
            Err(ParseError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_read_rupture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let model = read_rupture(file.path()).unwrap();
        assert_eq!(model.len(), 3);
    }
}
