//! Station list reader.
//!
//! The first whitespace-delimited column is the station code; when the next
//! two columns are numbers they are taken as longitude and latitude. Any
//! further columns are ignored.

use crate::error::ParseError;
use crate::table::is_skippable;
use lib_types::fault::Station;
use nom::{
    bytes::complete::take_till1,
    character::complete::{space0, space1},
    combinator::opt,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use std::path::Path;

/// Station codes longer than this are truncated.
pub const MAX_CODE_LEN: usize = 6;

/// Parse a station list from a string.
pub fn parse_stations(content: &str) -> Result<Vec<Station>, ParseError> {
    let mut stations = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if is_skippable(line) {
            continue;
        }
        let (_, (code, coords)) = station_line(line)
            .map_err(|_| ParseError::syntax(idx + 1, 1, "expected a station code"))?;

        let mut code = code.to_string();
        if code.chars().count() > MAX_CODE_LEN {
            let truncated: String = code.chars().take(MAX_CODE_LEN).collect();
            tracing::warn!(
                "Station code '{}' on line {} truncated to '{}'",
                code,
                idx + 1,
                truncated
            );
            code = truncated;
        }

        let (longitude, latitude) = match coords {
            Some((lon, lat)) => (Some(lon), Some(lat)),
            None => (None, None),
        };
        stations.push(Station {
            code,
            longitude,
            latitude,
        });
    }

    if stations.is_empty() {
        return Err(ParseError::invalid_format("station", "no stations listed"));
    }

    Ok(stations)
}

/// Read and parse a station list file.
pub fn read_stations(path: &Path) -> Result<Vec<Station>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_stations(&content)
}

fn station_line(input: &str) -> IResult<&str, (&str, Option<(f64, f64)>)> {
    let (input, _) = space0(input)?;
    let (input, code) = take_till1(|c: char| c.is_whitespace()).parse(input)?;
    let (input, coords) = opt((preceded(space1, double), preceded(space1, double))).parse(input)?;
    Ok((input, (code, coords)))
}
