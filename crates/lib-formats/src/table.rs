//! Whitespace-delimited numeric tables.
//!
//! Rupture files, velocity models and static offsets are all plain text:
//! one row of numbers per line, blank lines and `#` comments ignored.

use crate::error::ParseError;
use nom::{
    character::complete::{char, not_line_ending, space0, space1},
    combinator::{eof, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};

/// One parsed row and the 1-based line it came from.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    pub line: usize,
    pub values: Vec<f64>,
}

/// Parse every data line of `content`.
pub(crate) fn parse_rows(content: &str) -> Result<Vec<Row>, ParseError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_skippable(line))
        .map(|(idx, line)| {
            let values = parse_row(line).map_err(|e| row_error(idx + 1, line, e))?;
            Ok(Row {
                line: idx + 1,
                values,
            })
        })
        .collect()
}

/// Blank line or `#` comment.
pub(crate) fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn parse_row(line: &str) -> Result<Vec<f64>, nom::Err<nom::error::Error<&str>>> {
    let (_, values) = row_values(line)?;
    Ok(values)
}

fn row_values(input: &str) -> IResult<&str, Vec<f64>> {
    let (input, _) = space0(input)?;
    let (input, values) = separated_list1(space1, double).parse(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = opt(preceded(char('#'), not_line_ending)).parse(input)?;
    let (input, _) = eof(input)?;
    Ok((input, values))
}

fn row_error(line_no: usize, line: &str, err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    let column = match &err {
        nom::Err::Error(e) | nom::Err::Failure(e) => line.len() - e.input.len() + 1,
        nom::Err::Incomplete(_) => line.len() + 1,
    };
    let token: String = line[column - 1..]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .take(20)
        .collect();
    ParseError::syntax(line_no, column, format!("expected a number, found '{}'", token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_blanks() {
        let rows = parse_rows("# header\n\n  1 2.5 -3e2\n\t# indented comment\n4\t5 # trailing\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[0].values, vec![1.0, 2.5, -300.0]);
        assert_eq!(rows[1].line, 5);
        assert_eq!(rows[1].values, vec![4.0, 5.0]);
    }

    #[test]
    fn test_reports_line_and_column() {
        let err = parse_rows("1 2 3\n4 x 6\n").unwrap_err();
        match err {
            ParseError::Syntax { line, column, message } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
                assert!(message.contains('x'), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_crlf_lines() {
        let rows = parse_rows("1 2\r\n3 4\r\n").unwrap();
        assert_eq!(rows[1].values, vec![3.0, 4.0]);
    }
}
