/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::io;

/// Failure to read a fixed-format log.
///
/// Every variant carries the (1-based) line number where reading stopped,
/// and where it makes sense the marker of the block that was being read.
#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "line {}: read error: {}", line, error)]
    Io {
        line: usize,
        #[fail(cause)] error: io::Error,
    },

    #[fail(display = "line {} (in {:?} block): expected at least {} fields, found {}: {:?}", line, marker, expected, found, text)]
    FieldCount {
        line: usize,
        marker: &'static str,
        expected: usize,
        found: usize,
        text: String,
    },

    #[fail(display = "line {} (in {:?} block): not a number: {:?}", line, marker, token)]
    BadNumber {
        line: usize,
        marker: &'static str,
        token: String,
    },

    #[fail(display = "line {}: expected marker {:?} {}", line, marker, context)]
    MissingMarker {
        marker: &'static str,
        context: String,
        line: usize,
    },

    #[fail(display = "line {}: unsupported MDALGO {:?} (expected 2 or 26 for blue moon, 21, 27 or ** for umbrella sampling)", line, tag)]
    UnsupportedAlgorithm {
        line: usize,
        tag: String,
    },

    #[fail(display = "line {}: {}", line, message)]
    Inconsistent {
        line: usize,
        message: String,
    },
}

impl ParseError {
    /// Line number at which the error was detected.
    pub fn line(&self) -> usize {
        match *self {
            ParseError::Io { line, .. } |
            ParseError::FieldCount { line, .. } |
            ParseError::BadNumber { line, .. } |
            ParseError::MissingMarker { line, .. } |
            ParseError::UnsupportedAlgorithm { line, .. } |
            ParseError::Inconsistent { line, .. } => line,
        }
    }
}

/// Split a line on whitespace, requiring at least `min` fields.
pub(crate) fn fields<'a>(
    text: &'a str,
    min: usize,
    line: usize,
    marker: &'static str,
) -> Result<Vec<&'a str>, ParseError> {
    let words: Vec<_> = text.split_whitespace().collect();
    if words.len() < min {
        return Err(ParseError::FieldCount {
            line, marker,
            expected: min,
            found: words.len(),
            text: text.to_string(),
        });
    }
    Ok(words)
}

/// Parse a float that must be present.
///
/// Fortran overflow fields and NaN are rejected; use [`parse_f64_or_missing`]
/// for the columns where they are a legitimate "no value".
pub fn parse_f64(token: &str, line: usize, marker: &'static str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(ParseError::BadNumber { line, marker, token: token.to_string() }),
    }
}

/// Parse a float where Fortran overflow (`****`) and NaN mean "missing".
pub fn parse_f64_or_missing(token: &str, line: usize, marker: &'static str) -> Result<Option<f64>, ParseError> {
    if is_overflow_field(token) {
        return Ok(None);
    }
    match token.parse::<f64>() {
        Ok(x) if x.is_nan() => Ok(None),
        Ok(x) if x.is_finite() => Ok(Some(x)),
        _ => Err(ParseError::BadNumber { line, marker, token: token.to_string() }),
    }
}

fn is_overflow_field(token: &str) -> bool
{ !token.is_empty() && token.chars().all(|c| c == '*') }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats() {
        assert_eq!(parse_f64("1.5", 1, "x").unwrap(), 1.5);
        assert_eq!(parse_f64("-0.25E+01", 1, "x").unwrap(), -2.5);
        assert!(parse_f64("****", 1, "x").is_err());
        assert!(parse_f64("NaN", 1, "x").is_err());

        match parse_f64("1.2.3", 7, "  >Blue_moon") {
            Err(ParseError::BadNumber { line: 7, marker: "  >Blue_moon", ref token }) => assert_eq!(token, "1.2.3"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_floats() {
        assert_eq!(parse_f64_or_missing("2.0", 1, "x").unwrap(), Some(2.0));
        assert_eq!(parse_f64_or_missing("*********", 1, "x").unwrap(), None);
        assert_eq!(parse_f64_or_missing("NaN", 1, "x").unwrap(), None);
        assert_eq!(parse_f64_or_missing("nan", 1, "x").unwrap(), None);
        assert!(parse_f64_or_missing("inf", 1, "x").is_err());
        assert!(parse_f64_or_missing("abc", 1, "x").is_err());
    }

    #[test]
    fn field_count() {
        assert_eq!(fields(" a b  c ", 3, 1, "x").unwrap(), vec!["a", "b", "c"]);
        match fields("a b", 3, 12, "   cc>") {
            Err(ParseError::FieldCount { line: 12, expected: 3, found: 2, .. }) => {},
            other => panic!("unexpected {:?}", other),
        }
    }
}
