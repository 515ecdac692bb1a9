/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::io::BufRead;

use crate::ParseError;

/// Line-at-a-time reader that tracks line numbers and allows one line of
/// lookahead to be pushed back.
pub(crate) struct LineReader<R> {
    inner: R,
    line: usize,
    pushed: Option<String>,
    buf: String,
    // number of a final line that had no terminator
    cut: Option<usize>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self
    { LineReader { inner, line: 0, pushed: None, buf: String::new(), cut: None } }

    /// Number of the line most recently returned by `next_line`.
    pub fn line_number(&self) -> usize
    { self.line }

    /// Whether line `n` ended the input without a terminator.
    ///
    /// This is how a log looks when its writer was killed partway through a line.
    pub fn is_cut(&self, n: usize) -> bool
    { self.cut == Some(n) }

    /// Turns a field-count or number error on a cut final line into `Ok(None)`.
    ///
    /// The same errors anywhere else are passed through.
    pub fn unless_cut<T>(&self, n: usize, result: Result<T, ParseError>) -> Result<Option<T>, ParseError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ParseError::FieldCount { .. }) |
            Err(ParseError::BadNumber { .. }) if self.is_cut(n) => {
                debug!("line {} is cut short; treating it as the end of the log", n);
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// The next line without its terminator, or `None` at EOF.
    pub fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        if let Some(line) = self.pushed.take() {
            self.line += 1;
            return Ok(Some(line));
        }

        self.buf.clear();
        match self.inner.read_line(&mut self.buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.line += 1;
                if !self.buf.ends_with('\n') {
                    self.cut = Some(self.line);
                }
                let text = self.buf.trim_end_matches(|c| c == '\n' || c == '\r');
                Ok(Some(text.to_string()))
            },
            Err(error) => Err(ParseError::Io { line: self.line + 1, error }),
        }
    }

    /// Un-read a line so that the next call to `next_line` returns it.
    pub fn push_back(&mut self, line: String) {
        assert!(self.pushed.is_none(), "only one line of pushback");
        self.line -= 1;
        self.pushed = Some(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_and_pushback() {
        let text = "first\r\nsecond\nthird";
        let mut r = LineReader::new(text.as_bytes());
        assert_eq!(r.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(r.line_number(), 1);

        let second = r.next_line().unwrap().unwrap();
        assert_eq!(r.line_number(), 2);
        r.push_back(second);
        assert_eq!(r.line_number(), 1);

        assert_eq!(r.next_line().unwrap().as_deref(), Some("second"));
        assert_eq!(r.next_line().unwrap().as_deref(), Some("third"));
        assert_eq!(r.line_number(), 3);
        assert_eq!(r.next_line().unwrap(), None);
        assert_eq!(r.line_number(), 3);
    }

    #[test]
    fn cut_final_line() {
        let short = || Err::<(), _>(ParseError::FieldCount {
            line: 2, marker: "x", expected: 3, found: 1, text: "1.".into(),
        });

        let mut r = LineReader::new("1 2 3\n1.".as_bytes());
        r.next_line().unwrap();
        assert!(!r.is_cut(1));
        r.next_line().unwrap();
        assert!(r.is_cut(2));
        assert_eq!(r.unless_cut(2, short()).unwrap(), None);
        assert_eq!(r.unless_cut(2, Ok(4)).unwrap(), Some(4));

        // terminated, so the short line is an error
        let mut r = LineReader::new("1 2 3\n1.\n".as_bytes());
        r.next_line().unwrap();
        r.next_line().unwrap();
        assert!(!r.is_cut(2));
        assert!(r.unless_cut(2, short()).is_err());

        // pushback keeps the numbering
        let mut r = LineReader::new("a\nb".as_bytes());
        r.next_line().unwrap();
        let b = r.next_line().unwrap().unwrap();
        r.push_back(b);
        assert_eq!(r.next_line().unwrap().as_deref(), Some("b"));
        assert!(r.is_cut(r.line_number()));
    }
}
