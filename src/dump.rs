// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dump stream processing
//!
//! A dump is split into complete `INSERT ... ;` statements and everything
//! else. Statements are rewritten, the rest is copied through byte for byte
//! at its original position.

use log::{debug, info, warn};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::iter::Peekable;
use utf8_chars::{BufReadCharsExt, Chars, ReadCharError};

use super::ast::PolicyTable;
use super::error::Result;
use super::mask::DigitSource;
use super::parser::{StatementRewriter, Unchanged};

/// A piece of the input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// One complete `INSERT` statement, from the keyword up to and
    /// including its terminating `;`
    Insert(String),
    /// An `INSERT` statement cut off by the end of input before its `;`
    UnterminatedInsert(String),
    /// Any other text: whitespace, comments, other statements
    Other(String),
}

/// Splits a dump read from a [`BufRead`] into [`Segment`]s.
///
/// Quoted spans and comments are opaque when looking for the `;` that ends
/// a statement. An `INSERT` still open when the input ends is returned as
/// [`Segment::UnterminatedInsert`], any other open statement as
/// [`Segment::Other`].
pub struct DumpScanner<'a> {
    input: Peekable<Chars<'a, dyn BufRead + 'a>>,
    pending: Option<Segment>,
}

impl<'a> DumpScanner<'a> {
    pub fn new(input: &'a mut dyn BufRead) -> Self {
        Self {
            input: input.chars().peekable(),
            pending: None,
        }
    }

    fn scan(&mut self) -> io::Result<Option<Segment>> {
        let mut other = String::new();

        while let Some(ch) = self.next_char()? {
            if ch.is_whitespace() {
                other.push(ch);
                continue;
            }

            match (ch, self.peek_char()?) {
                ('-', Some('-')) | ('/', Some('*')) => {
                    other.push(ch);
                    self.take_comment(ch, &mut other)?;
                    continue;
                }
                (';', _) => {
                    other.push(ch);
                    continue;
                }
                _ => {}
            }

            let mut statement = ch.to_string();
            if ch.is_alphabetic() || ch == '_' {
                statement.push_str(&self.peeking_take_while(|c| c.is_alphanumeric() || c == '_')?);
            }
            let is_insert = statement.eq_ignore_ascii_case("INSERT");
            let terminated = self.take_statement(&mut statement)?;

            if is_insert {
                debug!("scanned INSERT statement ({} bytes)", statement.len());
                let segment = if terminated {
                    Segment::Insert(statement)
                } else {
                    Segment::UnterminatedInsert(statement)
                };
                if other.is_empty() {
                    return Ok(Some(segment));
                }
                self.pending = Some(segment);
                return Ok(Some(Segment::Other(other)));
            }
            other.push_str(&statement);
        }

        if other.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Segment::Other(other)))
        }
    }

    /// Read the rest of a statement up to and including its `;`. Returns
    /// `false` when the input ends first.
    fn take_statement(&mut self, s: &mut String) -> io::Result<bool> {
        while let Some(ch) = self.next_char()? {
            s.push(ch);
            match ch {
                ';' => return Ok(true),
                '\'' => self.take_single_quoted(s)?,
                '"' => self.take_double_quoted(s)?,
                '-' | '/' => {
                    let opens_comment = match (ch, self.peek_char()?) {
                        ('-', Some('-')) | ('/', Some('*')) => true,
                        _ => false,
                    };
                    if opens_comment {
                        self.take_comment(ch, s)?;
                    }
                }
                _ => {}
            }
        }
        Ok(false)
    }

    /// The opening quote is already consumed. `''` does not close the span.
    fn take_single_quoted(&mut self, s: &mut String) -> io::Result<()> {
        while let Some(ch) = self.next_char()? {
            s.push(ch);
            if ch == '\'' {
                if self.peek_char()? == Some('\'') {
                    self.input.next();
                    s.push('\'');
                } else {
                    break;
                }
            }
        }
        Ok(())
    }

    /// The opening quote is already consumed. `\"` does not close the span.
    fn take_double_quoted(&mut self, s: &mut String) -> io::Result<()> {
        while let Some(ch) = self.next_char()? {
            s.push(ch);
            match ch {
                '\\' if self.peek_char()? == Some('"') => {
                    self.input.next();
                    s.push('"');
                }
                '"' => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// `first` (`-` or `/`) is already consumed and pushed, the second comment
    /// character is still pending.
    fn take_comment(&mut self, first: char, s: &mut String) -> io::Result<()> {
        if let Some(second) = self.next_char()? {
            s.push(second);
        }
        if first == '-' {
            while let Some(ch) = self.next_char()? {
                s.push(ch);
                if ch == '\n' {
                    break;
                }
            }
            return Ok(());
        }

        let mut maybe_closing_comment = false;
        while let Some(ch) = self.next_char()? {
            s.push(ch);
            if maybe_closing_comment && ch == '/' {
                break;
            }
            maybe_closing_comment = ch == '*';
        }
        Ok(())
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        self.input
            .next()
            .transpose()
            .map_err(ReadCharError::into_io_error)
    }

    fn peek_char(&mut self) -> io::Result<Option<char>> {
        let failed = matches!(self.input.peek(), Some(Err(_)));
        if failed {
            return self.next_char();
        }
        Ok(self.input.peek().and_then(|r| r.as_ref().ok()).copied())
    }

    /// Read while `predicate` holds, leaving the first non-matching char
    /// unconsumed.
    fn peeking_take_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> io::Result<String> {
        let mut s = String::new();
        while let Some(ch) = self.peek_char()? {
            if predicate(ch) {
                self.input.next();
                s.push(ch);
            } else {
                break;
            }
        }
        Ok(s)
    }
}

impl<'a> Iterator for DumpScanner<'a> {
    type Item = io::Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(segment) = self.pending.take() {
            return Some(Ok(segment));
        }
        self.scan().transpose()
    }
}

/// Counters collected while masking a dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub statements_rewritten: usize,
    pub tuples_rewritten: usize,
    pub shape_mismatches: usize,
    pub statements_without_tuples: usize,
    pub unterminated_inserts: usize,
}

impl DumpStats {
    /// INSERT statements copied through untouched
    pub fn unchanged(&self) -> usize {
        self.shape_mismatches + self.statements_without_tuples + self.unterminated_inserts
    }

    fn record_unchanged(&mut self, reason: Unchanged) {
        match reason {
            Unchanged::ShapeMismatch => self.shape_mismatches += 1,
            Unchanged::NoTuplesFound => self.statements_without_tuples += 1,
        }
    }
}

impl fmt::Display for DumpStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} INSERT statements rewritten ({} tuples), {} left unchanged",
            self.statements_rewritten,
            self.tuples_rewritten,
            self.unchanged()
        )
    }
}

/// Copy a dump from `input` to `output`, masking the values of every
/// `INSERT` statement according to `policy`.
pub fn mask_dump(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    policy: &PolicyTable,
    source: &mut dyn DigitSource,
) -> Result<DumpStats> {
    let rewriter = StatementRewriter::new(policy);
    let mut stats = DumpStats::default();

    for segment in DumpScanner::new(input) {
        match segment? {
            Segment::Other(text) => output.write_all(text.as_bytes())?,
            Segment::UnterminatedInsert(statement) => {
                warn!(
                    "INSERT left unchanged, no terminating `;` before end of input: {}",
                    preview(&statement)
                );
                stats.unterminated_inserts += 1;
                output.write_all(statement.as_bytes())?;
            }
            Segment::Insert(statement) => match rewriter.rewrite(&statement, source) {
                Ok(rewritten) => {
                    stats.statements_rewritten += 1;
                    stats.tuples_rewritten += rewritten.tuples;
                    output.write_all(rewritten.text.as_bytes())?;
                }
                Err(reason) => {
                    warn!("INSERT left unchanged, {}: {}", reason, preview(&statement));
                    stats.record_unchanged(reason);
                    output.write_all(statement.as_bytes())?;
                }
            },
        }
    }

    output.flush()?;
    info!("{}", stats);
    Ok(stats)
}

fn preview(statement: &str) -> String {
    let mut preview: String = statement.chars().take(60).collect();
    if preview.len() < statement.len() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnPolicy, MaskSpec};
    use crate::mask::FixedDigits;
    use std::io::Cursor;

    fn segments(text: &str) -> Vec<Segment> {
        let mut cursor = Cursor::new(text.as_bytes());
        DumpScanner::new(&mut cursor)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    fn insert(s: &str) -> Segment {
        Segment::Insert(s.to_string())
    }

    fn other(s: &str) -> Segment {
        Segment::Other(s.to_string())
    }

    #[test]
    fn splits_inserts_from_other_text() {
        let dump = "-- header; comment\nDROP TABLE t;\nINSERT INTO t (a) VALUES (1);\nINSERT INTO t (a) VALUES (2);\n";
        assert_eq!(
            segments(dump),
            vec![
                other("-- header; comment\nDROP TABLE t;\n"),
                insert("INSERT INTO t (a) VALUES (1);"),
                other("\n"),
                insert("INSERT INTO t (a) VALUES (2);"),
                other("\n"),
            ]
        );
    }

    #[test]
    fn semicolons_in_quotes_and_comments_do_not_end_statements() {
        let dump = "insert into t (a,b) VALUES ('x;y', \"z;\\\";\") /* ; */;";
        assert_eq!(segments(dump), vec![insert(dump)]);
    }

    #[test]
    fn versioned_comments_and_empty_statements_are_other() {
        let dump = "/*!40101 SET NAMES utf8 */;\n;\nINSERT INTO t (a) VALUES ('it''s;');";
        assert_eq!(
            segments(dump),
            vec![
                other("/*!40101 SET NAMES utf8 */;\n;\n"),
                insert("INSERT INTO t (a) VALUES ('it''s;');"),
            ]
        );
    }

    #[test]
    fn words_starting_with_insert_are_not_inserts() {
        let dump = "INSERTED_ROWS = 1;";
        assert_eq!(segments(dump), vec![other(dump)]);
    }

    #[test]
    fn unterminated_statements_at_end_of_input() {
        let dump = "INSERT INTO t (a) VALUES ('open;";
        assert_eq!(
            segments(dump),
            vec![Segment::UnterminatedInsert(dump.to_string())]
        );

        let dump = "SELECT 1;\nUPDATE t SET a = 'open";
        assert_eq!(segments(dump), vec![other(dump)]);
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let mut input = Cursor::new(&b"INSERT INTO t (a) VALUES ('\xff\xfe');"[..]);
        let result: io::Result<Vec<Segment>> = DumpScanner::new(&mut input).collect();
        assert!(result.is_err());
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert!(segments("").is_empty());
    }

    #[test]
    fn mask_dump_rewrites_in_place() {
        let dump = "CREATE TABLE t (a int, b text);\nINSERT INTO t (a,b) VALUES (1,'Johnny'),(2,NULL);\nUNLOCK TABLES;\n";
        let policy = PolicyTable::new().with(1, ColumnPolicy::Mask(MaskSpec::default()));
        let mut digits = FixedDigits::new("0");
        let mut input = Cursor::new(dump.as_bytes());
        let mut output = vec![];

        let stats = mask_dump(&mut input, &mut output, &policy, &mut digits).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "CREATE TABLE t (a int, b text);\nINSERT INTO t (a,b) VALUES\n('1','Joh*****'),\n('2',NULL);\nUNLOCK TABLES;\n"
        );
        assert_eq!(
            stats,
            DumpStats {
                statements_rewritten: 1,
                tuples_rewritten: 2,
                shape_mismatches: 0,
                statements_without_tuples: 0,
                unterminated_inserts: 0,
            }
        );
    }

    #[test]
    fn mask_dump_counts_unchanged_inserts() {
        let dump = "INSERT INTO t VALUES (1);\nINSERT INTO t (a) VALUES 1;";
        let policy = PolicyTable::new();
        let mut digits = FixedDigits::new("0");
        let mut input = Cursor::new(dump.as_bytes());
        let mut output = vec![];

        let stats = mask_dump(&mut input, &mut output, &policy, &mut digits).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), dump);
        assert_eq!(stats.shape_mismatches, 1);
        assert_eq!(stats.statements_without_tuples, 1);
        assert_eq!(stats.unchanged(), 2);
    }

    #[test]
    fn mask_dump_counts_inserts_swallowed_by_an_open_quote() {
        let dump = "INSERT INTO t (a) VALUES ('O\\'Brien');\nINSERT INTO t (a) VALUES ('secret value');\n";
        let policy = PolicyTable::new().with(0, ColumnPolicy::Mask(MaskSpec::default()));
        let mut digits = FixedDigits::new("0");
        let mut input = Cursor::new(dump.as_bytes());
        let mut output = vec![];

        let stats = mask_dump(&mut input, &mut output, &policy, &mut digits).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), dump);
        assert_eq!(stats.statements_rewritten, 0);
        assert_eq!(stats.unterminated_inserts, 1);
        assert_eq!(stats.unchanged(), 1);
    }

    #[test]
    fn preview_is_bounded() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(100)).len(), 63);
    }
}
