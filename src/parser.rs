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

//! INSERT statement rewriter

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{ColumnPolicy, PolicyTable, Value};
use super::mask::{mask_literal, synthesize, DigitSource};
use super::tokenizer::{RawToken, Tokenizer};
use std::fmt;

static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(INSERT\s+INTO\s+[^()]+\s*\([^()]+\))\s+VALUES\s*(.+)$").unwrap()
});

/// Why a statement was handed back untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unchanged {
    /// Not an `INSERT INTO table (columns) VALUES ...` statement
    ShapeMismatch,
    /// The `VALUES` part holds no parenthesized tuple
    NoTuplesFound,
}

impl fmt::Display for Unchanged {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Unchanged::ShapeMismatch => "statement is not an INSERT with a column list",
            Unchanged::NoTuplesFound => "no value tuples found",
        })
    }
}

/// A successfully rewritten statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub tuples: usize,
}

/// Applies a [`PolicyTable`] to the value tuples of `INSERT` statements.
///
/// The rewriter holds no random state. Synthetic values are drawn from the
/// [`DigitSource`] passed to each call.
#[derive(Debug, Clone, Copy)]
pub struct StatementRewriter<'a> {
    policy: &'a PolicyTable,
}

impl<'a> StatementRewriter<'a> {
    pub fn new(policy: &'a PolicyTable) -> Self {
        StatementRewriter { policy }
    }

    /// Rewrite one complete `INSERT ... VALUES (...), (...);` statement.
    ///
    /// The output is always `<header> VALUES\n<tuple>,\n<tuple>...;`.
    pub fn rewrite(
        &self,
        statement: &str,
        source: &mut dyn DigitSource,
    ) -> Result<Rewritten, Unchanged> {
        let captures = INSERT_RE.captures(statement).ok_or_else(|| {
            debug!("rewrite: shape mismatch");
            Unchanged::ShapeMismatch
        })?;
        let header = &captures[1];
        let values = &captures[2];
        debug!("rewrite: header {:?}", header);

        let tuples = extract_tuples(values);
        if tuples.is_empty() {
            debug!("rewrite: no tuples in {:?}", header);
            return Err(Unchanged::NoTuplesFound);
        }
        debug!("rewrite: {} tuples", tuples.len());

        let rows: Vec<String> = tuples
            .iter()
            .map(|tuple| self.rewrite_tuple(&Tokenizer::tokenize(tuple), source))
            .collect();

        Ok(Rewritten {
            text: format!("{} VALUES\n{};", header, rows.join(",\n")),
            tuples: rows.len(),
        })
    }

    /// Like [`rewrite`](Self::rewrite), but hands the input back verbatim
    /// when it cannot be rewritten.
    pub fn rewrite_or_passthrough(&self, statement: &str, source: &mut dyn DigitSource) -> String {
        match self.rewrite(statement, source) {
            Ok(rewritten) => rewritten.text,
            Err(_) => statement.to_string(),
        }
    }

    /// Apply the column policies to one tokenized tuple and render it as
    /// `(v1,v2,...)`.
    pub fn rewrite_tuple(&self, tokens: &[RawToken], source: &mut dyn DigitSource) -> String {
        let values: Vec<String> = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| self.rewrite_value(index, token, source))
            .collect();
        format!("({})", values.join(","))
    }

    fn rewrite_value(
        &self,
        index: usize,
        token: &RawToken,
        source: &mut dyn DigitSource,
    ) -> String {
        let value = Value::normalize(token);
        if value.is_null() {
            return "NULL".to_string();
        }

        match self.policy.get(index) {
            ColumnPolicy::PassThrough => value.requote(),
            ColumnPolicy::Mask(spec) => mask_literal(&value.requote(), &spec),
            ColumnPolicy::Synthesize(kind) => format!("'{}'", synthesize(kind, source)),
        }
    }
}

/// Finds the interior of every parenthesized tuple in a `VALUES` tail.
///
/// Quoted spans inside a tuple are opaque, so `')'` does not close it. An
/// unquoted `(` inside a tuple restarts the tuple there, and a tuple still
/// open when the input ends is dropped.
pub fn extract_tuples(values: &str) -> Vec<&str> {
    let mut tuples = vec![];
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut chars = values.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if let Some(q) = quote {
            match ch {
                '\'' if q == '\'' => {
                    if let Some((_, '\'')) = chars.peek() {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
                '\\' if q == '"' => {
                    if let Some((_, '"')) = chars.peek() {
                        chars.next();
                    }
                }
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }

        match ch {
            '(' => start = Some(i + 1),
            ')' => {
                if let Some(s) = start.take() {
                    tuples.push(&values[s..i]);
                }
            }
            '\'' | '"' if start.is_some() => quote = Some(ch),
            _ => {}
        }
    }

    tuples
}
