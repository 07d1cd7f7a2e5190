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

use crate::tokenizer::RawToken;
use std::fmt;

/// Normalized content of one column in a `VALUES` tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Unquoted `NULL` keyword, in any case
    Null,
    /// Payload with its source quoting and escaping removed
    Text(String),
}

impl Value {
    /// Strips the original quoting of a raw token.
    ///
    /// `'...'` spans have their doubled single quotes collapsed and `"..."`
    /// spans have their `\"` escapes collapsed. Anything else (numbers, bare
    /// words, unterminated quotes) is kept as trimmed text.
    pub fn normalize(token: &RawToken) -> Value {
        let raw = token.as_str().trim();

        if raw.eq_ignore_ascii_case("NULL") {
            return Value::Null;
        }

        if let Some(inner) = strip_quote_pair(raw, '\'') {
            return Value::Text(inner.replace("''", "'"));
        }

        if let Some(inner) = strip_quote_pair(raw, '"') {
            return Value::Text(inner.replace("\\\"", "\""));
        }

        Value::Text(raw.to_string())
    }

    /// Renders the value as a single-quoted SQL literal.
    ///
    /// Single quotes inside the payload are dropped, not escaped, so
    /// `O'Brien` comes out as `'OBrien'`. `NULL` stays an unquoted keyword.
    pub fn requote(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Text(payload) => {
                let unwrapped = strip_quote_pair(payload, '\'')
                    .or_else(|| strip_quote_pair(payload, '"'))
                    .unwrap_or(payload.as_str());
                let stripped = unwrapped.replace('\'', "");
                format!("'{}'", escape_single_quote_string(&stripped))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Returns the text between a leading and trailing `quote`, if both exist.
///
/// A lone quote character counts as its own pair and unwraps to nothing.
pub(crate) fn strip_quote_pair(s: &str, quote: char) -> Option<&str> {
    if !(s.starts_with(quote) && s.ends_with(quote)) {
        return None;
    }
    let width = quote.len_utf8();
    if s.len() < 2 * width {
        return Some("");
    }
    Some(&s[width..s.len() - width])
}

pub struct EscapeSingleQuoteString<'a>(&'a str);

impl<'a> fmt::Display for EscapeSingleQuoteString<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0.chars() {
            if c == '\'' {
                write!(f, "\'\'")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

pub fn escape_single_quote_string(s: &str) -> EscapeSingleQuoteString<'_> {
    EscapeSingleQuoteString(s)
}
