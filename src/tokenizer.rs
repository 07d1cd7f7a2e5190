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

//! Value tuple tokenizer
//!
//! Splits the interior of one parenthesized `VALUES` tuple into raw field
//! tokens. Three lexical classes are recognised:
//!
//! * `'single quoted'` spans, where `''` is an escaped quote
//! * `"double quoted"` spans, where `\"` is an escaped quote
//! * unquoted runs, ending at the next comma
//!
//! Commas inside a quoted span never separate fields.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// One field of a tuple as it appeared in the source, trimmed but still
/// carrying its original quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken(String);

impl RawToken {
    pub fn new(raw: &str) -> Self {
        RawToken(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tuple Tokenizer
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Set once a trailing separator has been consumed, so an empty final
    /// field is still reported
    pending_field: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over the text between a tuple's parentheses
    pub fn new(tuple: &'a str) -> Self {
        Self {
            chars: tuple.trim().chars().peekable(),
            pending_field: false,
        }
    }

    /// Tokenize the whole tuple.
    ///
    /// An all-whitespace tuple yields no fields. Otherwise there is one token
    /// per top-level comma plus one, empty ones included.
    pub fn tokenize(tuple: &str) -> Vec<RawToken> {
        Tokenizer::new(tuple).collect()
    }

    /// Read one field up to (and consuming) the next top-level comma.
    fn next_field(&mut self) -> RawToken {
        let mut s = String::new();
        self.pending_field = false;

        while let Some(&ch) = self.chars.peek() {
            match ch {
                ',' => {
                    self.chars.next();
                    self.pending_field = true;
                    break;
                }
                '\'' => self.tokenize_single_quoted(&mut s),
                '"' => self.tokenize_double_quoted(&mut s),
                _ => s.push_str(&self.peeking_take_while(|ch| !matches!(ch, ',' | '\'' | '"'))),
            }
        }

        RawToken::new(&s)
    }

    /// Copy a `'...'` span verbatim, quotes included. A doubled quote stays
    /// inside the span. Running out of input ends the span silently.
    fn tokenize_single_quoted(&mut self, s: &mut String) {
        let chars = &mut self.chars;
        if let Some(quote) = chars.next() {
            s.push(quote);
        }
        while let Some(ch) = chars.next() {
            s.push(ch);
            if ch == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    s.push('\'');
                } else {
                    break;
                }
            }
        }
    }

    /// Copy a `"..."` span verbatim, quotes included. `\"` stays inside the
    /// span. Running out of input ends the span silently.
    fn tokenize_double_quoted(&mut self, s: &mut String) {
        let chars = &mut self.chars;
        if let Some(quote) = chars.next() {
            s.push(quote);
        }
        while let Some(ch) = chars.next() {
            s.push(ch);
            match ch {
                '\\' if chars.peek() == Some(&'"') => {
                    chars.next();
                    s.push('"');
                }
                '"' => break,
                _ => {}
            }
        }
    }

    /// Read from `chars` until `predicate` returns `false` or the input ends.
    fn peeking_take_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(&ch) = self.chars.peek() {
            if predicate(ch) {
                self.chars.next();
                s.push(ch);
            } else {
                break;
            }
        }
        s
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = RawToken;

    fn next(&mut self) -> Option<RawToken> {
        if self.chars.peek().is_none() && !self.pending_field {
            return None;
        }
        Some(self.next_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(tuple: &str) -> Vec<String> {
        Tokenizer::tokenize(tuple)
            .into_iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn quoted_commas_do_not_split() {
        assert_eq!(fields(r#"'a,b',c,"d,e""#), vec!["'a,b'", "c", r#""d,e""#]);
    }

    #[test]
    fn doubled_single_quote_stays_in_span() {
        assert_eq!(fields("'O''Brien, Jr',2"), vec!["'O''Brien, Jr'", "2"]);
    }

    #[test]
    fn escaped_double_quote_stays_in_span() {
        assert_eq!(fields(r#""a\",b",x"#), vec![r#""a\",b""#, "x"]);
    }

    #[test]
    fn whitespace_around_fields_is_discarded() {
        assert_eq!(fields("  1 ,\t'x' ,\nNULL  "), vec!["1", "'x'", "NULL"]);
    }

    #[test]
    fn empty_fields_are_kept() {
        assert_eq!(fields("1,,2"), vec!["1", "", "2"]);
        assert_eq!(fields("1,"), vec!["1", ""]);
        assert_eq!(fields(","), vec!["", ""]);
    }

    #[test]
    fn blank_tuple_has_no_fields() {
        assert!(fields("").is_empty());
        assert!(fields("   ").is_empty());
    }

    #[test]
    fn parentheses_inside_quotes_are_data() {
        assert_eq!(fields("'(a)',')'"), vec!["'(a)'", "')'"]);
    }

    #[test]
    fn unterminated_quote_takes_the_rest() {
        assert_eq!(fields("1,'abc, def"), vec!["1", "'abc, def"]);
        assert_eq!(fields(r#""abc\"#), vec![r#""abc\"#]);
    }
}
