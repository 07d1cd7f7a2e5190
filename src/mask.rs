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

//! Value replacement: prefix masking and synthetic digit strings.

use crate::ast::{MaskSpec, SyntheticKind};
use rand::{Rng, RngCore};

/// Masks an already quoted literal, keeping only `spec.prefix_len`
/// characters of its payload.
///
/// Blank input is returned untouched. `NULL` and anything else not
/// starting with a single quote are returned trimmed. Payloads no longer
/// than the prefix are not masked. The masked payload is always `prefix_len + mask_len` characters
/// long whatever the source length was.
pub fn mask_literal(literal: &str, spec: &MaskSpec) -> String {
    if literal.trim().is_empty() {
        return literal.to_string();
    }
    let literal = literal.trim();
    if !literal.starts_with('\'') {
        return literal.to_string();
    }

    let mut chars = literal.chars();
    chars.next();
    chars.next_back();
    let inner = chars.as_str();

    if inner.chars().count() <= spec.prefix_len {
        return literal.to_string();
    }

    let mut masked: String = inner.chars().take(spec.prefix_len).collect();
    masked.extend(std::iter::repeat(spec.mask_char).take(spec.mask_len));
    format!("'{}'", masked)
}

/// Source of uniformly distributed decimal digits
pub trait DigitSource {
    /// Next digit, in `0..=9`
    fn next_digit(&mut self) -> u8;
}

impl<R: RngCore + ?Sized> DigitSource for R {
    fn next_digit(&mut self) -> u8 {
        self.gen_range(0..10)
    }
}

/// Repeats a fixed digit sequence forever
#[derive(Debug, Clone)]
pub struct FixedDigits {
    digits: Vec<u8>,
    position: usize,
}

impl FixedDigits {
    /// Digits are taken from the ASCII digits of `pattern`, other characters
    /// are ignored. A pattern without digits yields zeros.
    pub fn new(pattern: &str) -> Self {
        let digits: Vec<u8> = pattern
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        FixedDigits {
            digits: if digits.is_empty() { vec![0] } else { digits },
            position: 0,
        }
    }
}

impl DigitSource for FixedDigits {
    fn next_digit(&mut self) -> u8 {
        let digit = self.digits[self.position % self.digits.len()];
        self.position = self.position.wrapping_add(1);
        digit
    }
}

/// Generates a random digit string.
///
/// A full 16 digit identifier is always drawn, so both kinds consume the same
/// amount of randomness.
pub fn synthesize(kind: SyntheticKind, source: &mut dyn DigitSource) -> String {
    let mut id: String = (0..16)
        .map(|_| char::from(b'0' + source.next_digit() % 10))
        .collect();
    id.truncate(kind.digits());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn keeps_prefix_and_fixed_mask_run() {
        let spec = MaskSpec::default();
        assert_eq!(mask_literal("'John Doe'", &spec), "'Joh*****'");
        assert_eq!(mask_literal("'abcd'", &spec), "'abc*****'");
        assert_eq!(
            mask_literal("'a very long free text column'", &spec),
            "'a v*****'"
        );
    }

    #[test]
    fn short_payloads_are_not_masked() {
        let spec = MaskSpec::default();
        assert_eq!(mask_literal("'abc'", &spec), "'abc'");
        assert_eq!(mask_literal("''", &spec), "''");
        assert_eq!(mask_literal("'", &spec), "'");
    }

    #[test]
    fn unexpected_shapes_pass_through() {
        let spec = MaskSpec::default();
        assert_eq!(mask_literal("NULL", &spec), "NULL");
        assert_eq!(mask_literal("12345", &spec), "12345");
        assert_eq!(mask_literal("   ", &spec), "   ");
        assert_eq!(mask_literal(" 12345 ", &spec), "12345");
        assert_eq!(mask_literal("", &spec), "");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let spec = MaskSpec::default();
        assert_eq!(mask_literal("'ÅÄÖ'", &spec), "'ÅÄÖ'");
        assert_eq!(mask_literal("'ÅÄÖÜ'", &spec), "'ÅÄÖ*****'");
    }

    #[test]
    fn custom_mask_spec() {
        let spec = MaskSpec {
            prefix_len: 1,
            mask_char: '#',
            mask_len: 2,
        };
        assert_eq!(mask_literal("'secret'", &spec), "'s##'");
    }

    #[test]
    fn masked_length_is_constant() {
        let spec = MaskSpec::default();
        for payload in &["abcd", "abcdefgh", "abcdefghijklmnopqrstuvwxyz"] {
            let masked = mask_literal(&format!("'{}'", payload), &spec);
            let inner = &masked[1..masked.len() - 1];
            assert_eq!(inner.chars().count(), 8);
            assert_eq!(&inner[..3], &payload[..3]);
        }
    }

    #[test]
    fn synthetic_values_are_ascii_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = synthesize(SyntheticKind::SixteenDigitId, &mut rng);
            assert_eq!(id.len(), 16);
            assert!(id.bytes().all(|b| b.is_ascii_digit()));

            let code = synthesize(SyntheticKind::FifteenDigitCode, &mut rng);
            assert_eq!(code.len(), 15);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn fifteen_digit_code_is_truncated_identifier() {
        let mut digits = FixedDigits::new("1234567890123456");
        assert_eq!(
            synthesize(SyntheticKind::FifteenDigitCode, &mut digits),
            "123456789012345"
        );
        assert_eq!(
            synthesize(SyntheticKind::SixteenDigitId, &mut digits),
            "1234567890123456"
        );
    }

    #[test]
    fn fixed_digits_cycle() {
        let mut digits = FixedDigits::new("1-2");
        let drawn: Vec<u8> = (0..5).map(|_| digits.next_digit()).collect();
        assert_eq!(drawn, vec![1, 2, 1, 2, 1]);
        assert_eq!(FixedDigits::new("").next_digit(), 0);
    }
}
