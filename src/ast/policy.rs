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

use crate::error::MaskError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Shape of a masked value: `prefix_len` visible characters followed by
/// `mask_len` copies of `mask_char`.
///
/// The textual form is `mask:PREFIX:CHAR:COUNT`. A `mask_char` of `:`, `,`
/// or `'` has no textual form, so a spec built with one does not parse back
/// from its `Display` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskSpec {
    pub prefix_len: usize,
    pub mask_char: char,
    pub mask_len: usize,
}

impl Default for MaskSpec {
    fn default() -> Self {
        MaskSpec {
            prefix_len: 3,
            mask_char: '*',
            mask_len: 5,
        }
    }
}

impl fmt::Display for MaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "mask:{}:{}:{}",
            self.prefix_len, self.mask_char, self.mask_len
        )
    }
}

/// Freshly generated replacement values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    /// 16 random digits
    SixteenDigitId,
    /// 16 random digits cut down to the first 15
    FifteenDigitCode,
}

impl SyntheticKind {
    /// Number of digits in a generated value
    pub fn digits(self) -> usize {
        match self {
            SyntheticKind::SixteenDigitId => 16,
            SyntheticKind::FifteenDigitCode => 15,
        }
    }
}

impl fmt::Display for SyntheticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyntheticKind::SixteenDigitId => f.write_str("id16"),
            SyntheticKind::FifteenDigitCode => f.write_str("code15"),
        }
    }
}

/// What happens to one column of every tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnPolicy {
    PassThrough,
    Mask(MaskSpec),
    Synthesize(SyntheticKind),
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        ColumnPolicy::PassThrough
    }
}

impl fmt::Display for ColumnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnPolicy::PassThrough => f.write_str("pass"),
            ColumnPolicy::Mask(spec) => write!(f, "{}", spec),
            ColumnPolicy::Synthesize(kind) => write!(f, "{}", kind),
        }
    }
}

/// Parses `pass`, `mask`, `mask:PREFIX`, `mask:PREFIX:CHAR:COUNT`, `id16`
/// or `code15`.
impl FromStr for ColumnPolicy {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split(':');
        let kind = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let no_args = |policy: ColumnPolicy| {
            if args.is_empty() {
                Ok(policy)
            } else {
                Err(MaskError::InvalidPolicy {
                    entry: s.to_string(),
                    reason: format!("`{}` takes no arguments", kind),
                })
            }
        };

        match kind.as_str() {
            "pass" => no_args(ColumnPolicy::PassThrough),
            "id16" => no_args(ColumnPolicy::Synthesize(SyntheticKind::SixteenDigitId)),
            "code15" => no_args(ColumnPolicy::Synthesize(SyntheticKind::FifteenDigitCode)),
            "mask" => parse_mask_args(s, &args).map(ColumnPolicy::Mask),
            _ => Err(MaskError::InvalidPolicy {
                entry: s.to_string(),
                reason: "expected one of pass, mask, id16, code15".to_string(),
            }),
        }
    }
}

fn parse_mask_args(spec: &str, args: &[&str]) -> Result<MaskSpec, MaskError> {
    let invalid = |reason: &str| MaskError::InvalidMask {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };
    let number = |arg: &str, what: &str| {
        arg.trim()
            .parse::<usize>()
            .map_err(|_| invalid(&format!("{} must be a non-negative integer", what)))
    };

    let mut mask = MaskSpec::default();
    match *args {
        [] => {}
        [prefix] => mask.prefix_len = number(prefix, "prefix length")?,
        [prefix, mask_char, count] => {
            mask.prefix_len = number(prefix, "prefix length")?;
            let mut chars = mask_char.chars();
            mask.mask_char = match (chars.next(), chars.next()) {
                (Some('\''), None) => return Err(invalid("mask character cannot be a quote")),
                (Some(':'), None) | (Some(','), None) => {
                    return Err(invalid("mask character cannot be a separator"))
                }
                (Some(c), None) => c,
                _ => return Err(invalid("mask character must be a single character")),
            };
            mask.mask_len = number(count, "mask length")?;
        }
        _ => return Err(invalid("expected mask, mask:PREFIX or mask:PREFIX:CHAR:COUNT")),
    }
    Ok(mask)
}

/// Positional policy lookup. Columns without an entry pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    columns: BTreeMap<usize, ColumnPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Masking table of the `individu` export this tool was first written for.
    pub fn individu() -> Self {
        let mut table = PolicyTable::new()
            .with(0, ColumnPolicy::Synthesize(SyntheticKind::FifteenDigitCode))
            .with(18, ColumnPolicy::Synthesize(SyntheticKind::SixteenDigitId));
        for index in &[1, 10, 22, 24, 25, 52, 53, 72] {
            table.set(*index, ColumnPolicy::Mask(MaskSpec::default()));
        }
        table
    }

    pub fn with(mut self, index: usize, policy: ColumnPolicy) -> Self {
        self.set(index, policy);
        self
    }

    pub fn set(&mut self, index: usize, policy: ColumnPolicy) {
        self.columns.insert(index, policy);
    }

    pub fn get(&self, index: usize) -> ColumnPolicy {
        self.columns.get(&index).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ColumnPolicy)> + '_ {
        self.columns.iter().map(|(index, policy)| (*index, *policy))
    }
}

impl fmt::Display for PolicyTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut delim = "";
        for (index, policy) in self.iter() {
            write!(f, "{}{}={}", delim, index, policy)?;
            delim = ",";
        }
        Ok(())
    }
}

/// Parses a comma separated list of `INDEX=KIND` entries.
impl FromStr for PolicyTable {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = PolicyTable::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut halves = entry.splitn(2, '=');
            let (index, kind) = match (halves.next(), halves.next()) {
                (Some(index), Some(kind)) => (index.trim(), kind),
                _ => {
                    return Err(MaskError::InvalidPolicy {
                        entry: entry.to_string(),
                        reason: "expected INDEX=KIND".to_string(),
                    })
                }
            };
            let index = index
                .parse::<usize>()
                .map_err(|_| MaskError::InvalidPolicy {
                    entry: entry.to_string(),
                    reason: format!("`{}` is not a column index", index),
                })?;
            if table.columns.contains_key(&index) {
                return Err(MaskError::DuplicateColumn { index });
            }
            table.set(index, kind.parse()?);
        }

        Ok(table)
    }
}
