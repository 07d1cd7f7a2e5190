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

//! SQL dump INSERT value masker in Rust
//!
//! This crate rewrites the literal values of `INSERT INTO ... VALUES`
//! statements so a database dump can be shared without its sensitive
//! columns. Columns are addressed by their position in the value tuple and
//! are either passed through, masked down to a short prefix, or replaced
//! with random digits.
//!
//! ```rust
//! use sqldump_masker::{ColumnPolicy, MaskSpec, PolicyTable, StatementRewriter};
//!
//! let policy = PolicyTable::new().with(1, ColumnPolicy::Mask(MaskSpec::default()));
//! let rewriter = StatementRewriter::new(&policy);
//!
//! let masked = rewriter.rewrite_or_passthrough(
//!     "INSERT INTO t (a,b,c) VALUES ('1234567890123456','John Doe','secret');",
//!     &mut rand::thread_rng(),
//! );
//!
//! assert_eq!(
//!     masked,
//!     "INSERT INTO t (a,b,c) VALUES\n('1234567890123456','Joh*****','secret');"
//! );
//! ```
//!
//! Whole dumps are streamed with [`mask_dump`], which leaves everything
//! that is not an `INSERT` statement untouched:
//!
//! ```rust,no_run
//! use sqldump_masker::{mask_dump, PolicyTable};
//! # use std::fs::File;
//! # use std::io::{self, BufReader};
//! # fn main() -> Result<(), sqldump_masker::MaskError> {
//! let mut input = BufReader::new(File::open("dump.sql")?);
//! let stats = mask_dump(
//!     &mut input,
//!     &mut io::stdout(),
//!     &PolicyTable::individu(),
//!     &mut rand::thread_rng(),
//! )?;
//! eprintln!("{}", stats);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod ast;
mod dump;
mod error;
mod mask;
mod parser;
mod tokenizer;

pub use ast::{
    escape_single_quote_string, ColumnPolicy, EscapeSingleQuoteString, MaskSpec, PolicyTable,
    SyntheticKind, Value,
};
pub use dump::{mask_dump, DumpScanner, DumpStats, Segment};
pub use error::{MaskError, Result};
pub use mask::{mask_literal, synthesize, DigitSource, FixedDigits};
pub use parser::{extract_tuples, Rewritten, StatementRewriter, Unchanged};
pub use tokenizer::{RawToken, Tokenizer};
