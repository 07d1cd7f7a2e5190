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

//! Error types for the dump masker

use thiserror::Error;

/// Errors raised by the fallible outer layers: policy parsing and dump I/O.
///
/// Statement rewriting itself never fails, see [`crate::Unchanged`].
#[derive(Error, Debug)]
pub enum MaskError {
    #[error("I/O error while processing dump")]
    Io(#[from] std::io::Error),

    #[error("invalid column policy entry `{entry}`: {reason}")]
    InvalidPolicy { entry: String, reason: String },

    #[error("column {index} has more than one policy")]
    DuplicateColumn { index: usize },

    #[error("invalid mask `{spec}`: {reason}")]
    InvalidMask { spec: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MaskError>;
