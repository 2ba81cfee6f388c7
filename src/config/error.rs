// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/config/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading settings or writing output files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Settings file is not valid YAML or has unknown keys.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
