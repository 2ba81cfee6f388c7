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

//! src/config/mod.rs
//!
//! Engine settings and safe output writes
//!
//! - **`EngineConfig`**: YAML settings that tune validation and export
//! - **`write_atomic`**: temp-file-then-rename writes, so an export target
//!   is never left half written
//!
//! # Example
//!
//! ```
//! use event_mask_selector::config::EngineConfig;
//! use event_mask_selector::core::{MaskMode, MixedGroupPolicy};
//!
//! let config = EngineConfig::from_yaml_str("mixed_groups: error\nmask_mode: capture_mask\n")?;
//! assert_eq!(config.mixed_groups, Some(MixedGroupPolicy::Error));
//! assert_eq!(config.mask_mode, MaskMode::CaptureMask);
//! assert!(config.include_masks);
//! # Ok::<(), event_mask_selector::config::ConfigError>(())
//! ```

pub mod error;

pub use error::ConfigError;

use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::core::types::{FormatKind, MaskMode};
use crate::core::validator::{MixedGroupPolicy, Validator};

/// Settings shared by every session a facade opens
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Mixed-group policy; `None` uses the format's default
    pub mixed_groups: Option<MixedGroupPolicy>,
    /// Mask a new session edits
    pub mask_mode: MaskMode,
    /// Write register words into exported selection blocks
    pub include_masks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mixed_groups: None,
            mask_mode: MaskMode::EventMask,
            include_masks: true,
        }
    }
}

impl EngineConfig {
    /// Reads settings from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist,
    /// `ConfigError::Invalid` if it doesn't parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parses settings; an empty document yields the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Validator for models of the given format under these settings
    pub fn validator(&self, format: FormatKind) -> Validator {
        Validator::for_format(format, self.mixed_groups)
    }
}

/// Atomically replaces `path` with `content`
///
/// The write goes to a temporary file that is renamed over the target, so
/// readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options().open(path).map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e))
    })?;

    file.write_all(content)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit().map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e))
    })?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests;
