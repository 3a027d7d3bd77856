// Copyright 2025 eraflo
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

//! Configuration of the SSAO post-processing stage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of kernel samples.
pub const DEFAULT_KERNEL_SIZE: u32 = 16;

/// Default edge length of the noise tile.
pub const DEFAULT_NOISE_SIZE: u32 = 128;

/// Largest kernel, bounded by the default 1D texture dimension limit.
pub const MAX_KERNEL_SIZE: u32 = 8192;

/// Largest noise tile edge, bounded by the default 2D texture dimension limit.
pub const MAX_NOISE_SIZE: u32 = 8192;

/// Errors raised while loading or validating [`SsaoSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A kernel of zero samples cannot be generated.
    #[error("SSAO kernel size must be at least 1")]
    ZeroKernelSize,
    /// A noise tile of zero texels cannot be uploaded.
    #[error("SSAO noise tile size must be at least 1")]
    ZeroNoiseSize,
    /// The kernel does not fit in a 1D texture.
    #[error("SSAO kernel size {0} exceeds the maximum of {MAX_KERNEL_SIZE}")]
    KernelTooLarge(u32),
    /// The noise tile does not fit in a 2D texture.
    #[error("SSAO noise tile size {0} exceeds the maximum of {MAX_NOISE_SIZE}")]
    NoiseTooLarge(u32),
    /// The settings file could not be read.
    #[error("failed to read settings from '{path}': {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The settings are not valid JSON for this type.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of the SSAO post-processing stage.
///
/// Missing fields take their default when deserialized, so `{}` is a valid
/// settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaoSettings {
    /// Number of kernel samples.
    pub kernel_size: u32,
    /// Edge length of the square noise tile.
    pub noise_size: u32,
    /// WGSL file replacing the built-in shader.
    pub shader_path: Option<PathBuf>,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            noise_size: DEFAULT_NOISE_SIZE,
            shader_path: None,
        }
    }
}

impl SsaoSettings {
    /// Rejects sizes the stage cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.kernel_size == 0 {
            return Err(SettingsError::ZeroKernelSize);
        }
        if self.noise_size == 0 {
            return Err(SettingsError::ZeroNoiseSize);
        }
        if self.kernel_size > MAX_KERNEL_SIZE {
            return Err(SettingsError::KernelTooLarge(self.kernel_size));
        }
        if self.noise_size > MAX_NOISE_SIZE {
            return Err(SettingsError::NoiseTooLarge(self.noise_size));
        }
        Ok(())
    }

    /// Parses and validates settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded SSAO settings from {}", path.display());
        Self::from_json_str(&content)
    }
}
