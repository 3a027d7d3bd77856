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

//! Built-in shader sources.
//!
//! # Usage
//!
//! ```ignore
//! use mfs_stages::shaders::POSTPROCESSING_WGSL;
//! use mfs_core::renderer::{ShaderModuleDescriptor, ShaderSourceData};
//! use std::borrow::Cow;
//!
//! let descriptor = ShaderModuleDescriptor {
//!     label: Some("postprocessing"),
//!     source: ShaderSourceData::Wgsl(Cow::Borrowed(POSTPROCESSING_WGSL)),
//! };
//! ```

/// Full-screen SSAO post-processing shader.
///
/// Draws a single triangle covering the screen (`vs_main`, three vertices,
/// no vertex buffer) and darkens the rasterized color by the occlusion
/// estimated from the kernel (`fs_main`).
///
/// | Binding | Resource             |
/// |---------|----------------------|
/// | 0       | `colorSampler`       |
/// | 1       | `normalSampler`      |
/// | 2       | `depthSampler`       |
/// | 3       | `ssaoKernelSampler`  |
/// | 4       | `ssaoNoiseSampler`   |
/// | 5       | kernel/noise sampler |
/// | 6       | `params` uniforms    |
pub const POSTPROCESSING_WGSL: &str = include_str!("postprocessing.wgsl");

/// Entry point of the vertex stage.
pub const VERTEX_ENTRY: &str = "vs_main";

/// Entry point of the fragment stage.
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_declares_interface() {
        for name in [
            "projectionMatrix",
            "projectionInverseMatrix",
            "normalMatrix",
            "farZ",
            "screenSize",
            "samplerSizes",
            "colorSampler",
            "normalSampler",
            "depthSampler",
            "ssaoKernelSampler",
            "ssaoNoiseSampler",
            VERTEX_ENTRY,
            FRAGMENT_ENTRY,
        ] {
            assert!(POSTPROCESSING_WGSL.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_bindings_are_numbered() {
        for binding in 0..=6 {
            let needle = format!("@binding({})", binding);
            assert_eq!(POSTPROCESSING_WGSL.matches(&needle).count(), 1, "{}", needle);
        }
    }
}
