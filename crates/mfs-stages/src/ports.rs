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

//! Typed port values exchanged between the stages of the painter.
//!
//! Each newtype is the value stored in a
//! [`StageContext`](mfs_core::stage::StageContext) under its port name.
//!
//! | Port                 | Type                     | Producer       |
//! |----------------------|--------------------------|----------------|
//! | `viewport`           | [`Viewport`]             | host           |
//! | `camera`             | [`CameraInfo`]           | host           |
//! | `projection`         | [`ProjectionInfo`]       | host           |
//! | `color`              | [`ColorTexture`]         | rasterization  |
//! | `normal`             | [`NormalTexture`]        | rasterization  |
//! | `depth`              | [`DepthTexture`]         | rasterization  |
//! | `worldPos`           | [`WorldPositionTexture`] | rasterization  |
//! | `reflectMask`        | [`ReflectionMaskTexture`]| rasterization  |
//! | `currentFrame`       | [`CurrentFrame`]         | rasterization  |
//! | `postprocessedFrame` | [`PostprocessedFrame`]   | postprocessing |
//! | `accumulation`       | [`Accumulation`]         | accumulation   |

use mfs_core::math::{Mat3, Mat4};
use mfs_core::renderer::TextureViewId;

/// Port names, shared by producers and consumers.
pub mod names {
    /// Current viewport.
    pub const VIEWPORT: &str = "viewport";
    /// Camera data.
    pub const CAMERA: &str = "camera";
    /// Projection data.
    pub const PROJECTION: &str = "projection";
    /// Rasterized color.
    pub const COLOR: &str = "color";
    /// Rasterized view-space normals.
    pub const NORMAL: &str = "normal";
    /// Rasterized depth.
    pub const DEPTH: &str = "depth";
    /// Rasterized world positions.
    pub const WORLD_POSITION: &str = "worldPos";
    /// Reflection mask.
    pub const REFLECTION_MASK: &str = "reflectMask";
    /// Index of the frame within the multi-frame sequence.
    pub const CURRENT_FRAME: &str = "currentFrame";
    /// Output of the post-processing stage.
    pub const POSTPROCESSED_FRAME: &str = "postprocessedFrame";
    /// Accumulated frames.
    pub const ACCUMULATION: &str = "accumulation";
}

/// Size of the surface rendered into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size as floats, as uploaded to shaders.
    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Camera data read by the post-processing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInfo {
    /// Transforms normals into view space.
    pub normal_matrix: Mat3,
}

impl CameraInfo {
    /// Derives the normal matrix from a view matrix. Falls back to identity
    /// for a singular view.
    pub fn from_view(view: &Mat4) -> Self {
        Self {
            normal_matrix: Mat3::normal_matrix(view).unwrap_or(Mat3::IDENTITY),
        }
    }
}

/// Perspective projection data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInfo {
    /// The projection matrix.
    pub projection: Mat4,
    /// Its inverse.
    pub projection_inverse: Mat4,
    /// Distance of the far clip plane.
    pub z_far: f32,
}

impl ProjectionInfo {
    /// A right-handed perspective projection with `[0, 1]` depth.
    pub fn perspective(fov_y: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self::from_matrix(Mat4::perspective_rh_zo(fov_y, aspect, z_near, z_far), z_far)
    }

    /// Wraps an existing projection. A singular matrix gets an identity
    /// inverse.
    pub fn from_matrix(projection: Mat4, z_far: f32) -> Self {
        Self {
            projection,
            projection_inverse: projection.inverse().unwrap_or(Mat4::IDENTITY),
            z_far,
        }
    }
}

/// Rasterized color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTexture(pub TextureViewId);

/// Rasterized view-space normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalTexture(pub TextureViewId);

/// Rasterized depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTexture(pub TextureViewId);

/// Rasterized world positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldPositionTexture(pub TextureViewId);

/// Mask of reflective surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectionMaskTexture(pub TextureViewId);

/// Index of the frame within the multi-frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentFrame(pub u32);

/// Output of the post-processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessedFrame(pub TextureViewId);

/// Accumulated frames, ready to be blitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulation(pub TextureViewId);

#[cfg(test)]
mod tests {
    use super::*;
    use mfs_core::math::{approx_eq, Vec4, FRAC_PI_2};

    #[test]
    fn test_viewport_size() {
        assert_eq!(Viewport::new(800, 600).size(), [800.0, 600.0]);
    }

    #[test]
    fn test_projection_inverse_roundtrip() {
        let info = ProjectionInfo::perspective(FRAC_PI_2, 4.0 / 3.0, 0.1, 100.0);
        let p = Vec4::new(0.3, -0.2, -5.0, 1.0);
        let back = info.projection_inverse * (info.projection * p);
        assert!((back.x / back.w - p.x).abs() < 1e-3);
        assert!((back.z / back.w - p.z).abs() < 1e-3);
        assert!(approx_eq(info.z_far, 100.0));
    }

    #[test]
    fn test_camera_from_identity_view() {
        let camera = CameraInfo::from_view(&Mat4::IDENTITY);
        assert_eq!(camera.normal_matrix, Mat3::IDENTITY);
    }
}
