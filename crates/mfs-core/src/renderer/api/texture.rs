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

//! Textures, texture views and samplers.

use std::borrow::Cow;

use super::format::{SampleCount, TextureFormat};
use crate::math::Extent3D;

/// An opaque handle to a texture owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a view onto a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

/// Dimensionality of a texture's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A row of texels.
    D1,
    /// A 2D image, possibly layered.
    D2,
    /// A volume.
    D3,
}

/// Dimensionality of a texture as seen through a view or a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A 1D texture.
    D1,
    /// A 2D texture.
    D2,
    /// A 3D texture.
    D3,
}

/// Which aspect of a texture a view exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageAspect {
    /// Every aspect of the format.
    #[default]
    All,
    /// The depth aspect of a depth/stencil format.
    DepthOnly,
}

mfs_flags! {
    /// How a texture may be used.
    pub struct TextureUsage: u32 {
        /// Source of a copy.
        const COPY_SRC = 1 << 0;
        /// Destination of a copy or a queue write.
        const COPY_DST = 1 << 1;
        /// Bound in a shader for reading.
        const TEXTURE_BINDING = 1 << 2;
        /// Bound in a shader as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Color or depth attachment of a render pass.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Describes a texture to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size of the base mip level.
    pub size: Extent3D,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Samples per texel.
    pub sample_count: SampleCount,
    /// Storage dimensionality.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
}

/// Describes a view onto a texture.
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Format of the view; `None` reuses the texture's format.
    pub format: Option<TextureFormat>,
    /// Dimensionality of the view; `None` derives it from the texture.
    pub dimension: Option<TextureViewDimension>,
    /// Exposed aspect.
    pub aspect: ImageAspect,
    /// First visible mip level.
    pub base_mip_level: u32,
    /// Number of visible mip levels; `None` means all remaining.
    pub mip_level_count: Option<u32>,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Tile the texture.
    Repeat,
    /// Tile the texture, flipping every other repetition.
    MirrorRepeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Closest texel.
    #[default]
    Nearest,
    /// Linear interpolation between texels.
    Linear,
}

/// Describes a sampler to create.
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Addressing along U.
    pub address_mode_u: AddressMode,
    /// Addressing along V.
    pub address_mode_v: AddressMode,
    /// Addressing along W.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
    /// Smallest mip level that may be sampled.
    pub lod_min_clamp: f32,
    /// Largest mip level that may be sampled.
    pub lod_max_clamp: f32,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::default(),
            address_mode_v: AddressMode::default(),
            address_mode_w: AddressMode::default(),
            mag_filter: FilterMode::default(),
            min_filter: FilterMode::default(),
            mipmap_filter: FilterMode::default(),
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
        }
    }
}

impl<'a> SamplerDescriptor<'a> {
    /// A sampler that applies the same address mode on every axis and the
    /// same filter everywhere.
    pub fn uniform(label: &'a str, address_mode: AddressMode, filter: FilterMode) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: filter,
            ..Default::default()
        }
    }
}
