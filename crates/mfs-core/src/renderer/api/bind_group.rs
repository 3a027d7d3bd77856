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

//! Bind groups: how buffers, textures and samplers reach a shader.

use std::num::NonZeroU64;

use super::buffer::BufferId;
use super::shader::ShaderStageFlags;
use super::texture::{SamplerId, TextureViewDimension, TextureViewId};

/// An opaque handle to a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutId(pub usize);

/// An opaque handle to a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupId(pub usize);

/// The kind of buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferBindingType {
    /// A uniform buffer.
    Uniform,
    /// A storage buffer.
    Storage {
        /// Whether shaders may only read it.
        read_only: bool,
    },
}

/// What a texture binding returns when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampleType {
    /// Floating point values.
    Float {
        /// Whether the texture may be used with a filtering sampler.
        filterable: bool,
    },
    /// Depth values.
    Depth,
}

/// The kind of sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerBindingType {
    /// May filter between texels.
    Filtering,
    /// Nearest only; required for unfilterable textures.
    NonFiltering,
}

/// The resource type of one binding slot.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingType {
    /// A buffer.
    Buffer {
        /// Uniform or storage.
        ty: BufferBindingType,
        /// Whether a dynamic offset is supplied when binding.
        has_dynamic_offset: bool,
        /// Minimum size the bound range must have.
        min_binding_size: Option<NonZeroU64>,
    },
    /// A sampled texture.
    Texture {
        /// Sample type.
        sample_type: TextureSampleType,
        /// View dimensionality.
        view_dimension: TextureViewDimension,
        /// Whether the texture is multisampled.
        multisampled: bool,
    },
    /// A sampler.
    Sampler(SamplerBindingType),
}

/// One slot of a bind group layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutEntry {
    /// Binding index in the shader.
    pub binding: u32,
    /// Stages that can see the binding.
    pub visibility: ShaderStageFlags,
    /// Resource type.
    pub ty: BindingType,
}

impl BindGroupLayoutEntry {
    /// A uniform buffer slot without dynamic offset.
    pub fn uniform_buffer(binding: u32, visibility: ShaderStageFlags, min_size: Option<NonZeroU64>) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: min_size,
            },
        }
    }

    /// A single-sampled texture slot.
    pub fn texture(
        binding: u32,
        visibility: ShaderStageFlags,
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
    ) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
        }
    }

    /// A sampler slot.
    pub fn sampler(binding: u32, visibility: ShaderStageFlags, ty: SamplerBindingType) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Sampler(ty),
        }
    }
}

/// Describes a bind group layout.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The slots.
    pub entries: &'a [BindGroupLayoutEntry],
}

/// A buffer range bound to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    /// The buffer.
    pub buffer: BufferId,
    /// Byte offset of the range.
    pub offset: u64,
    /// Length of the range; `None` binds to the end.
    pub size: Option<NonZeroU64>,
}

/// The resource placed in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// A buffer range.
    Buffer(BufferBinding),
    /// A texture view.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

/// One filled slot of a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    /// Binding index in the shader.
    pub binding: u32,
    /// The bound resource.
    pub resource: BindingResource,
}

impl BindGroupEntry {
    /// Binds a whole buffer.
    pub fn buffer(binding: u32, buffer: BufferId) -> Self {
        Self {
            binding,
            resource: BindingResource::Buffer(BufferBinding {
                buffer,
                offset: 0,
                size: None,
            }),
        }
    }

    /// Binds a texture view.
    pub fn texture_view(binding: u32, view: TextureViewId) -> Self {
        Self {
            binding,
            resource: BindingResource::TextureView(view),
        }
    }

    /// Binds a sampler.
    pub fn sampler(binding: u32, sampler: SamplerId) -> Self {
        Self {
            binding,
            resource: BindingResource::Sampler(sampler),
        }
    }
}

/// Describes a bind group to create.
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The layout the group conforms to.
    pub layout: BindGroupLayoutId,
    /// The filled slots.
    pub entries: &'a [BindGroupEntry],
}
