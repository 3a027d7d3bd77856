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

//! Render pipelines and their layouts.

use std::borrow::Cow;

use super::bind_group::BindGroupLayoutId;
use super::format::TextureFormat;
use super::shader::ShaderModuleId;

/// An opaque handle to a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub usize);

/// An opaque handle to a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineLayoutId(pub usize);

/// Describes a pipeline layout: the bind group layouts, by group index.
#[derive(Debug, Clone)]
pub struct PipelineLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// One layout per bind group index.
    pub bind_group_layouts: &'a [BindGroupLayoutId],
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
}

mfs_flags! {
    /// Color channels a pipeline writes.
    pub struct ColorWrites: u32 {
        /// Red.
        const RED = 1 << 0;
        /// Green.
        const GREEN = 1 << 1;
        /// Blue.
        const BLUE = 1 << 2;
        /// Alpha.
        const ALPHA = 1 << 3;
    }
}

/// Output format and write mask of one color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTargetStateDescriptor {
    /// Format of the attachment.
    pub format: TextureFormat,
    /// Written channels.
    pub write_mask: ColorWrites,
}

/// Describes a render pipeline without vertex buffers.
///
/// Vertices are generated in the vertex shader from the vertex index, which
/// is all full-screen passes need.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Layout of the bind groups; `None` lets the backend derive it.
    pub layout: Option<PipelineLayoutId>,
    /// Module holding the vertex entry point.
    pub vertex_shader_module: ShaderModuleId,
    /// Vertex entry point name.
    pub vertex_entry_point: Cow<'a, str>,
    /// Module holding the fragment entry point, if any.
    pub fragment_shader_module: Option<ShaderModuleId>,
    /// Fragment entry point name.
    pub fragment_entry_point: Option<Cow<'a, str>>,
    /// Color targets written by the fragment stage.
    pub color_target_states: Cow<'a, [ColorTargetStateDescriptor]>,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
}
