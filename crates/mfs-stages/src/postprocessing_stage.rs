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

//! The SSAO post-processing stage.
//!
//! Each frame the stage regenerates the sample kernel, binds the rasterized
//! color, normal and depth buffers together with the kernel and noise
//! textures, and shades one full-screen triangle into its own render target.
//! The target is published as [`PostprocessedFrame`] for frame accumulation.
//!
//! The kernel is re-randomized every frame, so successive frames of a
//! multi-frame sequence sample different directions before accumulation.

use std::borrow::Cow;
use std::error::Error;
use std::num::NonZeroU64;
use std::sync::Arc;

use mfs_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindGroupLayoutId, BufferDescriptor, BufferId, BufferUsage, Color,
    ColorTargetStateDescriptor, ColorWrites, GraphicsDevice, PipelineLayoutDescriptor,
    PipelineLayoutId, PrimitiveTopology, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, SamplerBindingType, ShaderError, ShaderModuleDescriptor,
    ShaderModuleId, ShaderSourceData, ShaderStageFlags, TextureSampleType, TextureViewDimension,
};
use mfs_core::stage::{PortDecl, Stage, StageContext, StageError};

use crate::ports::{
    names, CameraInfo, ColorTexture, DepthTexture, NormalTexture, PostprocessedFrame,
    ProjectionInfo, ReflectionMaskTexture, Viewport, WorldPositionTexture,
};
use crate::settings::SsaoSettings;
use crate::shaders::{FRAGMENT_ENTRY, POSTPROCESSING_WGSL, VERTEX_ENTRY};
use crate::ssao::{
    generate_kernel, generate_noise, ResizeOutcome, RngSampleSource, SampleSource, SsaoResources,
    SSAO_FORMAT,
};

/// Name of the stage in its pipeline.
pub const STAGE_NAME: &str = "Postprocessing";

/// Uniform block of the post-processing shader.
///
/// Mirrors `SsaoParams` in WGSL uniform layout: the 3x3 normal matrix takes
/// three padded columns.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SsaoUniforms {
    /// Projection matrix, column-major.
    pub projection: [[f32; 4]; 4],
    /// Inverse of the projection.
    pub projection_inverse: [[f32; 4]; 4],
    /// Camera normal matrix.
    pub normal_matrix: [[f32; 4]; 3],
    /// Screen size in pixels.
    pub screen_size: [f32; 2],
    /// Far clip distance.
    pub far_z: f32,
    /// Explicit padding.
    pub _padding: f32,
    /// `[kernel size, 1 / kernel size, noise size, 1 / noise size]`.
    pub sampler_sizes: [f32; 4],
}

impl SsaoUniforms {
    /// Gathers the per-frame shader parameters.
    pub fn new(
        projection: &ProjectionInfo,
        camera: &CameraInfo,
        viewport: &Viewport,
        kernel_size: u32,
        noise_size: u32,
    ) -> Self {
        let k = kernel_size as f32;
        let n = noise_size as f32;
        Self {
            projection: projection.projection.to_cols_array_2d(),
            projection_inverse: projection.projection_inverse.to_cols_array_2d(),
            normal_matrix: camera.normal_matrix.to_padded_cols(),
            screen_size: viewport.size(),
            far_z: projection.z_far,
            _padding: 0.0,
            sampler_sizes: [k, 1.0 / k, n, 1.0 / n],
        }
    }
}

/// Lifecycle state of a [`PostprocessingStage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No GPU resources exist.
    Uninitialized,
    /// Resources are allocated, no frame processed yet.
    Ready,
    /// At least one frame was processed.
    Processing,
}

/// GPU objects that live from initialization to shutdown.
struct GpuState {
    device: Arc<dyn GraphicsDevice>,
    shader: ShaderModuleId,
    bind_group_layout: BindGroupLayoutId,
    pipeline_layout: PipelineLayoutId,
    pipeline: RenderPipelineId,
    uniform_buffer: BufferId,
}

impl GpuState {
    fn create(device: Arc<dyn GraphicsDevice>, source: &str) -> Result<Self, ResourceError> {
        let shader = device.create_shader_module(&ShaderModuleDescriptor {
            label: Some("postprocessing_shader"),
            source: ShaderSourceData::Wgsl(Cow::Borrowed(source)),
        })?;

        let fragment = ShaderStageFlags::FRAGMENT;
        let unfilterable = TextureSampleType::Float { filterable: false };
        let bind_group_layout = match device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("postprocessing_layout"),
            entries: &[
                BindGroupLayoutEntry::texture(0, fragment, unfilterable, TextureViewDimension::D2),
                BindGroupLayoutEntry::texture(1, fragment, unfilterable, TextureViewDimension::D2),
                BindGroupLayoutEntry::texture(
                    2,
                    fragment,
                    TextureSampleType::Depth,
                    TextureViewDimension::D2,
                ),
                BindGroupLayoutEntry::texture(3, fragment, unfilterable, TextureViewDimension::D1),
                BindGroupLayoutEntry::texture(4, fragment, unfilterable, TextureViewDimension::D2),
                BindGroupLayoutEntry::sampler(5, fragment, SamplerBindingType::NonFiltering),
                BindGroupLayoutEntry::uniform_buffer(
                    6,
                    fragment,
                    NonZeroU64::new(std::mem::size_of::<SsaoUniforms>() as u64),
                ),
            ],
        }) {
            Ok(layout) => layout,
            Err(e) => {
                discard_partial(device.as_ref(), shader, None, None, None);
                return Err(e);
            }
        };

        let pipeline_layout = match device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("postprocessing_pipeline_layout"),
            bind_group_layouts: &[bind_group_layout],
        }) {
            Ok(layout) => layout,
            Err(e) => {
                discard_partial(device.as_ref(), shader, Some(bind_group_layout), None, None);
                return Err(e);
            }
        };

        let pipeline = match device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("postprocessing_pipeline")),
            layout: Some(pipeline_layout),
            vertex_shader_module: shader,
            vertex_entry_point: Cow::Borrowed(VERTEX_ENTRY),
            fragment_shader_module: Some(shader),
            fragment_entry_point: Some(Cow::Borrowed(FRAGMENT_ENTRY)),
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format: SSAO_FORMAT,
                write_mask: ColorWrites::all(),
            }]),
            topology: PrimitiveTopology::TriangleList,
        }) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                discard_partial(
                    device.as_ref(),
                    shader,
                    Some(bind_group_layout),
                    Some(pipeline_layout),
                    None,
                );
                return Err(e);
            }
        };

        let uniform_buffer = match device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("postprocessing_uniforms")),
            size: std::mem::size_of::<SsaoUniforms>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        }) {
            Ok(buffer) => buffer,
            Err(e) => {
                discard_partial(
                    device.as_ref(),
                    shader,
                    Some(bind_group_layout),
                    Some(pipeline_layout),
                    Some(pipeline),
                );
                return Err(e);
            }
        };

        Ok(Self {
            device,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipeline,
            uniform_buffer,
        })
    }

    fn destroy(self) {
        let device = self.device.as_ref();
        let results = [
            ("pipeline", device.destroy_render_pipeline(self.pipeline)),
            ("pipeline layout", device.destroy_pipeline_layout(self.pipeline_layout)),
            ("bind group layout", device.destroy_bind_group_layout(self.bind_group_layout)),
            ("shader module", device.destroy_shader_module(self.shader)),
            ("uniform buffer", device.destroy_buffer(self.uniform_buffer)),
        ];
        for (what, result) in results {
            if let Err(e) = result {
                log::warn!("Failed to destroy post-processing {}: {}", what, e);
            }
        }
    }
}

/// Destroys the objects created before a failed step of [`GpuState::create`].
fn discard_partial(
    device: &dyn GraphicsDevice,
    shader: ShaderModuleId,
    bind_group_layout: Option<BindGroupLayoutId>,
    pipeline_layout: Option<PipelineLayoutId>,
    pipeline: Option<RenderPipelineId>,
) {
    if let Some(pipeline) = pipeline {
        if let Err(e) = device.destroy_render_pipeline(pipeline) {
            log::warn!("Failed to destroy partial post-processing pipeline: {}", e);
        }
    }
    if let Some(layout) = pipeline_layout {
        if let Err(e) = device.destroy_pipeline_layout(layout) {
            log::warn!("Failed to destroy partial post-processing pipeline layout: {}", e);
        }
    }
    if let Some(layout) = bind_group_layout {
        if let Err(e) = device.destroy_bind_group_layout(layout) {
            log::warn!("Failed to destroy partial post-processing bind group layout: {}", e);
        }
    }
    if let Err(e) = device.destroy_shader_module(shader) {
        log::warn!("Failed to destroy partial post-processing shader module: {}", e);
    }
}

fn init_failed(e: impl Error + Send + Sync + 'static) -> StageError {
    StageError::InitializationFailed(Box::new(e))
}

fn exec_failed(e: impl Error + Send + Sync + 'static) -> StageError {
    StageError::ExecutionFailed(Box::new(e))
}

/// Screen-space ambient occlusion over the rasterized frame.
pub struct PostprocessingStage {
    settings: SsaoSettings,
    source: Box<dyn SampleSource + Send>,
    state: StageState,
    gpu: Option<GpuState>,
    resources: SsaoResources,
    frame_bind_group: Option<BindGroupId>,
}

impl PostprocessingStage {
    /// Creates a stage sampling from an entropy-seeded generator.
    pub fn new(settings: SsaoSettings) -> Self {
        Self::with_source(settings, Box::new(RngSampleSource::from_entropy()))
    }

    /// Creates a stage sampling from `source`.
    pub fn with_source(settings: SsaoSettings, source: Box<dyn SampleSource + Send>) -> Self {
        Self {
            settings,
            source,
            state: StageState::Uninitialized,
            gpu: None,
            resources: SsaoResources::new(),
            frame_bind_group: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// The active settings.
    pub fn settings(&self) -> &SsaoSettings {
        &self.settings
    }

    /// The GPU resources of the stage.
    pub fn resources(&self) -> &SsaoResources {
        &self.resources
    }

    /// Mutable access to the GPU resources, for hosts attaching extra
    /// outputs to the framebuffer.
    pub fn resources_mut(&mut self) -> &mut SsaoResources {
        &mut self.resources
    }

    fn shader_source(&self) -> Result<Cow<'static, str>, ShaderError> {
        match &self.settings.shader_path {
            None => Ok(Cow::Borrowed(POSTPROCESSING_WGSL)),
            Some(path) => {
                log::info!("Loading post-processing shader from {}", path.display());
                std::fs::read_to_string(path)
                    .map(Cow::Owned)
                    .map_err(|e| ShaderError::LoadError {
                        path: path.display().to_string(),
                        source_error: e.to_string(),
                    })
            }
        }
    }

    fn allocate_resources(
        &mut self,
        device: &dyn GraphicsDevice,
        viewport: Option<Viewport>,
    ) -> Result<(), ResourceError> {
        let noise = generate_noise(self.settings.noise_size, self.source.as_mut());
        self.resources
            .upload_noise(device, &noise, self.settings.noise_size)?;
        self.resources.ensure_sampler(device)?;
        if let Some(viewport) = viewport {
            self.resources
                .ensure_render_target(device, viewport.width, viewport.height)?;
        }
        Ok(())
    }

    fn release(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            let device = gpu.device.clone();
            if let Some(bind_group) = self.frame_bind_group.take() {
                if let Err(e) = device.destroy_bind_group(bind_group) {
                    log::warn!("Failed to destroy post-processing bind group: {}", e);
                }
            }
            self.resources.destroy(device.as_ref());
            gpu.destroy();
        }
        self.state = StageState::Uninitialized;
    }
}

impl Stage for PostprocessingStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn inputs(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::required::<Viewport>(names::VIEWPORT),
            PortDecl::required::<CameraInfo>(names::CAMERA),
            PortDecl::required::<ProjectionInfo>(names::PROJECTION),
            PortDecl::required::<ColorTexture>(names::COLOR),
            PortDecl::required::<NormalTexture>(names::NORMAL),
            PortDecl::required::<DepthTexture>(names::DEPTH),
            PortDecl::optional::<WorldPositionTexture>(names::WORLD_POSITION),
            PortDecl::optional::<ReflectionMaskTexture>(names::REFLECTION_MASK),
        ]
    }

    fn outputs(&self) -> Vec<PortDecl> {
        vec![PortDecl::required::<PostprocessedFrame>(names::POSTPROCESSED_FRAME)]
    }

    fn on_initialize(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        if self.state != StageState::Uninitialized {
            log::warn!("Post-processing stage initialized twice, releasing previous resources");
            self.release();
        }

        if let Some(settings) = ctx.get::<SsaoSettings>() {
            self.settings = settings.clone();
        }
        self.settings.validate().map_err(init_failed)?;

        let device = ctx
            .get::<Arc<dyn GraphicsDevice>>()
            .ok_or(StageError::missing("Arc<dyn GraphicsDevice>"))?
            .clone();

        let source = self.shader_source().map_err(init_failed)?;
        let gpu = GpuState::create(device.clone(), &source).map_err(init_failed)?;
        self.gpu = Some(gpu);

        let viewport = ctx.get::<Viewport>().copied();
        if let Err(e) = self.allocate_resources(device.as_ref(), viewport) {
            self.release();
            return Err(init_failed(e));
        }

        self.state = StageState::Ready;
        log::info!(
            "Post-processing stage ready (kernel {}, noise {}x{})",
            self.settings.kernel_size,
            self.settings.noise_size,
            self.settings.noise_size
        );
        Ok(())
    }

    fn process(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        if self.state == StageState::Uninitialized {
            return Err(StageError::NotInitialized);
        }
        let gpu = self.gpu.as_ref().ok_or(StageError::NotInitialized)?;
        let device = gpu.device.as_ref();

        let viewport = *ctx.require::<Viewport>()?;
        let camera = *ctx.require::<CameraInfo>()?;
        let projection = *ctx.require::<ProjectionInfo>()?;
        let color = ctx.require::<ColorTexture>()?.0;
        let normal = ctx.require::<NormalTexture>()?.0;
        let depth = ctx.require::<DepthTexture>()?.0;

        if ctx.has_changed::<Viewport>() || self.resources.render_target_view().is_none() {
            let outcome = self
                .resources
                .ensure_render_target(device, viewport.width, viewport.height)
                .map_err(exec_failed)?;
            if let ResizeOutcome::Reallocated(status) = outcome {
                if !status.is_complete() {
                    log::warn!("Post-processing renders into an incomplete framebuffer: {}", status);
                }
            }
        }

        let kernel =
            generate_kernel(self.settings.kernel_size, self.source.as_mut()).map_err(exec_failed)?;
        self.resources
            .upload_kernel(device, &kernel)
            .map_err(exec_failed)?;

        let (Some(kernel_view), Some(noise_view), Some(sampler), Some(target)) = (
            self.resources.kernel_view(),
            self.resources.noise_view(),
            self.resources.sampler(),
            self.resources.render_target_view(),
        ) else {
            return Err(exec_failed(ResourceError::NotFound));
        };

        let bind_group = device
            .create_bind_group(&BindGroupDescriptor {
                label: Some("postprocessing_bind_group"),
                layout: gpu.bind_group_layout,
                entries: &[
                    BindGroupEntry::texture_view(0, color),
                    BindGroupEntry::texture_view(1, normal),
                    BindGroupEntry::texture_view(2, depth),
                    BindGroupEntry::texture_view(3, kernel_view),
                    BindGroupEntry::texture_view(4, noise_view),
                    BindGroupEntry::sampler(5, sampler),
                    BindGroupEntry::buffer(6, gpu.uniform_buffer),
                ],
            })
            .map_err(exec_failed)?;
        if let Some(previous) = self.frame_bind_group.replace(bind_group) {
            if let Err(e) = device.destroy_bind_group(previous) {
                log::warn!("Failed to destroy previous post-processing bind group: {}", e);
            }
        }

        let uniforms = SsaoUniforms::new(
            &projection,
            &camera,
            &viewport,
            self.settings.kernel_size,
            self.settings.noise_size,
        );
        device
            .write_buffer(gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms))
            .map_err(exec_failed)?;

        let mut encoder = device.create_command_encoder(Some("postprocessing_encoder"));
        {
            let attachments = self
                .resources
                .framebuffer()
                .color_attachments(Color::TRANSPARENT);
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("postprocessing_pass"),
                color_attachments: &attachments,
            });
            pass.set_pipeline(&gpu.pipeline);
            pass.set_bind_group(0, &bind_group);
            pass.draw(0..3, 0..1);
        }
        device
            .submit_command_buffer(encoder.finish())
            .map_err(exec_failed)?;

        ctx.publish(PostprocessedFrame(target));
        self.state = StageState::Processing;
        log::debug!(
            "Post-processed {}x{} frame with {} kernel samples",
            viewport.width,
            viewport.height,
            kernel.len()
        );
        Ok(())
    }

    fn on_shutdown(&mut self, ctx: &mut StageContext) {
        self.release();
        ctx.remove::<PostprocessedFrame>();
        log::info!("Post-processing stage shut down");
    }
}
