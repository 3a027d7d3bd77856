//! A graphics device that records every call, for driving stages without a
//! GPU.

#![allow(dead_code)]

use mfs_core::math::{Extent3D, Origin3D};
use mfs_core::renderer::*;
use mfs_core::stage::StageContext;
use mfs_stages::ports::{
    CameraInfo, ColorTexture, DepthTexture, NormalTexture, ProjectionInfo, Viewport,
};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateShader(ShaderModuleId),
    CreateBindGroupLayout { id: BindGroupLayoutId, entries: usize },
    CreateBindGroup { id: BindGroupId, entries: Vec<BindGroupEntry> },
    DestroyBindGroup(BindGroupId),
    CreatePipelineLayout(PipelineLayoutId),
    CreatePipeline { id: RenderPipelineId, targets: Vec<TextureFormat> },
    CreateBuffer { id: BufferId, size: u64 },
    WriteBuffer { id: BufferId, len: usize },
    CreateTexture { id: TextureId, label: String, size: Extent3D, format: TextureFormat, dimension: TextureDimension },
    DestroyTexture(TextureId),
    WriteTexture { id: TextureId, len: usize, bytes_per_row: Option<u32> },
    CreateView { id: TextureViewId, texture: TextureId },
    DestroyView(TextureViewId),
    CreateSampler { id: SamplerId, address_mode: AddressMode, filter: FilterMode },
    BeginPass { attachments: Vec<TextureViewId> },
    SetPipeline(RenderPipelineId),
    SetBindGroup { index: u32, id: BindGroupId },
    Draw { vertices: Range<u32>, instances: Range<u32> },
    EndPass,
    Submit(CommandBufferId),
    Destroy(&'static str),
}

#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<Event>,
    next_id: usize,
    live_textures: HashMap<TextureId, TextureDescriptorInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptorInfo {
    pub label: String,
    pub size: Extent3D,
    pub format: TextureFormat,
}

impl Journal {
    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

/// A device call the recording device can be told to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Shader,
    Pipeline,
    BindGroup,
    Submit,
}

#[derive(Debug, Default, Clone)]
pub struct RecordingDevice {
    journal: Arc<Mutex<Journal>>,
    failure: Option<Failure>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose shader compiler rejects every module.
    pub fn rejecting_shaders() -> Self {
        Self::failing(Failure::Shader)
    }

    /// A device that rejects every call of one kind, the way a backend
    /// reports a validation error.
    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    fn rejects(&self, failure: Failure) -> bool {
        self.failure == Some(failure)
    }

    fn rejection(what: &str) -> ResourceError {
        ResourceError::BackendError(format!("{what} rejected by test device"))
    }

    pub fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap()
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal().events.clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.journal().events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear_events(&self) {
        self.journal().events.clear();
    }

    pub fn live_textures(&self) -> HashMap<TextureId, TextureDescriptorInfo> {
        self.journal().live_textures.clone()
    }

    pub fn live_texture(&self, label: &str) -> Vec<(TextureId, TextureDescriptorInfo)> {
        self.live_textures()
            .into_iter()
            .filter(|(_, info)| info.label == label)
            .collect()
    }

    fn record(&self, event: Event) {
        self.journal().events.push(event);
    }

    fn id(&self) -> usize {
        self.journal().next()
    }
}

struct RecordingEncoder {
    journal: Arc<Mutex<Journal>>,
}

struct RecordingPass {
    journal: Arc<Mutex<Journal>>,
}

impl RecordingPass {
    fn record(&self, event: Event) {
        self.journal.lock().unwrap().events.push(event);
    }
}

impl Drop for RecordingPass {
    fn drop(&mut self) {
        self.record(Event::EndPass);
    }
}

impl RenderPass<'_> for RecordingPass {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        self.record(Event::SetPipeline(*pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        self.record(Event::SetBindGroup {
            index,
            id: *bind_group,
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.record(Event::Draw {
            vertices,
            instances,
        });
    }
}

impl CommandEncoder for RecordingEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        let attachments = descriptor
            .color_attachments
            .iter()
            .map(|a| *a.view)
            .collect();
        self.journal
            .lock()
            .unwrap()
            .events
            .push(Event::BeginPass { attachments });
        Box::new(RecordingPass {
            journal: self.journal.clone(),
        })
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let id = self.journal.lock().unwrap().next();
        CommandBufferId(id as u64)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        if self.rejects(Failure::Shader) {
            return Err(ShaderError::CompilationError {
                label: descriptor.label.unwrap_or_default().to_string(),
                details: "rejected by test device".to_string(),
            }
            .into());
        }
        let id = ShaderModuleId(self.id());
        self.record(Event::CreateShader(id));
        Ok(id)
    }

    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("shader"));
        Ok(())
    }

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let id = BindGroupLayoutId(self.id());
        self.record(Event::CreateBindGroupLayout {
            id,
            entries: descriptor.entries.len(),
        });
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, _id: BindGroupLayoutId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("bind_group_layout"));
        Ok(())
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        if self.rejects(Failure::BindGroup) {
            return Err(Self::rejection("bind group"));
        }
        let id = BindGroupId(self.id());
        self.record(Event::CreateBindGroup {
            id,
            entries: descriptor.entries.to_vec(),
        });
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        self.record(Event::DestroyBindGroup(id));
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let id = PipelineLayoutId(self.id());
        self.record(Event::CreatePipelineLayout(id));
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, _id: PipelineLayoutId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("pipeline_layout"));
        Ok(())
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        if self.rejects(Failure::Pipeline) {
            return Err(Self::rejection("render pipeline"));
        }
        let id = RenderPipelineId(self.id());
        self.record(Event::CreatePipeline {
            id,
            targets: descriptor
                .color_target_states
                .iter()
                .map(|t| t.format)
                .collect(),
        });
        Ok(id)
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("pipeline"));
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.id());
        self.record(Event::CreateBuffer {
            id,
            size: descriptor.size,
        });
        Ok(id)
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("buffer"));
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, _offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        self.record(Event::WriteBuffer {
            id,
            len: data.len(),
        });
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.id());
        let label = descriptor.label.as_deref().unwrap_or_default().to_string();
        let mut journal = self.journal();
        journal.live_textures.insert(
            id,
            TextureDescriptorInfo {
                label: label.clone(),
                size: descriptor.size,
                format: descriptor.format,
            },
        );
        journal.events.push(Event::CreateTexture {
            id,
            label,
            size: descriptor.size,
            format: descriptor.format,
            dimension: descriptor.dimension,
        });
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut journal = self.journal();
        if journal.live_textures.remove(&id).is_none() {
            return Err(ResourceError::NotFound);
        }
        journal.events.push(Event::DestroyTexture(id));
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        _offset: Origin3D,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        self.record(Event::WriteTexture {
            id: texture_id,
            len: data.len(),
            bytes_per_row,
        });
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let id = TextureViewId(self.id());
        self.record(Event::CreateView {
            id,
            texture: texture_id,
        });
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.record(Event::DestroyView(id));
        Ok(())
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let id = SamplerId(self.id());
        self.record(Event::CreateSampler {
            id,
            address_mode: descriptor.address_mode_u,
            filter: descriptor.min_filter,
        });
        Ok(id)
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        self.record(Event::Destroy("sampler"));
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(RecordingEncoder {
            journal: self.journal.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) -> Result<(), ResourceError> {
        if self.rejects(Failure::Submit) {
            return Err(Self::rejection("command buffer"));
        }
        self.record(Event::Submit(command_buffer));
        Ok(())
    }
}

/// Upstream textures, as the rasterization stage would publish them.
pub const COLOR_VIEW: TextureViewId = TextureViewId(9001);
pub const NORMAL_VIEW: TextureViewId = TextureViewId(9002);
pub const DEPTH_VIEW: TextureViewId = TextureViewId(9003);

/// A context holding the device and every host and upstream input.
pub fn frame_context(device: &RecordingDevice, width: u32, height: u32) -> StageContext {
    let mut ctx = StageContext::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
    ctx.insert(device);
    ctx.publish(Viewport::new(width, height));
    ctx.publish(CameraInfo::from_view(&mfs_core::math::Mat4::IDENTITY));
    ctx.publish(ProjectionInfo::perspective(
        mfs_core::math::FRAC_PI_4,
        width as f32 / height as f32,
        0.1,
        100.0,
    ));
    ctx.publish(ColorTexture(COLOR_VIEW));
    ctx.publish(NormalTexture(NORMAL_VIEW));
    ctx.publish(DepthTexture(DEPTH_VIEW));
    ctx
}
